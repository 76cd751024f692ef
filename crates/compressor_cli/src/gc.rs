//! The `compressor gc` command.

use crate::pipeline::{load_project, open_cache};
use crate::GlobalArgs;

/// Removes output files that no manifest record references.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_project(global)?;
    let mut cache = open_cache(&settings);

    let removed = cache.gc()?;
    cache.save()?;

    if !global.quiet {
        println!(
            "Removed {removed} unreferenced file(s) from {}",
            settings.output_root().display()
        );
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_stray_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("compressor.toml"),
            "[compress]\nurl = \"/media/\"\nroot = \"media\"\n",
        )
        .unwrap();
        let stray = dir.path().join("media/CACHE/js/0123456789ab.js");
        std::fs::create_dir_all(stray.parent().unwrap()).unwrap();
        std::fs::write(&stray, "x").unwrap();

        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(dir.path().display().to_string()),
        };
        assert_eq!(run(&global).unwrap(), 0);
        assert!(!stray.exists());
        assert!(dir.path().join("media/CACHE/manifest.json").is_file());
    }
}
