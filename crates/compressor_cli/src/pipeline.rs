//! Shared helpers for CLI commands: project root resolution, configuration
//! loading, cache access, and input reading.

use std::io::Read;
use std::path::{Path, PathBuf};

use compressor_cache::OutputCache;
use compressor_config::{load_settings, load_settings_from_str, Settings, CONFIG_FILE};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `compressor.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the project settings selected by the global CLI args.
///
/// `--config` may name the configuration file itself, whatever its name, or
/// the directory holding `compressor.toml`. Without it the nearest
/// `compressor.toml` above the current directory is used.
pub fn load_project(global: &GlobalArgs) -> Result<Settings, Box<dyn std::error::Error>> {
    let settings = match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                let content = std::fs::read_to_string(&p)
                    .map_err(|e| format!("failed to read {}: {e}", p.display()))?;
                let base = p
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                load_settings_from_str(&content, &base)?
            } else {
                load_settings(&p)?
            }
        }
        None => load_settings(&find_project_root(&std::env::current_dir()?)?)?,
    };
    tracing::debug!(root = %settings.root.display(), url = %settings.url, "loaded settings");
    Ok(settings)
}

/// Opens the output cache for the project's static root.
pub fn open_cache(settings: &Settings) -> OutputCache {
    OutputCache::load_or_create(&settings.root, &settings.output_dir, compressor_core::VERSION)
}

/// Reads `file`, or stdin when no file is given.
pub fn read_input(file: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => {
            Ok(std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?)
        }
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "[compress]\nurl = \"/media/\"\nroot = \"media\"\n";

    fn global(config: Option<&Path>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: config.map(|p| p.display().to_string()),
        }
    }

    #[test]
    fn find_project_root_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), CONFIG).unwrap();
        let nested = dir.path().join("templates/partials");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), dir.path());
    }

    #[test]
    fn find_project_root_reports_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_project_root(dir.path()).unwrap_err();
        assert!(err.to_string().contains("could not find compressor.toml"));
    }

    #[test]
    fn config_flag_accepts_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), CONFIG).unwrap();
        let settings = load_project(&global(Some(dir.path()))).unwrap();
        assert_eq!(settings.root, dir.path().join("media"));
    }

    #[test]
    fn config_flag_accepts_any_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("staging.toml");
        std::fs::write(&file, CONFIG).unwrap();
        let settings = load_project(&global(Some(&file))).unwrap();
        assert_eq!(settings.url, "/media/");
        assert_eq!(settings.root, dir.path().join("media"));
    }

    #[test]
    fn read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("block.html");
        std::fs::write(&file, "<script></script>").unwrap();
        let content = read_input(file.to_str()).unwrap();
        assert_eq!(content, "<script></script>");
    }

    #[test]
    fn read_input_missing_file_fails() {
        assert!(read_input(Some("/definitely/not/here.html")).is_err());
    }
}
