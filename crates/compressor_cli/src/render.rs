//! The `compressor render` command.

use compressor_core::render_template;

use crate::pipeline::{load_project, open_cache, read_input};
use crate::{GlobalArgs, RenderArgs};

/// Renders a template's compress blocks to stdout or to `--output`.
pub fn run(args: &RenderArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_project(global)?;
    let template = read_input(Some(args.template.as_str()))?;

    let mut cache = open_cache(&settings);
    let rendered = render_template(&template, &settings, &mut cache)?;
    cache.save()?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &rendered).map_err(|e| format!("failed to write {path}: {e}"))?;
            if !global.quiet {
                eprintln!("Rendered {} -> {path}", args.template);
            }
        }
        None => print!("{rendered}"),
    }
    Ok(0)
}
