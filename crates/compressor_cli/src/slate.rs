//! The `compressor slate` command.

use compressor_core::{slate, SlateOptions};

use crate::pipeline::load_project;
use crate::{GlobalArgs, SlateArgs};

/// Precompiles every stylesheet dialect under the static root.
pub fn run(args: &SlateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_project(global)?;
    let options = SlateOptions {
        uid: args.chown,
        gid: args.chgrp,
    };

    let report = slate(&settings, options)?;

    if global.verbose {
        for css in &report.compiled {
            println!("  {}", css.display());
        }
    }
    if !global.quiet {
        println!("Slated {} stylesheet(s) in {}", report.compiled.len(), settings.root.display());
    }
    Ok(0)
}
