//! The `compressor compress` command.

use compressor_common::AssetKind;
use compressor_core::Compressor;

use crate::pipeline::{load_project, open_cache, read_input};
use crate::{CompressArgs, GlobalArgs};

/// Compresses one fragment and prints the markup that replaces it.
pub fn run(args: &CompressArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_project(global)?;
    let content = read_input(args.file.as_deref())?;
    let kind = AssetKind::from(args.kind);

    let mut cache = open_cache(&settings);
    let output = Compressor::new(kind, content, &settings)
        .with_xhtml(args.xhtml)
        .render_cached(&mut cache)?;
    cache.save()?;

    println!("{output}");
    Ok(0)
}
