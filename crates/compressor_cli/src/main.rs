//! Compressor CLI: combine and minify the stylesheets and scripts of HTML blocks.
//!
//! Provides `compressor compress` for a single fragment, `compressor render`
//! for templates with `{% compress %}` blocks, `compressor slate` to
//! precompile stylesheet dialects, and `compressor gc` to prune the output
//! directory.

#![warn(missing_docs)]

mod compress;
mod gc;
mod pipeline;
mod render;
mod slate;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use compressor_common::AssetKind;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Compressor: combines linked and inline CSS/JS into cache-busted files.
#[derive(Parser, Debug)]
#[command(name = "compressor", version, about = "CSS/JS block compressor")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `compressor.toml` file or the directory holding it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compress one HTML fragment and print the replacement markup.
    Compress(CompressArgs),
    /// Render every compress block in a template.
    Render(RenderArgs),
    /// Compile every stylesheet dialect under the static root.
    Slate(SlateArgs),
    /// Remove output files no longer referenced by the manifest.
    Gc,
}

/// Arguments for the `compressor compress` subcommand.
#[derive(Parser, Debug)]
pub struct CompressArgs {
    /// What the fragment holds.
    #[arg(value_enum)]
    pub kind: KindArg,

    /// File holding the fragment. Read from stdin when omitted.
    pub file: Option<String>,

    /// Render a self-closing `<link ... />`.
    #[arg(long)]
    pub xhtml: bool,
}

/// Arguments for the `compressor render` subcommand.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Template to render.
    pub template: String,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the `compressor slate` subcommand.
#[derive(Parser, Debug)]
pub struct SlateArgs {
    /// Give compiled files to this user id instead of making them world-writable.
    #[arg(long, value_name = "UID")]
    pub chown: Option<u32>,

    /// Give compiled files to this group id instead of making them world-writable.
    #[arg(long, value_name = "GID")]
    pub chgrp: Option<u32>,
}

/// Block kind selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Stylesheets.
    Css,
    /// Scripts.
    Js,
}

impl From<KindArg> for AssetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Css => AssetKind::Css,
            KindArg::Js => AssetKind::Js,
        }
    }
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Compress(ref args) => compress::run(args, &global),
        Command::Render(ref args) => render::run(args, &global),
        Command::Slate(ref args) => slate::run(args, &global),
        Command::Gc => gc::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `--verbose` and `--quiet` override `RUST_LOG`.
fn init_logging(quiet: bool, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("compressor=debug")
    } else if quiet {
        EnvFilter::new("compressor=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("compressor=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
