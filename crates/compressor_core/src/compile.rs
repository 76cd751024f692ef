//! Running external stylesheet compilers.
//!
//! A compiler is configured per source extension with a `binary_path` and an
//! `arguments` template. Every `*` in the template is replaced by the input
//! path without its extension, and the whole command runs through the shell.
//! The compiler must leave `<path>.css` next to its input.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use compressor_config::CompilerFormat;

use crate::error::CompressError;

/// Returns `<stem>.css`, where `stem` is a path with its extension removed.
pub fn css_output_for(stem: &Path) -> PathBuf {
    let mut path: OsString = stem.as_os_str().to_owned();
    path.push(".css");
    PathBuf::from(path)
}

/// Builds the shell command line for compiling `stem`.
pub fn command_line(stem: &Path, compiler: &CompilerFormat) -> String {
    let quoted = shell_quote(&stem.to_string_lossy());
    let arguments = compiler.arguments.replace('*', &quoted);
    format!("{} {}", compiler.binary_path.trim(), arguments)
        .trim_end()
        .to_string()
}

/// Returns `true` if the first word of `binary_path` names an executable,
/// either as a path or on `PATH`.
pub fn binary_exists(binary_path: &str) -> bool {
    binary_path
        .split_whitespace()
        .next()
        .is_some_and(|program| which::which(program).is_ok())
}

/// Compiles the file `<stem><ext>` into `<stem>.css`.
///
/// Returns the path of the compiled file.
pub fn compile(stem: &Path, compiler: &CompilerFormat) -> Result<PathBuf, CompressError> {
    let program = compiler
        .binary_path
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    if !binary_exists(&compiler.binary_path) {
        return Err(CompressError::CompilerNotFound { binary: program });
    }

    let command = command_line(stem, compiler);
    tracing::debug!(%command, "running stylesheet compiler");

    let output = run_shell(&command)
        .map_err(|e| CompressError::CompilerFailed {
            command: command.clone(),
            message: format!("failed to run CSS compiler `{command}`: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("Invalid command to CSS compiler: {command}")
        } else {
            stderr
        };
        return Err(CompressError::CompilerFailed { command, message });
    }

    let compiled = css_output_for(stem);
    if !compiled.is_file() {
        return Err(CompressError::CompilerFailed {
            message: format!("CSS compiler did not produce {}", compiled.display()),
            command,
        });
    }
    Ok(compiled)
}

/// Compiles inline stylesheet source written in the dialect of `ext`.
///
/// The source is written to a scratch directory, compiled there, and the
/// resulting CSS is returned without trailing whitespace.
pub fn compile_inline(
    source: &str,
    ext: &str,
    compiler: &CompilerFormat,
) -> Result<String, CompressError> {
    let scratch = tempfile::tempdir().map_err(CompressError::io(std::env::temp_dir()))?;
    let stem = scratch.path().join("inline");
    let mut input: OsString = stem.as_os_str().to_owned();
    input.push(ext);
    let input = PathBuf::from(input);

    std::fs::write(&input, source).map_err(CompressError::io(&input))?;
    let compiled = compile(&stem, compiler)?;
    let css = std::fs::read_to_string(&compiled).map_err(CompressError::io(&compiled))?;
    Ok(css.trim_end().to_string())
}

/// Runs a command line through the platform shell, capturing its output.
pub(crate) fn run_shell(command: &str) -> std::io::Result<Output> {
    shell(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
}

/// Returns a [`Command`] that runs `command` through the platform shell.
pub(crate) fn shell(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    }
    #[cfg(not(windows))]
    {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    }
}

/// Quotes `s` for the shell when it contains anything but safe path characters.
fn shell_quote(s: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "/._-+:@%,".contains(c);
    if !s.is_empty() && s.chars().all(safe) {
        return s.to_string();
    }
    #[cfg(windows)]
    {
        format!("\"{s}\"")
    }
    #[cfg(not(windows))]
    {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
