use std::io::Write;
use std::process::Stdio;

use compressor_config::CssTidyConfig;

use super::Filter;
use crate::compile::shell;
use crate::error::CompressError;

/// Pipes the combined stylesheet through the `csstidy` program.
pub struct CssTidyFilter {
    config: CssTidyConfig,
}

impl CssTidyFilter {
    /// Creates the filter for the given invocation.
    pub fn new(config: CssTidyConfig) -> Self {
        Self { config }
    }

    fn command_line(&self) -> String {
        format!("{} - {}", self.config.binary.trim(), self.config.arguments)
            .trim_end()
            .to_string()
    }

    fn failed(message: impl Into<String>) -> CompressError {
        CompressError::FilterFailed {
            filter: "csstidy",
            message: message.into(),
        }
    }
}

impl Filter for CssTidyFilter {
    fn name(&self) -> &'static str {
        "csstidy"
    }

    fn output(&self, content: &str) -> Result<Option<String>, CompressError> {
        let command = self.command_line();
        tracing::debug!(%command, "running csstidy");

        let mut child = shell(&command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::failed(format!("failed to run `{command}`: {e}")))?;

        // stdin is written from its own thread while stdout is drained.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = content.to_string();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| Self::failed(format!("failed to wait for `{command}`: {e}")))?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(Self::failed(format!("failed to write to csstidy: {e}"))),
                Err(_) => return Err(Self::failed("csstidy writer thread panicked")),
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                return Err(Self::failed("Unable to apply CSSTidy filter"));
            }
            return Err(Self::failed(stderr));
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}
