use crate::errors::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Canonicalizes the import block of a source file.
///
/// `path` is context only (for locating project configuration); the input is
/// always `source`. An implementation returns the full new contents, or an
/// [`Error::Format`] if the source does not parse.
pub trait ImportFormatter {
    fn format(&self, path: &Path, source: &[u8]) -> Result<Vec<u8>>;
}

impl<F: ImportFormatter + ?Sized> ImportFormatter for &F {
    fn format(&self, path: &Path, source: &[u8]) -> Result<Vec<u8>> {
        (**self).format(path, source)
    }
}

/// Runs `rustfmt` over stdin with import reordering enabled.
#[derive(Debug, Clone)]
pub struct Rustfmt {
    program: PathBuf,
    edition: String,
}

impl Default for Rustfmt {
    fn default() -> Self {
        Self::new("rustfmt", "2021")
    }
}

impl Rustfmt {
    pub fn new(program: impl Into<PathBuf>, edition: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            edition: edition.into(),
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--edition")
            .arg(&self.edition)
            .arg("--emit")
            .arg("stdout")
            .arg("--config")
            .arg("reorder_imports=true");
        // Input comes from stdin, so rustfmt looks for `rustfmt.toml` from its
        // working directory upward.
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl ImportFormatter for Rustfmt {
    fn format(&self, path: &Path, source: &[u8]) -> Result<Vec<u8>> {
        let fail = |message: String| Error::Format {
            path: path.to_path_buf(),
            message,
        };

        debug!(file = %path.display(), program = %self.program.display(), "formatting");
        let mut child = self
            .command(path)
            .spawn()
            .map_err(|e| fail(format!("failed to run {}: {e}", self.program.display())))?;

        // Dropping stdin after the write closes the pipe so rustfmt sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source)
                .map_err(|e| fail(format!("failed to write to {}: {e}", self.program.display())))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| fail(format!("failed to wait for {}: {e}", self.program.display())))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("exit code {}", output.status.code().unwrap_or(-1)),
                msg => msg.to_string(),
            };
            Err(fail(message))
        }
    }
}
