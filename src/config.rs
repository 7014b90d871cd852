use crate::errors::{Error, Result};
use crate::replacements::Replacement;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Default suffix of files that are rewritten.
pub const DEFAULT_SUFFIX: &str = ".rs";

/// Settings for one run, built once from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the tree to rewrite.
    pub root: PathBuf,
    /// Replacements in the order they are applied.
    pub replacements: Vec<Replacement>,
    /// Descend into directories whose name contains `fake`.
    pub include_fakes: bool,
    /// Only files whose name ends with this suffix are considered.
    pub suffix: String,
    /// Run the import formatter over modified files.
    pub format_imports: bool,
    /// Print each modified file.
    pub verbose: bool,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>, replacements: Vec<Replacement>) -> Self {
        Self {
            root: root.into(),
            replacements,
            include_fakes: false,
            suffix: DEFAULT_SUFFIX.to_string(),
            format_imports: true,
            verbose: false,
        }
    }

    /// Checks the configuration before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if self.replacements.is_empty() {
            return Err("at least one FROM:TO replacement is required".into());
        }
        if std::fs::metadata(&self.root).is_err() {
            return Err(format!("path does not exist: {}", self.root.display()).into());
        }
        if self.suffix.is_empty() {
            return Err("file suffix must not be empty".into());
        }
        Ok(())
    }
}

/// Normalizes a suffix so that `rs` and `.rs` mean the same thing.
pub fn normalize_suffix(suffix: &str) -> String {
    let trimmed = suffix.trim();
    if trimmed.is_empty() || trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{trimmed}")
    }
}

/// Replacements and defaults loaded from a YAML file.
///
/// ```yaml
/// replacements:
///   - from: "old_crate::"
///     to: "new_crate::"
/// include_fakes: true
/// suffix: ".rs"
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternFile {
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub include_fakes: bool,
    #[serde(default)]
    pub suffix: Option<String>,
}

impl PatternFile {
    /// Finds the pattern file, first as given, then relative to `root`.
    pub fn find(config_path: &Path, root: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let in_root = root.join(config_path);
        if in_root.exists() {
            return Ok(in_root);
        }

        Err(format!(
            "Config file '{}' not found. Searched in:\n  - {}\n  - {}",
            config_path.display(),
            config_path.display(),
            in_root.display()
        )
        .into())
    }

    /// Loads and validates a pattern file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::Usage(format!("cannot open {}: {e}", path.display())))?;
        let parsed: PatternFile = serde_yaml::from_reader(file)?;

        // Deserialization bypasses `Replacement::new`, so re-check here.
        for rep in &parsed.replacements {
            if rep.from.is_empty() {
                return Err(format!("{}: replacement source must not be empty", path.display()).into());
            }
        }
        Ok(parsed)
    }
}
