use crate::config::{DEFAULT_SUFFIX, PatternFile, RunConfig, normalize_suffix};
use crate::errors::Result;
use crate::replacements::Replacement;
use clap::Parser;
use std::path::PathBuf;

/// Replace literal strings across a source tree, then tidy imports.
///
/// Every file under ROOT ending in the source suffix (default `.rs`) has each
/// FROM replaced by its TO, in argument order. Each modified file is then
/// passed through rustfmt with import reordering. `.git` and `vendor`
/// directories are never entered; directories with `fake` in their name are
/// skipped unless `--fake` is given.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Replace literal strings across a source tree, then tidy imports",
    long_about = None,
    after_help = "EXAMPLES:
  reptree . foo:bar baz:buzz              # Replace in every .rs file under .
  reptree --fake src OldClient:NewClient  # Also rewrite fake* directories
  reptree -c renames.yaml .               # Load replacements from a file"
)]
pub struct Args {
    /// Also descend into directories whose name contains `fake`.
    #[arg(long)]
    pub fake: bool,

    /// Suffix of the files to rewrite.
    #[arg(long)]
    pub suffix: Option<String>,

    /// YAML file with additional replacements, applied before positional ones.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// The rustfmt program used to format imports.
    #[arg(long, env = "REPTREE_RUSTFMT", default_value = "rustfmt")]
    pub rustfmt: PathBuf,

    /// Rust edition passed to rustfmt.
    #[arg(long, default_value = "2021")]
    pub edition: String,

    /// Only make replacements; do not format imports.
    #[arg(long)]
    pub no_format: bool,

    /// Print each modified file and enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Root of the tree to rewrite.
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Replacements of the form FROM:TO, exactly one colon each.
    #[arg(value_name = "FROM:TO")]
    pub patterns: Vec<String>,
}

impl Args {
    /// Builds the run configuration, merging in the pattern file if given.
    pub fn into_config(self) -> Result<RunConfig> {
        let mut replacements = Vec::new();
        let mut include_fakes = self.fake;
        let mut suffix = self.suffix;

        if let Some(config_path) = &self.config {
            let path = PatternFile::find(config_path, &self.root)?;
            let file = PatternFile::load(&path)?;
            replacements.extend(file.replacements);
            include_fakes |= file.include_fakes;
            suffix = suffix.or(file.suffix);
        }

        for arg in &self.patterns {
            replacements.push(arg.parse::<Replacement>()?);
        }

        let mut config = RunConfig::new(self.root, replacements);
        config.include_fakes = include_fakes;
        config.suffix = normalize_suffix(suffix.as_deref().unwrap_or(DEFAULT_SUFFIX));
        config.format_imports = !self.no_format;
        config.verbose = self.verbose;
        Ok(config)
    }
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
