use crate::config::RunConfig;
use crate::errors::{Error, Result};
use crate::formatter::ImportFormatter;
use crate::replacements::ReplacementSet;
use crate::walker::{DirectoryFilter, FileWalker, WalkStats, write_atomic};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Files rewritten by the replacement phase, in traversal order.
    pub modified: Vec<PathBuf>,
    /// Counters from the walk.
    pub stats: WalkStats,
    /// Files whose contents the formatter changed.
    pub formatted: usize,
    pub elapsed: Duration,
}

/// Replace-then-format driver.
///
/// The walk is best effort: unreadable or unwritable files are reported and
/// skipped. Formatting is strict: the first file the formatter rejects stops
/// the run. Nothing is rolled back, so files formatted before the failure stay
/// formatted and later ones keep their replaced, unformatted contents.
pub struct Pipeline<F> {
    config: RunConfig,
    formatter: F,
}

impl<F: ImportFormatter> Pipeline<F> {
    pub fn new(config: RunConfig, formatter: F) -> Self {
        Self { config, formatter }
    }

    pub fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let replacements = ReplacementSet::new(self.config.replacements.clone())?;
        for rep in replacements.iter() {
            debug!(%rep, "replacement");
        }

        let start = Instant::now();

        println!("Making replacements");
        let outcome = FileWalker::new(
            &replacements,
            DirectoryFilter::new(self.config.include_fakes),
            &self.config.suffix,
        )
        .verbose(self.config.verbose)
        .walk(&self.config.root)?;

        let mut formatted = 0;
        if self.config.format_imports {
            println!("Formatting imports");
            formatted = self.format_all(&outcome.modified)?;
        }

        let report = RunReport {
            modified: outcome.modified,
            stats: outcome.stats,
            formatted,
            elapsed: start.elapsed(),
        };
        info!(
            patterns = self.config.replacements.len(),
            modified = report.modified.len(),
            formatted = report.formatted,
            "run complete"
        );
        Ok(report)
    }

    /// Formats each path in order, stopping at the first failure.
    fn format_all(&self, paths: &[PathBuf]) -> Result<usize> {
        let mut changed = 0;
        for path in paths {
            let source = fs::read(path).map_err(|e| Error::Format {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let output = self.formatter.format(path, &source)?;
            if output == source {
                continue;
            }
            write_atomic(path, &output).map_err(|e| Error::Format {
                path: path.clone(),
                message: e.to_string(),
            })?;
            changed += 1;
        }
        Ok(changed)
    }
}
