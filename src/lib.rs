//! `reptree` replaces literal strings across a source tree and then tidies
//! the imports of every file it changed.
//!
//! It provides the core logic for the `reptree` command-line tool but can also
//! be used as a library. The main components are:
//!
//! - `ReplacementSet`: ordered literal `from -> to` substitutions on raw bytes.
//! - `DirectoryFilter` and `FileWalker`: the pruned, sorted directory walk that
//!   rewrites matching files and records which ones changed.
//! - `ImportFormatter`: the import canonicalization step, `rustfmt` by default.
//! - `Pipeline`: replace first, then format each modified file in order.
//!
//! All work is sequential. Replacement is best effort per file; formatting
//! stops at the first file the formatter rejects.

pub mod cli;
pub mod config;
pub mod errors;
pub mod formatter;
pub mod pipeline;
pub mod replacements;
pub mod walker;

// Re-export main types for easier access by library users.
pub use config::RunConfig;
pub use errors::{Error, ErrorKind, Result};
pub use formatter::{ImportFormatter, Rustfmt};
pub use pipeline::{Pipeline, RunReport};
pub use replacements::{Replacement, ReplacementSet};
pub use walker::{DirectoryFilter, FileWalker, WalkOutcome, WalkStats};
