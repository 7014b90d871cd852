use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in `reptree`.
///
/// Each variant belongs to one [`ErrorKind`], which decides how the binary
/// reports it and whether the run can continue.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed arguments, a missing root, or a bad pattern file.
    #[error("{0}")]
    Usage(String),

    /// A read or write failure on a single candidate file.
    #[error("{}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The directory walk itself failed.
    #[error("Walk error: {0}")]
    Traversal(#[from] walkdir::Error),

    /// The import formatter rejected a file.
    #[error("Formatting {} failed: {message}", path.display())]
    Format { path: PathBuf, message: String },

    /// An error that occurred while parsing a YAML pattern file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Classification of an [`Error`], matched explicitly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    FileIo,
    Traversal,
    Format,
}

impl Error {
    /// Builds a per-file I/O error for `path`.
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Returns the taxonomy tag for this error.
    ///
    /// A malformed pattern file is a usage problem.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Usage(_) | Error::Yaml(_) => ErrorKind::Usage,
            Error::FileIo { .. } => ErrorKind::FileIo,
            Error::Traversal(_) => ErrorKind::Traversal,
            Error::Format { .. } => ErrorKind::Format,
        }
    }
}

/// A convenient type alias for `Result<T, reptree::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Usage(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Usage(s.to_string())
    }
}
