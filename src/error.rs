use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Everything that can go wrong while importing, exporting or creating
/// directories. Each variant carries the path it relates to when there is one.
#[derive(Debug, Error)]
pub enum Error {
    /// The file to read does not exist.
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The content is malformed for the requested format.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Any other file-system failure (permissions, missing parent, not a directory, ...).
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported encoding '{0}', only UTF-8 is supported")]
    UnsupportedEncoding(String),

    #[error("delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Classify an error raised while opening or reading a file.
    /// `NotFound` is reported as such, everything else as `Io`.
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::io(path, source)
        }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
