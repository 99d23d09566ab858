use std::path::PathBuf;

use thiserror::Error;

use crate::base::DocId;

/// Errors raised while building or reading an index
#[derive(Error, Debug)]
pub enum Error {
    #[error("Document source {path} is unavailable: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Malformed run file {path} at line {line}: {reason}")]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Document IDs should be increasing: {current} follows {previous}")]
    UnorderedDocuments { previous: DocId, current: DocId },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Index in {0} has not been completely built")]
    Incomplete(PathBuf),

    #[error("Build aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
