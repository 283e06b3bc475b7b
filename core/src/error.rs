use std::{io, path::PathBuf};

use thiserror::Error;

pub type UnhashResult<T> = std::result::Result<T, UnhashError>;

#[derive(Error, Debug)]
pub enum UnhashError {
    #[error(
        "The minimum length ({min}) must be at least 1 and not greater than the maximum length ({max}), which cannot exceed {}",
        crate::MAX_LENGTH_ALLOWED
    )]
    InvalidRange { min: usize, max: usize },

    #[error("The charset should contain at least one character")]
    EmptyCharset,

    #[error("Unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("The hash algorithm {0} is already registered")]
    DuplicateAlgorithm(String),

    #[error("Unable to access the file at {path}. Make sure it exists and the right permissions are available")]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unhash only supports spaces up to 2^64, but the provided space is 2^{0}")]
    Space(u8),

    #[error("The target digest {0:?} is empty or contains whitespace")]
    InvalidDigest(String),

    #[error("The search job has already been started")]
    AlreadyStarted,

    #[error("The search worker panicked")]
    WorkerPanicked,
}

impl UnhashError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ResourceUnavailable {
            path: path.into(),
            source,
        }
    }
}
