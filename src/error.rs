// Error types for talking to the ingestion service and reading local files.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    /// The server answered, but not with a status the operation accepts.
    #[error("{operation} failed: {status} {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    #[error("{0} is not set")]
    MissingEnv(&'static str),
}

impl UploadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UploadError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
