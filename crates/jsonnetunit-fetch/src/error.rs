//! Error types for jsonnetunit-fetch

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving a URL to bytes
#[derive(Error, Debug)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("fetch from {url} failed with {status}")]
    Status { url: String, status: u16 },

    /// Connection, TLS or body read failure
    #[error("fetch from {url} failed: {detail}")]
    Transport { url: String, detail: String },

    /// Local fixture (loopback redirect) could not be read
    #[error("failed to read local fixture {path:?}: {source}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Loopback URL tried to escape the fixtures directory
    #[error("invalid fixture path in {url}")]
    InvalidFixturePath { url: String },

    /// Cache directory or entry could not be read or written
    #[error("cache error at {path:?}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
