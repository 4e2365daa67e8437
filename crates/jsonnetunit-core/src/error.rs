//! Error taxonomy for the harness.

use std::path::PathBuf;

use jsonnetunit_fetch::FetchError;

/// Raw failure reported by the evaluator.
///
/// The message is the only signal available for classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EvaluatorError {
    pub message: String,
}

impl EvaluatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised by host functions called from the evaluator.
#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    #[error("unknown native function: {0}")]
    UnknownFunction(String),

    #[error("{function}: expected {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("{function}: parameter {param} must be a {expected}")]
    InvalidArgument {
        function: String,
        param: String,
        expected: &'static str,
    },

    #[error("fetched body is not valid UTF-8: {url}")]
    InvalidUtf8 { url: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Suite could not be obtained from either the local copy or the remote.
#[derive(Debug, thiserror::Error)]
pub enum SuiteLoadError {
    #[error("invalid suite name: {0:?}")]
    InvalidName(String),

    #[error("sync failed from {url}: {source}")]
    Sync {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("suite {name} still missing at {path:?} after download")]
    Missing { name: String, path: PathBuf },

    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed suite {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Test-file globbing failed.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read matched entry: {0}")]
    Glob(#[from] glob::GlobError),
}

/// Evaluator output is not the JSON shape the harness expects.
#[derive(Debug, thiserror::Error)]
#[error("unexpected evaluator output ({expected}): {source}")]
pub struct DecodeError {
    pub expected: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Top-level harness errors.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    SuiteLoad(#[from] SuiteLoadError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
