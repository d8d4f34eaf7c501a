use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Failure of a single outbound call, after retries.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network failure, timeout, or retry budget exhausted on a transient status.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// The payload did not have the shape we expected.
    #[error("Upstream data error: {0}")]
    Data(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Errors surfaced to callers of the ranking pipeline.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Zone enumeration failed: {0}")]
    Enumeration(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
