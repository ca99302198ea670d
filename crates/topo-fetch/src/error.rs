//! Fetch error type.

/// Why a collaborator request produced no data.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid bounding box: {0}")]
    InvalidBounds(String),

    #[error("source failed: {0}")]
    Source(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    pub fn failed<T: ToString>(msg: T) -> Self {
        FetchError::Source(msg.to_string())
    }
}
