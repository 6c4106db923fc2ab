//! Error types for Parley operations

/// Result type for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;

/// Error types for Parley
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    /// The completion service failed (transport, auth, HTTP status, empty reply)
    #[error("Completion service error: {0}")]
    Completion(String),

    /// The completion service answered, but not in the expected shape
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ParleyError {
    /// Whether this error came from the completion service call
    pub fn is_completion_failure(&self) -> bool {
        matches!(
            self,
            ParleyError::Completion(_) | ParleyError::MalformedResponse(_)
        )
    }
}

impl From<String> for ParleyError {
    fn from(s: String) -> Self {
        ParleyError::Other(s)
    }
}

impl From<&str> for ParleyError {
    fn from(s: &str) -> Self {
        ParleyError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for ParleyError {
    fn from(err: anyhow::Error) -> Self {
        ParleyError::Other(err.to_string())
    }
}
