/*
[INPUT]:  Error sources (HTTP transport, API envelope, serialization)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the floor task service adapter
#[derive(Error, Debug)]
pub enum FloorError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// The task is no longer assigned to this station (reassigned or
    /// withdrawn server-side). Retrying the same task is pointless; the
    /// caller must discard it and request fresh work.
    #[error("task no longer assigned: {message}")]
    AllocationConflict { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request deadline elapsed before a response arrived
    #[error("Request timed out after {duration}s")]
    Timeout { duration: u64 },
}

impl FloorError {
    /// Check if the error is retryable by repeating the same call
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FloorError::Http(_) | FloorError::Timeout { .. } | FloorError::InvalidResponse(_)
        )
    }

    /// Check if the error invalidates the active task assignment
    pub fn is_allocation_conflict(&self) -> bool {
        matches!(self, FloorError::AllocationConflict { .. })
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, FloorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let timeout_err = FloorError::Timeout { duration: 10 };
        assert!(timeout_err.is_retryable());

        let conflict = FloorError::AllocationConflict {
            message: "reassigned to station 4".to_string(),
        };
        assert!(!conflict.is_retryable());
        assert!(conflict.is_allocation_conflict());

        let api = FloorError::Api {
            code: 500,
            message: "boom".to_string(),
        };
        assert!(!api.is_retryable());
        assert!(!api.is_allocation_conflict());
    }

    #[test]
    fn test_error_display() {
        let err = FloorError::Api {
            code: 422,
            message: "quantity exceeds remaining units".to_string(),
        };
        assert!(err.to_string().contains("422"));
        assert!(err.to_string().contains("quantity exceeds remaining units"));
    }
}
