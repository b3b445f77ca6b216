// Error types for store access

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to the item store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network, TLS, proxy or timeout failure from the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Service error ({status}) {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Signing credentials could not be obtained
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Client could not be built from the given settings
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Create a service error
    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Service {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        StoreError::Decode(msg.into())
    }

    /// Create a credentials error
    pub fn credentials(msg: impl Into<String>) -> Self {
        StoreError::Credentials(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        StoreError::Configuration(msg.into())
    }

    /// Whether the error was raised by the remote service rather than the transport
    pub fn is_service(&self) -> bool {
        matches!(self, StoreError::Service { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = StoreError::service(400, "ResourceNotFoundException", "Requested resource not found");
        assert!(err.is_service());
        assert_eq!(
            err.to_string(),
            "Service error (400) ResourceNotFoundException: Requested resource not found"
        );
    }

    #[test]
    fn test_json_error_becomes_decode() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Decode(_)));
        assert!(!err.is_service());
    }
}
