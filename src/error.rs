//! Error types for sqlgate.
//!
//! Defines the error enum used throughout the pipeline. Policy rejections
//! are a distinct variant from infrastructure failures so callers can map
//! them to a client-facing rejection instead of a server error.

use thiserror::Error;

use crate::safety::RejectReason;

/// Main error type for sqlgate operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The upstream LLM call failed or returned a non-success status.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The safety classifier rejected the generated statement.
    #[error("Rejected: {0}")]
    Rejected(RejectReason),

    /// The database call failed (connectivity, timeout, engine rejection).
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration or input errors (missing key, blank prompt, bad URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller's cancellation token fired while a call was in flight.
    #[error("Request cancelled")]
    Cancelled,

    /// Internal application errors (unexpected states, bugs).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates an upstream error with the given message.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a boundary input error (blank prompt, malformed request
    /// fields). Carried by the `Config` variant; callers treat both the
    /// same way.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this error should be surfaced to the caller as a
    /// client error (bad request) rather than a server failure.
    ///
    /// A rejection means the model produced unsafe SQL, not that the
    /// infrastructure failed; the two must stay distinguishable.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Config(_))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "Upstream Error",
            Self::Rejected(_) => "Policy Rejection",
            Self::Execution(_) => "Execution Error",
            Self::Config(_) => "Configuration Error",
            Self::Cancelled => "Cancelled",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using sqlgate's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_upstream() {
        let err = Error::upstream("OpenRouter error (500): boom");
        assert_eq!(
            err.to_string(),
            "Upstream error: OpenRouter error (500): boom"
        );
        assert_eq!(err.category(), "Upstream Error");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_error_display_rejected() {
        let err = Error::Rejected(RejectReason::MultipleStatements);
        assert!(err.to_string().starts_with("Rejected: "));
        assert_eq!(err.category(), "Policy Rejection");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_display_execution() {
        let err = Error::execution("relation \"orders\" does not exist");
        assert_eq!(
            err.to_string(),
            "Execution error: relation \"orders\" does not exist"
        );
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::config("missing OpenRouter API key");
        assert_eq!(err.category(), "Configuration Error");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_cancelled_is_not_client_error() {
        assert!(!Error::Cancelled.is_client_error());
        assert_eq!(Error::Cancelled.category(), "Cancelled");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
