//! Error types for the MangoPay client.
//!
//! All errors implement the standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Validation errors** ([`MangoError::Validation`]): rejected locally, before any network call
//! - **Transport errors** ([`MangoError::Transport`]): network, authentication or HTTP status
//!   failures reported by the [`Transport`](crate::transport::Transport)
//! - **Logical failures** ([`MangoError::TransactionFailed`]): the request went through but the
//!   service rejected the transaction
//! - **Serialization errors** ([`MangoError::Serialization`]): a body that cannot be encoded or
//!   decoded into the expected type
//! - **Configuration errors** ([`MangoError::Config`]): invalid or unreadable client configuration
//!
//! # Examples
//!
//! Logical failures are matched by variant, never by message:
//!
//! ```
//! use mangopay_client::error::MangoError;
//!
//! let err = MangoError::TransactionFailed {
//!     kind: "transfer",
//!     id: "8494514".to_owned(),
//!     message: "insufficient funds".to_owned(),
//! };
//! assert!(err.is_transaction_failure());
//! assert_eq!(err.to_string(), "transfer 8494514 failed: insufficient funds");
//! ```

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, MangoError>;

/// Errors returned by the client.
///
/// Nothing is retried or logged by the client itself: every error reaches the
/// immediate caller, who decides what to do with it.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum MangoError {
    /// A required reference is missing or empty.
    ///
    /// Raised before anything is sent over the wire (nil author, wallet
    /// without an identifier, save on an already executed transfer...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The transport could not complete the request.
    ///
    /// The inner [`TransportError`] is exactly what the transport reported.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request was accepted but the transaction was rejected.
    ///
    /// The returned object is still available on the binding and reflects the
    /// failed state.
    #[error("{kind} {id} failed: {message}")]
    TransactionFailed {
        /// Kind of transaction (`transfer`, `refund`...).
        kind: &'static str,
        /// Identifier assigned by the service.
        id: String,
        /// Human readable reason supplied by the service.
        message: String,
    },

    /// A body could not be encoded or decoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MangoError {
    /// Returns true for a business-level rejection of a transaction.
    #[must_use]
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, Self::TransactionFailed { .. })
    }

    /// Returns the transport error, if this is one.
    #[must_use]
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MangoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for MangoError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for MangoError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(TransportError::from(err))
    }
}

/// Failures reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, TLS, timeout, refused connection).
    #[error("network failure: {0}")]
    Network(String),

    /// The request was refused locally and never sent.
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// Credentials were rejected.
    #[error("authentication failed ({status}): {message}")]
    Authentication {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Message supplied by the service.
        message: String,
    },

    /// The service answered with a non-success status.
    ///
    /// `message` is the service's own message, unchanged.
    #[error("service returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message supplied by the service, or the raw body when it is not JSON.
        message: String,
        /// Error type supplied by the service (`param_error`, `ressource_not_found`...).
        error_type: Option<String>,
    },
}

impl TransportError {
    /// Returns the HTTP status, when the service answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network(_) | Self::InvalidPath(_) => None,
            Self::Authentication { status, .. } | Self::Status { status, .. } => Some(*status),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let error = MangoError::Validation("new transfer: nil author".into());
        assert_eq!(error.to_string(), "validation failed: new transfer: nil author");
    }

    #[test]
    fn test_transaction_failed_display() {
        let error = MangoError::TransactionFailed {
            kind: "transfer",
            id: "42".to_owned(),
            message: "insufficient funds".to_owned(),
        };
        assert_eq!(error.to_string(), "transfer 42 failed: insufficient funds");
        assert!(error.is_transaction_failure());
        assert!(error.as_transport().is_none());
    }

    #[test]
    fn test_transport_is_transparent() {
        let error = MangoError::from(TransportError::Status {
            status: 400,
            message: "original transaction must have a SUCCEEDED Status".to_owned(),
            error_type: Some("param_error".to_owned()),
        });
        assert!(error.to_string().contains("original transaction must have a SUCCEEDED Status"));
        assert!(!error.is_transaction_failure());
        assert_eq!(error.as_transport().and_then(TransportError::status), Some(400));
    }

    #[test]
    fn test_authentication_error() {
        let error = TransportError::Authentication { status: 401, message: "invalid_client".into() };
        assert_eq!(error.to_string(), "authentication failed (401): invalid_client");
        assert_eq!(error.status(), Some(401));
    }

    #[test]
    fn test_network_error_has_no_status() {
        assert_eq!(TransportError::Network("connection refused".into()).status(), None);
        assert_eq!(TransportError::InvalidPath("/a/../b".into()).status(), None);
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let error = MangoError::from(err);
        assert!(matches!(error, MangoError::Serialization(_)));
    }
}
