//! Client-level error type.
//!
//! Most store operations never fail from the caller's point of view: storage
//! and remote problems are logged and local state wins. `ClientError` covers
//! the few places where the caller has to react (bad input, no chat session,
//! auth rejected, startup configuration).

use barbuddy_core::{EmailError, RatingError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Errors surfaced to callers of the client core.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local storage could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A remote call the caller explicitly waited on failed.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Rating outside 1-10.
    #[error("Invalid rating: {0}")]
    Rating(#[from] RatingError),

    /// Email failed validation.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// Input rejected before anything was changed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// `send_message` was called before `create_or_get_session`.
    #[error("No active chat session")]
    NoActiveSession,

    /// Sign-in or sign-up was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rating_error() {
        let err: ClientError = barbuddy_core::DrunkScaleRating::new(42).unwrap_err().into();
        assert!(matches!(err, ClientError::Rating(_)));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ClientError::NoActiveSession.to_string(),
            "No active chat session"
        );
        assert_eq!(
            ClientError::Validation("too long".to_string()).to_string(),
            "Validation failed: too long"
        );
    }
}
