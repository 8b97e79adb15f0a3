//! Shared error types for the services crate.

use gateway::{GatewayError, HttpGatewayError};
use thiserror::Error;

/// Terminal failure of a dispatched operation, as surfaced to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// Server or network failure. Carries the server's message, or the
    /// operation's default message when the server gave none.
    #[error("{0}")]
    Remote(String),
    /// The stored credential was rejected. Not recorded as a slice error.
    #[error("authentication expired")]
    AuthExpired,
}

impl OperationError {
    /// Map a gateway failure, substituting `default_message` when the server
    /// did not provide a usable one.
    #[must_use]
    pub fn from_gateway(err: GatewayError, default_message: &str) -> Self {
        match err {
            GatewayError::AuthExpired => Self::AuthExpired,
            GatewayError::Remote(remote) => Self::Remote(
                remote
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| default_message.to_string()),
            ),
        }
    }
}

/// Errors emitted while reading client configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid LEARN_API_TIMEOUT_SECS value: {raw}")]
    InvalidTimeout { raw: String },
    #[error("invalid LEARN_USER_ID value: {raw}")]
    InvalidUserId { raw: String },
}

/// Errors emitted while assembling a `LearningClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] HttpGatewayError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::RemoteError;

    #[test]
    fn server_message_wins_over_default() {
        let err = OperationError::from_gateway(
            RemoteError::with_message("Topic title is required").into(),
            "Failed to create topic",
        );
        assert_eq!(err, OperationError::Remote("Topic title is required".into()));
    }

    #[test]
    fn missing_or_blank_message_uses_default() {
        let missing = OperationError::from_gateway(
            RemoteError::new(Some(500), None).into(),
            "Failed to submit quiz",
        );
        let blank = OperationError::from_gateway(
            RemoteError::with_message("  ").into(),
            "Failed to submit quiz",
        );

        assert_eq!(missing.to_string(), "Failed to submit quiz");
        assert_eq!(blank.to_string(), "Failed to submit quiz");
    }

    #[test]
    fn auth_expiry_is_preserved() {
        assert_eq!(
            OperationError::from_gateway(GatewayError::AuthExpired, "Failed to fetch topics"),
            OperationError::AuthExpired
        );
    }
}
