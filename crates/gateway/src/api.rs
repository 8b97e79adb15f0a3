use async_trait::async_trait;
use learn_core::model::{
    AuthSession, HealthStatus, LoginRequest, NewTopic, ProgressRecord, ProgressUpdate,
    QuizResult, QuizSubmission, Recommendations, Registration, SessionEnd, SessionEnded,
    SessionStart, SessionStarted, Topic, TopicId, UserId,
};
use std::fmt;
use thiserror::Error;

/// A failed round trip: a non-success response, a transport failure, or a
/// body that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Human-readable `error` field from the response body, if any.
    pub message: Option<String>,
}

impl RemoteError {
    #[must_use]
    pub fn new(status: Option<u16>, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// A failure carrying a server-provided message.
    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self::new(None, Some(message.into()))
    }

    /// A failure with neither status nor message, e.g. a dropped connection.
    #[must_use]
    pub fn unspecified() -> Self {
        Self::new(None, None)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, self.status) {
            (Some(message), _) => f.write_str(message),
            (None, Some(status)) => write!(f, "request failed with status {status}"),
            (None, None) => f.write_str("request failed"),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Errors surfaced by gateway implementations.
///
/// Closed set: callers match it exhaustively.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server rejected the stored credential. It has already been discarded.
    #[error("authentication expired")]
    AuthExpired,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Typed access to the learning platform's remote resources.
///
/// One method per resource kind and verb. Implementations perform exactly one
/// round trip per call: no retries, no caching, no payload validation.
#[async_trait]
pub trait LearningApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `GatewayError` if the topic cannot be created.
    async fn create_topic(&self, topic: &NewTopic) -> Result<Topic, GatewayError>;

    /// List topics belonging to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on any failed round trip.
    async fn list_topics(&self) -> Result<Vec<Topic>, GatewayError>;

    /// # Errors
    ///
    /// Returns `GatewayError` on any failed round trip, including a missing topic.
    async fn get_topic(&self, id: &TopicId) -> Result<Topic, GatewayError>;

    /// # Errors
    ///
    /// Returns `GatewayError` on any failed round trip.
    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, GatewayError>;

    /// # Errors
    ///
    /// Returns `GatewayError` on any failed round trip.
    async fn get_progress(&self, user: &UserId) -> Result<Vec<ProgressRecord>, GatewayError>;

    /// Apply a partial progress update.
    ///
    /// The server only confirms the write, so the accepted update is returned.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on any failed round trip.
    async fn update_progress(&self, update: &ProgressUpdate)
    -> Result<ProgressUpdate, GatewayError>;

    /// # Errors
    ///
    /// Returns `GatewayError` on any failed round trip.
    async fn get_recommendations(&self, user: &UserId) -> Result<Recommendations, GatewayError>;

    /// Sign in and remember the issued token for subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Remote` for rejected credentials.
    async fn login(&self, request: &LoginRequest) -> Result<AuthSession, GatewayError>;

    /// # Errors
    ///
    /// Returns `GatewayError::Remote` when the account cannot be created.
    async fn register(&self, registration: &Registration) -> Result<AuthSession, GatewayError>;

    /// # Errors
    ///
    /// Returns `GatewayError` on any failed round trip.
    async fn start_session(&self, start: &SessionStart) -> Result<SessionStarted, GatewayError>;

    /// # Errors
    ///
    /// Returns `GatewayError` on any failed round trip.
    async fn end_session(&self, end: &SessionEnd) -> Result<SessionEnded, GatewayError>;

    /// # Errors
    ///
    /// Returns `GatewayError` when the server is unreachable or unhealthy.
    async fn health(&self) -> Result<HealthStatus, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_prefers_server_message() {
        let err = RemoteError::new(Some(500), Some("Error creating topic: boom".into()));
        assert_eq!(err.to_string(), "Error creating topic: boom");
    }

    #[test]
    fn remote_error_falls_back_to_status() {
        assert_eq!(
            RemoteError::new(Some(503), None).to_string(),
            "request failed with status 503"
        );
        assert_eq!(RemoteError::unspecified().to_string(), "request failed");
    }

    #[test]
    fn gateway_is_object_safe() {
        fn assert_object_safe(_: Option<&dyn LearningApi>) {}
        assert_object_safe(None);
    }
}
