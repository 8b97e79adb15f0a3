use std::sync::Arc;

use gateway::{Credentials, GatewayError, HttpGateway, LearningApi};
use learn_core::model::{
    AuthSession, HealthStatus, LoginRequest, Registration, SessionEnd, SessionEnded, SessionId,
    SessionStart, SessionStarted, TopicId, UserId,
};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::error::{ClientError, OperationError};
use crate::store::{LearningStore, StoreEvent};

/// Composition root: one gateway, one store and the dispatcher between them.
#[derive(Clone)]
pub struct LearningClient {
    gateway: Arc<dyn LearningApi>,
    credentials: Credentials,
    store: LearningStore,
    dispatcher: Dispatcher,
    user_id: Option<UserId>,
}

impl LearningClient {
    /// Build a client talking HTTP to `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the base URL is unusable or the HTTP client
    /// cannot be built.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let credentials = config
            .token
            .as_deref()
            .map_or_else(Credentials::new, |token| Credentials::with_token(token));
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let gateway = HttpGateway::new(&config.base_url, credentials.clone())?.with_client(http);
        debug!(base_url = %config.base_url, "learning client connected");

        let mut client = Self::with_gateway(Arc::new(gateway), credentials);
        client.user_id = config.user_id.clone();
        Ok(client)
    }

    /// Build a client over any gateway, e.g. a `ScriptedGateway` in tests.
    #[must_use]
    pub fn with_gateway(gateway: Arc<dyn LearningApi>, credentials: Credentials) -> Self {
        let store = LearningStore::create();
        let dispatcher = Dispatcher::new(Arc::clone(&gateway), store.clone());
        Self {
            gateway,
            credentials,
            store,
            dispatcher,
            user_id: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn store(&self) -> &LearningStore {
        &self.store
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Log in and adopt the returned user as the client's user.
    ///
    /// # Errors
    ///
    /// Returns `OperationError` when the server rejects the credentials.
    pub async fn login(&mut self, request: &LoginRequest) -> Result<AuthSession, OperationError> {
        let session = lift(self.gateway.login(request).await, "Login failed")?;
        self.signed_in(&session);
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `OperationError` when registration is refused.
    pub async fn register(
        &mut self,
        registration: &Registration,
    ) -> Result<AuthSession, OperationError> {
        let session = lift(
            self.gateway.register(registration).await,
            "Registration failed",
        )?;
        self.signed_in(&session);
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `OperationError` when the session cannot be started.
    pub async fn start_session(&self, topic_id: TopicId) -> Result<SessionStarted, OperationError> {
        lift(
            self.gateway.start_session(&SessionStart { topic_id }).await,
            "Failed to start session",
        )
    }

    /// # Errors
    ///
    /// Returns `OperationError` when the session cannot be closed.
    pub async fn end_session(
        &self,
        session_id: SessionId,
        activities_completed: u32,
    ) -> Result<SessionEnded, OperationError> {
        let end = SessionEnd {
            session_id,
            activities_completed,
        };
        lift(self.gateway.end_session(&end).await, "Failed to end session")
    }

    /// # Errors
    ///
    /// Returns `OperationError` when the server is unreachable or unhealthy.
    pub async fn health(&self) -> Result<HealthStatus, OperationError> {
        lift(self.gateway.health().await, "Health check failed")
    }

    /// Dispose the store. Operations still in flight complete but their
    /// results are dropped.
    pub fn dispose(&self) {
        self.store.dispose();
    }

    fn signed_in(&mut self, session: &AuthSession) {
        info!(username = %session.user.username, "signed in");
        self.user_id = Some(session.user.id.clone());
        self.store.apply(StoreEvent::AcknowledgeAuthExpired);
    }
}

fn lift<T>(outcome: Result<T, GatewayError>, default_message: &str) -> Result<T, OperationError> {
    outcome.map_err(|err| OperationError::from_gateway(err, default_message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::{RemoteError, ScriptedGateway};
    use learn_core::model::{DifficultyLevel, UserProfile};

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::from(7),
            username: "ada".into(),
            email: None,
            learning_level: DifficultyLevel::Beginner,
        }
    }

    #[tokio::test]
    async fn login_adopts_user_and_acknowledges_expiry() {
        let gateway = ScriptedGateway::new();
        gateway.push_login(Ok(AuthSession {
            access_token: "fresh".into(),
            user: profile(),
        }));
        let mut client = LearningClient::with_gateway(Arc::new(gateway), Credentials::new());
        client.store().apply(StoreEvent::FetchUserTopics(crate::dispatch::Phase::Failed(
            OperationError::AuthExpired,
        )));

        client
            .login(&LoginRequest {
                username: "ada".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();

        assert_eq!(client.user_id(), Some(&UserId::from(7)));
        assert!(!client.store().snapshot().auth_expired);
    }

    #[tokio::test]
    async fn pass_through_failures_use_default_message() {
        let gateway = ScriptedGateway::new();
        gateway.push_start_session(Err(RemoteError::new(Some(500), None).into()));
        let client = LearningClient::with_gateway(Arc::new(gateway), Credentials::new());

        let err = client.start_session(TopicId::from(3)).await.unwrap_err();

        assert_eq!(err, OperationError::Remote("Failed to start session".into()));
    }

    #[test]
    fn connect_rejects_bad_base_url() {
        let config = ClientConfig {
            base_url: "not a url".into(),
            ..ClientConfig::default()
        };

        assert!(matches!(
            LearningClient::connect(&config),
            Err(ClientError::Gateway(_))
        ));
    }
}
