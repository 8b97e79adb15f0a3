use async_trait::async_trait;
use learn_core::model::{
    AuthSession, HealthStatus, LoginRequest, NewTopic, ProgressRecord, ProgressUpdate,
    QuizResult, QuizSubmission, Recommendations, Registration, SessionEnd, SessionEnded,
    SessionStart, SessionStarted, Topic, TopicId, UserId,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::api::{GatewayError, LearningApi, RemoteError};
use crate::credentials::Credentials;
use crate::wire::{ErrorBody, ProgressEnvelope, TopicEnvelope, TopicsEnvelope};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpGatewayError {
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("base url `{0}` cannot carry a path")]
    CannotBeABase(String),
}

/// What a 401 means for a given route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnUnauthorized {
    /// The stored credential was rejected: discard it.
    Expire,
    /// The route itself authenticates (login), so a 401 is an ordinary failure.
    Report,
}

/// `LearningApi` over HTTP/JSON.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl HttpGateway {
    /// Build a gateway rooted at `base_url`, e.g. `http://localhost:5000`.
    ///
    /// # Errors
    ///
    /// Returns `HttpGatewayError` if the URL does not parse or cannot carry a path.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, HttpGatewayError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(HttpGatewayError::CannotBeABase(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            credentials,
        })
    }

    /// Replace the underlying client, e.g. one built with a request timeout.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can always carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        route: &'static str,
        on_unauthorized: OnUnauthorized,
    ) -> Result<T, GatewayError> {
        let request = match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        debug!(route, "gateway request");
        let response = request.send().await.map_err(|err| {
            warn!(route, error = %err, "gateway transport failure");
            transport_error(&err)
        })?;

        let status = response.status();
        debug!(route, status = status.as_u16(), "gateway response");

        if status == StatusCode::UNAUTHORIZED && on_unauthorized == OnUnauthorized::Expire {
            if self.credentials.clear() {
                warn!(route, "credential rejected; discarded stored token");
            }
            return Err(GatewayError::AuthExpired);
        }

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error);
            return Err(RemoteError::new(Some(status.as_u16()), message).into());
        }

        response.json::<T>().await.map_err(|err| {
            warn!(route, error = %err, "gateway could not decode response body");
            RemoteError::new(Some(status.as_u16()), None).into()
        })
    }

    async fn authenticate<B: serde::Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
        route: &'static str,
    ) -> Result<AuthSession, GatewayError> {
        let request = self.client.post(self.endpoint(segments)).json(body);
        let session: AuthSession = self.send(request, route, OnUnauthorized::Report).await?;
        self.credentials.set(session.access_token.clone());
        Ok(session)
    }
}

fn transport_error(err: &reqwest::Error) -> GatewayError {
    RemoteError::new(err.status().map(|s| s.as_u16()), None).into()
}

#[async_trait]
impl LearningApi for HttpGateway {
    async fn create_topic(&self, topic: &NewTopic) -> Result<Topic, GatewayError> {
        let request = self.client.post(self.endpoint(&["api", "topics"])).json(topic);
        let envelope: TopicEnvelope = self
            .send(request, "topics/create", OnUnauthorized::Expire)
            .await?;
        Ok(envelope.topic)
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, GatewayError> {
        let request = self.client.get(self.endpoint(&["api", "topics"]));
        let envelope: TopicsEnvelope = self
            .send(request, "topics/list", OnUnauthorized::Expire)
            .await?;
        Ok(envelope.topics)
    }

    async fn get_topic(&self, id: &TopicId) -> Result<Topic, GatewayError> {
        let id = id.to_string();
        let request = self.client.get(self.endpoint(&["api", "topics", &id]));
        let envelope: TopicEnvelope = self
            .send(request, "topics/get", OnUnauthorized::Expire)
            .await?;
        Ok(envelope.topic)
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, GatewayError> {
        let request = self
            .client
            .post(self.endpoint(&["api", "quiz", "submit"]))
            .json(submission);
        self.send(request, "quiz/submit", OnUnauthorized::Expire)
            .await
    }

    async fn get_progress(&self, user: &UserId) -> Result<Vec<ProgressRecord>, GatewayError> {
        let user = user.to_string();
        let request = self.client.get(self.endpoint(&["api", "progress", &user]));
        let envelope: ProgressEnvelope = self
            .send(request, "progress/get", OnUnauthorized::Expire)
            .await?;
        Ok(envelope.progress)
    }

    async fn update_progress(
        &self,
        update: &ProgressUpdate,
    ) -> Result<ProgressUpdate, GatewayError> {
        let request = self
            .client
            .post(self.endpoint(&["api", "progress", "update"]))
            .json(update);
        let _: serde_json::Value = self
            .send(request, "progress/update", OnUnauthorized::Expire)
            .await?;
        Ok(update.clone())
    }

    async fn get_recommendations(&self, user: &UserId) -> Result<Recommendations, GatewayError> {
        let user = user.to_string();
        let request = self
            .client
            .get(self.endpoint(&["api", "recommendations", &user]));
        self.send(request, "recommendations/get", OnUnauthorized::Expire)
            .await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthSession, GatewayError> {
        self.authenticate(&["api", "auth", "login"], request, "auth/login")
            .await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthSession, GatewayError> {
        self.authenticate(&["api", "auth", "register"], registration, "auth/register")
            .await
    }

    async fn start_session(&self, start: &SessionStart) -> Result<SessionStarted, GatewayError> {
        let request = self
            .client
            .post(self.endpoint(&["api", "session", "start"]))
            .json(start);
        self.send(request, "session/start", OnUnauthorized::Expire)
            .await
    }

    async fn end_session(&self, end: &SessionEnd) -> Result<SessionEnded, GatewayError> {
        let request = self
            .client
            .post(self.endpoint(&["api", "session", "end"]))
            .json(end);
        self.send(request, "session/end", OnUnauthorized::Expire)
            .await
    }

    async fn health(&self) -> Result<HealthStatus, GatewayError> {
        let request = self.client.get(self.endpoint(&["api", "health"]));
        self.send(request, "health", OnUnauthorized::Report).await
    }
}
