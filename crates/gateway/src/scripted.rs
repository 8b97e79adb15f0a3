use async_trait::async_trait;
use learn_core::model::{
    AuthSession, HealthStatus, LoginRequest, NewTopic, ProgressRecord, ProgressUpdate,
    QuizResult, QuizSubmission, Recommendations, Registration, SessionEnd, SessionEnded,
    SessionId, SessionStart, SessionStarted, Topic, TopicId, UserId,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

use crate::api::{GatewayError, LearningApi, RemoteError};

/// A call observed by `ScriptedGateway`, with the payload it carried.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    CreateTopic(NewTopic),
    ListTopics,
    GetTopic(TopicId),
    SubmitQuiz(QuizSubmission),
    GetProgress(UserId),
    UpdateProgress(ProgressUpdate),
    GetRecommendations(UserId),
    Login { username: String },
    Register { username: String },
    StartSession(TopicId),
    EndSession(SessionId),
    Health,
}

/// Completes a held scripted response. Dropping it releases the response too.
#[derive(Debug)]
pub struct Release(oneshot::Sender<()>);

impl Release {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

struct Scripted<T> {
    result: Result<T, GatewayError>,
    gate: Option<oneshot::Receiver<()>>,
}

type Script<T> = VecDeque<Scripted<T>>;

#[derive(Default)]
struct Scripts {
    create_topic: Script<Topic>,
    list_topics: Script<Vec<Topic>>,
    get_topic: Script<Topic>,
    submit_quiz: Script<QuizResult>,
    get_progress: Script<Vec<ProgressRecord>>,
    update_progress: Script<ProgressUpdate>,
    get_recommendations: Script<Recommendations>,
    login: Script<AuthSession>,
    register: Script<AuthSession>,
    start_session: Script<SessionStarted>,
    end_session: Script<SessionEnded>,
    health: Script<HealthStatus>,
    calls: Vec<GatewayCall>,
}

/// In-memory `LearningApi` that answers from per-operation FIFO queues.
///
/// Each call takes the next scripted entry for its operation as soon as it
/// reaches the gateway. Entries pushed with a `hold_*` method do not answer
/// until their [`Release`] fires, so tests decide the order in which
/// concurrent calls complete. Unscripted calls fail with a descriptive message.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    scripts: Arc<Mutex<Scripts>>,
}

macro_rules! scripted {
    ($push:ident, $hold:ident, $field:ident, $ty:ty) => {
        pub fn $push(&self, result: Result<$ty, GatewayError>) -> &Self {
            self.lock().$field.push_back(Scripted { result, gate: None });
            self
        }

        pub fn $hold(&self, result: Result<$ty, GatewayError>) -> Release {
            let (tx, rx) = oneshot::channel();
            self.lock().$field.push_back(Scripted {
                result,
                gate: Some(rx),
            });
            Release(tx)
        }
    };
}

impl ScriptedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    scripted!(push_create_topic, hold_create_topic, create_topic, Topic);
    scripted!(push_list_topics, hold_list_topics, list_topics, Vec<Topic>);
    scripted!(push_get_topic, hold_get_topic, get_topic, Topic);
    scripted!(push_submit_quiz, hold_submit_quiz, submit_quiz, QuizResult);
    scripted!(push_get_progress, hold_get_progress, get_progress, Vec<ProgressRecord>);
    scripted!(push_update_progress, hold_update_progress, update_progress, ProgressUpdate);
    scripted!(
        push_get_recommendations,
        hold_get_recommendations,
        get_recommendations,
        Recommendations
    );
    scripted!(push_login, hold_login, login, AuthSession);
    scripted!(push_register, hold_register, register, AuthSession);
    scripted!(push_start_session, hold_start_session, start_session, SessionStarted);
    scripted!(push_end_session, hold_end_session, end_session, SessionEnded);
    scripted!(push_health, hold_health, health, HealthStatus);

    /// Calls observed so far, in the order they reached the gateway.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Scripts> {
        // A panicking test thread must not hide the script from the others.
        self.scripts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn answer<T>(
        &self,
        call: GatewayCall,
        name: &str,
        pick: impl FnOnce(&mut Scripts) -> &mut Script<T>,
    ) -> Result<T, GatewayError> {
        let entry = {
            let mut scripts = self.lock();
            scripts.calls.push(call);
            pick(&mut *scripts).pop_front()
        };
        let Some(Scripted { result, gate }) = entry else {
            return Err(
                RemoteError::with_message(format!("no scripted response for {name}")).into(),
            );
        };
        if let Some(gate) = gate {
            // A dropped `Release` counts as released.
            let _ = gate.await;
        }
        result
    }
}

#[async_trait]
impl LearningApi for ScriptedGateway {
    async fn create_topic(&self, topic: &NewTopic) -> Result<Topic, GatewayError> {
        let call = GatewayCall::CreateTopic(topic.clone());
        self.answer(call, "create_topic", |s| &mut s.create_topic)
            .await
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, GatewayError> {
        self.answer(GatewayCall::ListTopics, "list_topics", |s| &mut s.list_topics)
            .await
    }

    async fn get_topic(&self, id: &TopicId) -> Result<Topic, GatewayError> {
        let call = GatewayCall::GetTopic(id.clone());
        self.answer(call, "get_topic", |s| &mut s.get_topic).await
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, GatewayError> {
        let call = GatewayCall::SubmitQuiz(submission.clone());
        self.answer(call, "submit_quiz", |s| &mut s.submit_quiz).await
    }

    async fn get_progress(&self, user: &UserId) -> Result<Vec<ProgressRecord>, GatewayError> {
        let call = GatewayCall::GetProgress(user.clone());
        self.answer(call, "get_progress", |s| &mut s.get_progress)
            .await
    }

    async fn update_progress(
        &self,
        update: &ProgressUpdate,
    ) -> Result<ProgressUpdate, GatewayError> {
        let call = GatewayCall::UpdateProgress(update.clone());
        self.answer(call, "update_progress", |s| &mut s.update_progress)
            .await
    }

    async fn get_recommendations(&self, user: &UserId) -> Result<Recommendations, GatewayError> {
        let call = GatewayCall::GetRecommendations(user.clone());
        self.answer(call, "get_recommendations", |s| {
            &mut s.get_recommendations
        })
        .await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthSession, GatewayError> {
        let call = GatewayCall::Login {
            username: request.username.clone(),
        };
        self.answer(call, "login", |s| &mut s.login).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthSession, GatewayError> {
        let call = GatewayCall::Register {
            username: registration.username.clone(),
        };
        self.answer(call, "register", |s| &mut s.register).await
    }

    async fn start_session(&self, start: &SessionStart) -> Result<SessionStarted, GatewayError> {
        let call = GatewayCall::StartSession(start.topic_id.clone());
        self.answer(call, "start_session", |s| &mut s.start_session)
            .await
    }

    async fn end_session(&self, end: &SessionEnd) -> Result<SessionEnded, GatewayError> {
        let call = GatewayCall::EndSession(end.session_id.clone());
        self.answer(call, "end_session", |s| &mut s.end_session)
            .await
    }

    async fn health(&self) -> Result<HealthStatus, GatewayError> {
        self.answer(GatewayCall::Health, "health", |s| &mut s.health)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::DifficultyLevel;
    use learn_core::time::fixed_now;

    #[tokio::test]
    async fn answers_in_fifo_order_and_logs_calls() {
        let gateway = ScriptedGateway::new();
        let first = Topic::new(TopicId::from(1), "First", DifficultyLevel::Beginner, fixed_now());
        let second = Topic::new(TopicId::from(2), "Second", DifficultyLevel::Beginner, fixed_now());
        gateway
            .push_list_topics(Ok(vec![first.clone()]))
            .push_list_topics(Ok(vec![second.clone()]));

        assert_eq!(gateway.list_topics().await.unwrap(), vec![first]);
        assert_eq!(gateway.list_topics().await.unwrap(), vec![second]);
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::ListTopics, GatewayCall::ListTopics]
        );
    }

    #[tokio::test]
    async fn held_responses_complete_in_release_order() {
        let gateway = Arc::new(ScriptedGateway::new());
        let slow = Topic::new(TopicId::from(1), "Slow", DifficultyLevel::Beginner, fixed_now());
        let fast = Topic::new(TopicId::from(2), "Fast", DifficultyLevel::Beginner, fixed_now());
        let hold_slow = gateway.hold_get_topic(Ok(slow.clone()));
        let hold_fast = gateway.hold_get_topic(Ok(fast.clone()));

        let first = tokio::spawn({
            let gateway = Arc::clone(&gateway);
            async move { gateway.get_topic(&TopicId::from(1)).await }
        });
        while gateway.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let gateway = Arc::clone(&gateway);
            async move { gateway.get_topic(&TopicId::from(2)).await }
        });

        hold_fast.release();
        assert_eq!(second.await.unwrap().unwrap(), fast);
        assert!(!first.is_finished());

        drop(hold_slow);
        assert_eq!(first.await.unwrap().unwrap(), slow);
    }

    #[tokio::test]
    async fn unscripted_calls_fail_with_a_message() {
        let gateway = ScriptedGateway::new();

        let err = gateway.health().await.unwrap_err();

        match err {
            GatewayError::Remote(remote) => {
                assert_eq!(
                    remote.message.as_deref(),
                    Some("no scripted response for health")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
