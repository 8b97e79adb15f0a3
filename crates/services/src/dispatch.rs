//! Wraps gateway calls in a `Started` / terminal lifecycle applied to the store.
//!
//! Dispatching applies `Started` immediately and spawns the gateway call onto
//! the runtime, so the operation runs to its single terminal phase whether or
//! not anyone awaits the returned [`OperationHandle`]. Independent operations
//! may finish in any order; the store applies whichever terminal phase
//! arrives, so the last operation to finish wins.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use gateway::{GatewayError, LearningApi};
use learn_core::model::{
    NewTopic, ProgressRecord, ProgressUpdate, QuizResult, QuizSubmission, Recommendations,
    Topic, TopicId, UserId,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::OperationError;
use crate::store::{LearningStore, StoreEvent};

/// Lifecycle of one dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<T> {
    Started,
    Succeeded(T),
    Failed(OperationError),
}

/// The operations whose lifecycle is tracked in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTopic,
    FetchUserTopics,
    FetchTopic,
    SubmitQuiz,
    FetchUserProgress,
    UpdateProgress,
    FetchRecommendations,
}

impl Operation {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateTopic => "topics/createTopic",
            Operation::FetchUserTopics => "topics/fetchUserTopics",
            Operation::FetchTopic => "topics/fetchTopic",
            Operation::SubmitQuiz => "progress/submitQuiz",
            Operation::FetchUserProgress => "progress/fetchUserProgress",
            Operation::UpdateProgress => "progress/updateProgress",
            Operation::FetchRecommendations => "progress/fetchRecommendations",
        }
    }

    /// Message surfaced when the server does not explain a failure.
    #[must_use]
    pub fn default_failure(self) -> &'static str {
        match self {
            Operation::CreateTopic => "Failed to create topic",
            Operation::FetchUserTopics => "Failed to fetch topics",
            Operation::FetchTopic => "Failed to fetch topic",
            Operation::SubmitQuiz => "Failed to submit quiz",
            Operation::FetchUserProgress => "Failed to fetch progress",
            Operation::UpdateProgress => "Failed to update progress",
            Operation::FetchRecommendations => "Failed to fetch recommendations",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pending result of a dispatched operation.
///
/// The operation is already running when the handle is returned. Dropping the
/// handle, or abandoning it under a timeout, only discards the result; the
/// terminal phase still reaches the store. Operations cannot be cancelled.
pub struct OperationHandle<T> {
    operation: Operation,
    join: JoinHandle<Result<T, OperationError>>,
}

impl<T> OperationHandle<T> {
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Whether the terminal phase has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl<T> Future for OperationHandle<T> {
    type Output = Result<T, OperationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let operation = self.operation;
        self.join.poll_unpin(cx).map(|joined| {
            joined.unwrap_or_else(|err| {
                warn!(operation = operation.name(), error = %err, "operation task did not complete");
                Err(OperationError::Remote(operation.default_failure().to_owned()))
            })
        })
    }
}

impl<T> fmt::Debug for OperationHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("operation", &self.operation)
            .field("finished", &self.join.is_finished())
            .finish()
    }
}

/// Executes gateway operations and feeds their lifecycle into a store.
///
/// # Panics
///
/// Every dispatch method spawns a task and panics outside a Tokio runtime.
#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn LearningApi>,
    store: LearningStore,
}

impl Dispatcher {
    #[must_use]
    pub fn new(gateway: Arc<dyn LearningApi>, store: LearningStore) -> Self {
        Self { gateway, store }
    }

    #[must_use]
    pub fn store(&self) -> &LearningStore {
        &self.store
    }

    pub fn create_topic(&self, topic: NewTopic) -> OperationHandle<Topic> {
        self.run(
            Operation::CreateTopic,
            StoreEvent::CreateTopic,
            move |api| async move { api.create_topic(&topic).await },
        )
    }

    pub fn fetch_user_topics(&self) -> OperationHandle<Vec<Topic>> {
        self.run(
            Operation::FetchUserTopics,
            StoreEvent::FetchUserTopics,
            |api| async move { api.list_topics().await },
        )
    }

    pub fn fetch_topic(&self, id: TopicId) -> OperationHandle<Topic> {
        self.run(
            Operation::FetchTopic,
            StoreEvent::FetchTopic,
            move |api| async move { api.get_topic(&id).await },
        )
    }

    pub fn submit_quiz(&self, submission: QuizSubmission) -> OperationHandle<QuizResult> {
        self.run(
            Operation::SubmitQuiz,
            StoreEvent::SubmitQuiz,
            move |api| async move { api.submit_quiz(&submission).await },
        )
    }

    pub fn fetch_user_progress(&self, user: UserId) -> OperationHandle<Vec<ProgressRecord>> {
        self.run(
            Operation::FetchUserProgress,
            StoreEvent::FetchUserProgress,
            move |api| async move { api.get_progress(&user).await },
        )
    }

    pub fn update_progress(&self, update: ProgressUpdate) -> OperationHandle<ProgressUpdate> {
        self.run(
            Operation::UpdateProgress,
            StoreEvent::UpdateProgress,
            move |api| async move { api.update_progress(&update).await },
        )
    }

    pub fn fetch_recommendations(&self, user: UserId) -> OperationHandle<Recommendations> {
        self.run(
            Operation::FetchRecommendations,
            StoreEvent::FetchRecommendations,
            move |api| async move { api.get_recommendations(&user).await },
        )
    }

    fn run<T, F, Fut>(
        &self,
        operation: Operation,
        event: fn(Phase<T>) -> StoreEvent,
        call: F,
    ) -> OperationHandle<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce(Arc<dyn LearningApi>) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        debug!(operation = operation.name(), "operation started");
        self.store.apply(event(Phase::Started));

        let store = self.store.clone();
        let call = call(Arc::clone(&self.gateway));
        let join = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result
                    .map_err(|err| OperationError::from_gateway(err, operation.default_failure())),
                Err(_) => {
                    warn!(operation = operation.name(), "gateway call panicked");
                    Err(OperationError::Remote(operation.default_failure().to_owned()))
                }
            };
            match &outcome {
                Ok(payload) => {
                    debug!(operation = operation.name(), "operation succeeded");
                    store.apply(event(Phase::Succeeded(payload.clone())));
                }
                Err(err) => {
                    warn!(operation = operation.name(), error = %err, "operation failed");
                    store.apply(event(Phase::Failed(err.clone())));
                }
            }
            outcome
        });

        OperationHandle { operation, join }
    }
}
