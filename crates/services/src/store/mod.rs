//! Single source of truth for cached learning state.
//!
//! State is published as immutable `Arc<LearningState>` snapshots over a
//! `tokio::sync::watch` channel. Each event is reduced against a
//! copy-on-write clone of the current snapshot and published in one step, so
//! readers never see a partially applied event.

mod slice;

pub use slice::Slice;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use learn_core::model::{
    ProgressRecord, ProgressUpdate, QuizResult, Recommendations, Topic, TopicId, TopicProgress,
};
use tokio::sync::watch;
use tracing::debug;

use crate::dispatch::Phase;
use crate::error::OperationError;
use crate::reconcile::{self, ProgressStats};
use slice::Track;

/// Topic listing plus the topic currently selected for viewing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopicsData {
    /// Most recent first after a creation.
    pub list: Vec<Topic>,
    pub current: Option<Topic>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LearningState {
    pub topics: Slice<TopicsData>,
    pub progress: Slice<Vec<ProgressRecord>>,
    pub recommendations: Slice<Recommendations>,
    /// Most recent quiz result only.
    pub quiz: Slice<Option<QuizResult>>,
    /// The credential was rejected; a fresh login is required.
    pub auth_expired: bool,
}

impl LearningState {
    #[must_use]
    pub fn is_creating_topic(&self) -> bool {
        self.topics.mutating
    }

    #[must_use]
    pub fn is_submitting_quiz(&self) -> bool {
        self.quiz.mutating
    }

    #[must_use]
    pub fn is_updating_progress(&self) -> bool {
        self.progress.mutating
    }

    /// Statistics derived from the progress slice. Never stored.
    #[must_use]
    pub fn stats(&self) -> ProgressStats {
        ProgressStats::from_records(&self.progress.data)
    }

    #[must_use]
    pub fn error(&self, kind: SliceKind) -> Option<&str> {
        match kind {
            SliceKind::Topics => self.topics.error.as_deref(),
            SliceKind::Progress => self.progress.error.as_deref(),
            SliceKind::Recommendations => self.recommendations.error.as_deref(),
            SliceKind::Quiz => self.quiz.error.as_deref(),
        }
    }

    fn error_mut(&mut self, kind: SliceKind) -> &mut Option<String> {
        match kind {
            SliceKind::Topics => &mut self.topics.error,
            SliceKind::Progress => &mut self.progress.error,
            SliceKind::Recommendations => &mut self.recommendations.error,
            SliceKind::Quiz => &mut self.quiz.error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceKind {
    Topics,
    Progress,
    Recommendations,
    Quiz,
}

/// Everything that can change the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    CreateTopic(Phase<Topic>),
    FetchUserTopics(Phase<Vec<Topic>>),
    FetchTopic(Phase<Topic>),
    SubmitQuiz(Phase<QuizResult>),
    FetchUserProgress(Phase<Vec<ProgressRecord>>),
    UpdateProgress(Phase<ProgressUpdate>),
    FetchRecommendations(Phase<Recommendations>),
    ClearError(SliceKind),
    ClearCurrentTopic,
    SetQuizResult(QuizResult),
    ClearQuizResult,
    SetTopicProgress {
        topic_id: TopicId,
        progress: TopicProgress,
    },
    AcknowledgeAuthExpired,
}

struct StoreInner {
    sender: Mutex<Option<watch::Sender<Arc<LearningState>>>>,
    receiver: watch::Receiver<Arc<LearningState>>,
}

/// Owned handle to the learning state. Clones share the same store.
#[derive(Clone)]
pub struct LearningStore {
    inner: Arc<StoreInner>,
}

impl LearningStore {
    #[must_use]
    pub fn create() -> Self {
        let (sender, receiver) = watch::channel(Arc::new(LearningState::default()));
        Self {
            inner: Arc::new(StoreInner {
                sender: Mutex::new(Some(sender)),
                receiver,
            }),
        }
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<LearningState> {
        Arc::clone(&*self.inner.receiver.borrow())
    }

    /// Receiver that observes every snapshot published after this call;
    /// the current one counts as seen. Its `changed()` fails once the store
    /// is disposed.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<LearningState>> {
        match self.sender().as_ref() {
            Some(sender) => sender.subscribe(),
            None => self.inner.receiver.clone(),
        }
    }

    /// Reduce `event` into a new snapshot. Returns `false` when the store has
    /// been disposed and the event was dropped.
    pub fn apply(&self, event: StoreEvent) -> bool {
        self.modify(|state| reduce(state, event)).is_some()
    }

    pub fn clear_error(&self, kind: SliceKind) {
        self.apply(StoreEvent::ClearError(kind));
    }

    /// Return the slice's error and clear it in the same transition, so it
    /// surfaces exactly once.
    pub fn take_error(&self, kind: SliceKind) -> Option<String> {
        if self.snapshot().error(kind).is_none() {
            return None;
        }
        self.modify(|state| state.error_mut(kind).take()).flatten()
    }

    /// Stop accepting events. Subscribers see the channel close once the
    /// last snapshot has been read.
    pub fn dispose(&self) {
        if self.sender().take().is_some() {
            debug!("learning store disposed");
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.sender().is_none()
    }

    fn modify<R>(&self, f: impl FnOnce(&mut LearningState) -> R) -> Option<R> {
        let guard = self.sender();
        let Some(sender) = guard.as_ref() else {
            debug!("learning store disposed; dropping event");
            return None;
        };
        let mut out = None;
        sender.send_modify(|state| out = Some(f(Arc::make_mut(state))));
        out
    }

    fn sender(&self) -> MutexGuard<'_, Option<watch::Sender<Arc<LearningState>>>> {
        self.inner
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LearningStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningStore")
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Apply the lifecycle part of `phase` to `slice` and hand back the success
/// payload, if any.
fn settle<D, T>(
    slice: &mut Slice<D>,
    auth_expired: &mut bool,
    track: Track,
    phase: Phase<T>,
) -> Option<T> {
    match phase {
        Phase::Started => {
            slice.begin(track);
            None
        }
        Phase::Succeeded(payload) => {
            slice.finish(track);
            Some(payload)
        }
        Phase::Failed(OperationError::AuthExpired) => {
            slice.finish(track);
            *auth_expired = true;
            None
        }
        Phase::Failed(OperationError::Remote(message)) => {
            slice.fail(track, message);
            None
        }
    }
}

fn reduce(state: &mut LearningState, event: StoreEvent) {
    let expired = &mut state.auth_expired;
    match event {
        StoreEvent::CreateTopic(phase) => {
            if let Some(topic) = settle(&mut state.topics, expired, Track::Mutation, phase) {
                reconcile::insert_created_topic(&mut state.topics.data, topic);
            }
        }
        StoreEvent::FetchUserTopics(phase) => {
            if let Some(list) = settle(&mut state.topics, expired, Track::Fetch, phase) {
                state.topics.data.list = list;
            }
        }
        StoreEvent::FetchTopic(phase) => {
            if let Some(topic) = settle(&mut state.topics, expired, Track::Fetch, phase) {
                state.topics.data.current = Some(topic);
            }
        }
        StoreEvent::SubmitQuiz(phase) => {
            if let Some(result) = settle(&mut state.quiz, expired, Track::Mutation, phase) {
                state.quiz.data = Some(result);
            }
        }
        StoreEvent::FetchUserProgress(phase) => {
            if let Some(records) = settle(&mut state.progress, expired, Track::Fetch, phase) {
                state.progress.data = records;
            }
        }
        StoreEvent::UpdateProgress(phase) => {
            if let Some(update) = settle(&mut state.progress, expired, Track::Mutation, phase) {
                reconcile::apply_progress_update(
                    &mut state.progress.data,
                    &mut state.topics.data,
                    &update,
                );
            }
        }
        StoreEvent::FetchRecommendations(phase) => {
            if let Some(recs) = settle(&mut state.recommendations, expired, Track::Fetch, phase)
            {
                state.recommendations.data = recs;
            }
        }
        StoreEvent::ClearError(kind) => *state.error_mut(kind) = None,
        StoreEvent::ClearCurrentTopic => state.topics.data.current = None,
        StoreEvent::SetQuizResult(result) => state.quiz.data = Some(result),
        StoreEvent::ClearQuizResult => state.quiz.data = None,
        StoreEvent::SetTopicProgress { topic_id, progress } => {
            if !reconcile::attach_topic_progress(&mut state.topics.data, &topic_id, progress) {
                debug!(%topic_id, "progress snapshot for uncached topic ignored");
            }
        }
        StoreEvent::AcknowledgeAuthExpired => state.auth_expired = false,
    }
}
