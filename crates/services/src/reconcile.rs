//! Cross-slice patches applied when one operation's result touches state
//! owned by another resource kind, plus read-only statistics over progress.
//!
//! Every function here runs inside a single store transition, so consumers
//! never observe a half-applied patch.

use learn_core::model::{ProgressRecord, ProgressUpdate, Topic, TopicId, TopicProgress};
use thiserror::Error;
use tracing::debug;

use crate::store::TopicsData;

/// A progress update whose topic has no cached record.
///
/// The record stays absent until the next bulk progress fetch; nothing is
/// inserted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no cached progress record for topic {topic_id}")]
pub struct MergeMiss {
    pub topic_id: TopicId,
}

/// Put a freshly created topic at the head of the list and select it.
pub fn insert_created_topic(topics: &mut TopicsData, topic: Topic) {
    topics.current = Some(topic.clone());
    topics.list.insert(0, topic);
}

/// Shallow-merge `update` into the record with the same `topic_id`. Only the
/// fields present in the update change.
///
/// # Errors
///
/// Returns [`MergeMiss`] when no record matches; `records` is left untouched.
pub fn merge_progress_update(
    records: &mut [ProgressRecord],
    update: &ProgressUpdate,
) -> Result<(), MergeMiss> {
    let record = records
        .iter_mut()
        .find(|record| record.topic_id == update.topic_id)
        .ok_or_else(|| MergeMiss {
            topic_id: update.topic_id.clone(),
        })?;

    if let Some(completion) = update.completion_percentage {
        record.completion_percentage = completion;
    }
    if let Some(score) = update.quiz_score {
        record.quiz_score = score;
    }
    if let Some(minutes) = update.time_spent {
        record.time_spent = minutes;
    }
    Ok(())
}

/// Patch the embedded progress snapshot of every cached copy of the updated
/// topic (list entries and the current selection).
///
/// A topic that was never started only gains a snapshot when the update says
/// how far along it is.
pub fn patch_topic_progress(topics: &mut TopicsData, update: &ProgressUpdate) {
    for topic in cached_copies(topics, &update.topic_id) {
        let Some(snapshot) = topic.progress.as_mut() else {
            topic.progress = update.completion_percentage.map(|completion| TopicProgress {
                completion_percentage: completion,
                quiz_score: update.quiz_score,
                time_spent: update.time_spent,
            });
            continue;
        };
        if let Some(completion) = update.completion_percentage {
            snapshot.completion_percentage = completion;
        }
        if update.quiz_score.is_some() {
            snapshot.quiz_score = update.quiz_score;
        }
        if update.time_spent.is_some() {
            snapshot.time_spent = update.time_spent;
        }
    }
}

/// Replace the progress snapshot of the cached topic `topic_id`. Returns
/// whether any cached copy matched.
pub fn attach_topic_progress(
    topics: &mut TopicsData,
    topic_id: &TopicId,
    progress: TopicProgress,
) -> bool {
    let mut matched = false;
    for topic in cached_copies(topics, topic_id) {
        topic.progress = Some(progress);
        matched = true;
    }
    matched
}

/// Reconcile a confirmed progress update into both the progress collection
/// and the topics that embed a snapshot of it.
pub fn apply_progress_update(
    records: &mut [ProgressRecord],
    topics: &mut TopicsData,
    update: &ProgressUpdate,
) {
    if let Err(miss) = merge_progress_update(records, update) {
        debug!(topic_id = %miss.topic_id, "progress update matched no cached record");
    }
    patch_topic_progress(topics, update);
}

fn cached_copies<'a>(
    topics: &'a mut TopicsData,
    topic_id: &'a TopicId,
) -> impl Iterator<Item = &'a mut Topic> + 'a {
    topics
        .list
        .iter_mut()
        .chain(topics.current.iter_mut())
        .filter(move |topic| topic.id == *topic_id)
}

/// Aggregates derived from the progress collection on demand.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressStats {
    pub total_topics: usize,
    /// Mean quiz score; 0 when there are no records.
    pub average_score: f64,
    /// Minutes.
    pub total_time: u64,
}

impl ProgressStats {
    #[must_use]
    pub fn from_records(records: &[ProgressRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let score_sum: f64 = records.iter().map(|r| r.quiz_score.value()).sum();
        Self {
            total_topics: records.len(),
            average_score: score_sum / records.len() as f64,
            total_time: records.iter().map(|r| u64::from(r.time_spent)).sum(),
        }
    }
}
