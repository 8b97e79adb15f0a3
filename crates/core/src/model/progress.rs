use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::ids::TopicId;
use crate::model::percent::Percent;

/// A learner's standing on one topic. There is at most one per `topic_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub topic_id: TopicId,
    #[serde(default)]
    pub topic_title: Option<String>,
    #[serde(default)]
    pub completion_percentage: Percent,
    #[serde(default)]
    pub quiz_score: Percent,
    /// Minutes.
    #[serde(default)]
    pub time_spent: u32,
    #[serde(default)]
    pub last_accessed: Option<NaiveDateTime>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        topic_id: TopicId,
        quiz_score: Percent,
        time_spent: u32,
        completion_percentage: Percent,
    ) -> Self {
        Self {
            topic_id,
            topic_title: None,
            completion_percentage,
            quiz_score,
            time_spent,
            last_accessed: None,
        }
    }
}

/// Partial update for a progress record. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub topic_id: TopicId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u32>,
}

impl ProgressUpdate {
    #[must_use]
    pub fn for_topic(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            completion_percentage: None,
            quiz_score: None,
            time_spent: None,
        }
    }

    #[must_use]
    pub fn completion(mut self, value: Percent) -> Self {
        self.completion_percentage = Some(value);
        self
    }

    #[must_use]
    pub fn quiz_score(mut self, value: Percent) -> Self {
        self.quiz_score = Some(value);
        self
    }

    #[must_use]
    pub fn time_spent(mut self, minutes: u32) -> Self {
        self.time_spent = Some(minutes);
        self
    }

    /// True when the update carries no field besides the topic id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completion_percentage.is_none() && self.quiz_score.is_none() && self.time_spent.is_none()
    }
}
