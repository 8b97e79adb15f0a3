//! Envelopes the server wraps around resource payloads.

use learn_core::model::{ProgressRecord, Topic};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TopicEnvelope {
    pub topic: Topic,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicsEnvelope {
    #[serde(default)]
    pub topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressEnvelope {
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
}

/// Body of any non-success response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
