use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::{QuestionId, TopicId};
use crate::model::percent::Percent;

/// Answers chosen for a topic's quiz, keyed by question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSubmission {
    pub topic_id: TopicId,
    pub answers: BTreeMap<QuestionId, String>,
}

impl QuizSubmission {
    #[must_use]
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            answers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn answer(mut self, question: QuestionId, choice: impl Into<String>) -> Self {
        self.answers.insert(question, choice.into());
        self
    }
}

/// Grading detail for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Outcome of the most recent quiz submission. Never persisted client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: Percent,
    pub correct_answers: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub results: Vec<QuestionResult>,
}

impl QuizResult {
    #[must_use]
    pub fn incorrect(&self) -> impl Iterator<Item = &QuestionResult> {
        self.results.iter().filter(|r| !r.is_correct)
    }
}
