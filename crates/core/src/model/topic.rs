use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::ids::{QuestionId, TopicId};
use crate::model::percent::Percent;

/// How demanding a topic's generated material is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDifficultyError(String);

impl fmt::Display for ParseDifficultyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown difficulty level `{}` (expected beginner, intermediate or advanced)",
            self.0
        )
    }
}

impl std::error::Error for ParseDifficultyError {}

impl FromStr for DifficultyLevel {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Generated learning material attached to a topic.
///
/// Every field may be missing: listings omit content entirely and generation
/// can return partial documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicContent {
    pub summary: Option<String>,
    pub key_concepts: Option<Vec<String>>,
    pub learning_objectives: Option<Vec<String>>,
    pub next_topics: Option<Vec<String>>,
    /// Minutes. Generated content reports it as a number or a numeric
    /// string; anything unreadable decodes as unknown.
    #[serde(deserialize_with = "minutes_from_wire")]
    pub estimated_duration: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireMinutes {
    Whole(u64),
    Fraction(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn minutes_from_wire<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = match Option::<WireMinutes>::deserialize(deserializer)? {
        Some(WireMinutes::Whole(value)) => u32::try_from(value).ok(),
        Some(WireMinutes::Fraction(value)) => round_minutes(value),
        Some(WireMinutes::Text(text)) => {
            let text = text.trim();
            text.parse::<u32>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(round_minutes))
        }
        Some(WireMinutes::Other(_)) | None => None,
    };
    Ok(minutes)
}

fn round_minutes(value: f64) -> Option<u32> {
    let rounded = value.round();
    (rounded.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&rounded))
        .then(|| rounded as u32)
}

/// Progress snapshot embedded in a topic listing.
///
/// A topic without a snapshot has never been started; that is distinct from
/// a snapshot at 0%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub completion_percentage: Percent,
    #[serde(default)]
    pub quiz_score: Option<Percent>,
    #[serde(default)]
    pub time_spent: Option<u32>,
}

impl TopicProgress {
    #[must_use]
    pub fn new(completion_percentage: Percent) -> Self {
        Self {
            completion_percentage,
            quiz_score: None,
            time_spent: None,
        }
    }
}

/// A multiple-choice question generated for a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuestionId,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
    #[serde(default)]
    pub content: TopicContent,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub progress: Option<TopicProgress>,
    /// Only populated when the topic is fetched individually.
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

impl Topic {
    /// Builds a bare topic, mostly useful for fixtures and scripted responses.
    #[must_use]
    pub fn new(
        id: TopicId,
        title: impl Into<String>,
        difficulty_level: DifficultyLevel,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            difficulty_level,
            content: TopicContent::default(),
            created_at,
            progress: None,
            quizzes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: TopicProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Completion percentage, or `None` if the topic was never started.
    #[must_use]
    pub fn completion(&self) -> Option<Percent> {
        self.progress.map(|p| p.completion_percentage)
    }
}

/// Request payload for creating a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTopic {
    pub title: String,
    pub difficulty_level: DifficultyLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTopic {
    #[must_use]
    pub fn new(title: impl Into<String>, difficulty_level: DifficultyLevel) -> Self {
        Self {
            title: title.into(),
            difficulty_level,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_listing_entry_without_content() {
        let json = r#"{
            "id": 3,
            "title": "Rust ownership",
            "description": "",
            "difficulty_level": "intermediate",
            "created_at": "2024-05-01T10:20:30.123456",
            "progress": {"completion_percentage": 40.0, "quiz_score": 75.0, "time_spent": 12}
        }"#;

        let topic: Topic = serde_json::from_str(json).unwrap();

        assert_eq!(topic.id, TopicId::from(3));
        assert_eq!(topic.difficulty_level, DifficultyLevel::Intermediate);
        assert_eq!(topic.content, TopicContent::default());
        assert_eq!(topic.completion().map(Percent::value), Some(40.0));
        assert!(topic.quizzes.is_empty());
    }

    #[test]
    fn null_progress_means_never_started() {
        let json = r#"{
            "id": 4,
            "title": "Lifetimes",
            "difficulty_level": "advanced",
            "created_at": "2024-05-01T10:20:30",
            "progress": null
        }"#;

        let topic: Topic = serde_json::from_str(json).unwrap();
        assert_eq!(topic.completion(), None);
    }

    #[test]
    fn decodes_generated_content_and_quizzes() {
        let json = r#"{
            "id": 5,
            "title": "Traits",
            "difficulty_level": "beginner",
            "created_at": "2024-05-01T10:20:30",
            "content": {
                "summary": "Shared behaviour",
                "key_concepts": ["impl blocks", "generics"],
                "next_topics": null,
                "estimated_duration": 25,
                "quizzes": [{"question": "ignored here"}]
            },
            "quizzes": [{
                "id": 11,
                "question": "What declares shared behaviour?",
                "options": ["trait", "struct"],
                "correct_answer": "trait",
                "explanation": "Traits define behaviour.",
                "difficulty": "medium"
            }]
        }"#;

        let topic: Topic = serde_json::from_str(json).unwrap();

        assert_eq!(topic.content.summary.as_deref(), Some("Shared behaviour"));
        assert_eq!(topic.content.key_concepts.as_ref().map(Vec::len), Some(2));
        assert_eq!(topic.content.next_topics, None);
        assert_eq!(topic.content.estimated_duration, Some(25));
        assert_eq!(topic.quizzes.len(), 1);
        assert_eq!(topic.quizzes[0].id, QuestionId::from(11));
    }

    #[test]
    fn decodes_created_topic_with_string_duration() {
        let json = r#"{
            "id": 7,
            "title": "Rust ownership",
            "description": "Moves and borrows",
            "difficulty_level": "intermediate",
            "created_at": "2024-05-01T10:20:30.123456",
            "content": {
                "summary": "Every value has a single owner.",
                "key_concepts": ["ownership", "borrowing", "lifetimes"],
                "learning_objectives": ["Explain moves", "Use references"],
                "quizzes": [{
                    "question": "What happens on assignment of a String?",
                    "options": ["copy", "move"],
                    "correct_answer": "move",
                    "explanation": "String is not Copy.",
                    "difficulty": "easy"
                }],
                "next_topics": ["Lifetimes"],
                "estimated_duration": "30"
            },
            "progress": null
        }"#;

        let topic: Topic = serde_json::from_str(json).unwrap();

        assert_eq!(topic.content.estimated_duration, Some(30));
        assert_eq!(topic.content.learning_objectives.as_ref().map(Vec::len), Some(2));
        assert_eq!(topic.content.next_topics, Some(vec!["Lifetimes".to_string()]));
        assert!(topic.quizzes.is_empty());
    }

    #[test]
    fn unreadable_duration_decodes_as_unknown() {
        let decode = |duration: &str| {
            let json = format!(r#"{{"estimated_duration": {duration}}}"#);
            serde_json::from_str::<TopicContent>(&json)
                .unwrap()
                .estimated_duration
        };

        assert_eq!(decode(r#""about half an hour""#), None);
        assert_eq!(decode(r#"" 45 ""#), Some(45));
        assert_eq!(decode("12.6"), Some(13));
        assert_eq!(decode("-5"), None);
        assert_eq!(decode("null"), None);
        assert_eq!(decode(r#"{"min": 20}"#), None);
        assert_eq!(
            serde_json::from_str::<TopicContent>("{}")
                .unwrap()
                .estimated_duration,
            None
        );
    }

    #[test]
    fn new_topic_omits_missing_description() {
        let body =
            serde_json::to_value(NewTopic::new("Rust ownership", DifficultyLevel::Intermediate))
                .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"title": "Rust ownership", "difficulty_level": "intermediate"})
        );
    }

    #[test]
    fn parses_difficulty_case_insensitively() {
        assert_eq!(
            "Advanced".parse::<DifficultyLevel>().unwrap(),
            DifficultyLevel::Advanced
        );
        assert!("expert".parse::<DifficultyLevel>().is_err());
    }
}
