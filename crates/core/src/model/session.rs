use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::ids::{SessionId, TopicId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStart {
    pub topic_id: TopicId,
}

/// Confirmation returned when a study session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEnd {
    pub session_id: SessionId,
    pub activities_completed: u32,
}

/// Totals reported when a study session is closed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionEnded {
    /// Minutes, as computed by the server.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub activities_completed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_session_lifecycle_payloads() {
        let started: SessionStarted = serde_json::from_str(
            r#"{"message": "Session started", "session_id": 9, "start_time": "2024-05-01T10:00:00"}"#,
        )
        .unwrap();
        let ended: SessionEnded = serde_json::from_str(
            r#"{"message": "Session ended", "duration": 25, "activities_completed": 3}"#,
        )
        .unwrap();

        assert_eq!(started.session_id, SessionId::from(9));
        assert_eq!(ended.duration, Some(25));
        assert_eq!(ended.activities_completed, 3);
    }
}
