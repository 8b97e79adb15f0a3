use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::UserId;
use crate::model::topic::DifficultyLevel;

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub learning_level: DifficultyLevel,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("learning_level", &self.learning_level)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub learning_level: DifficultyLevel,
}

/// A signed-in user and the bearer token issued for them.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: UserProfile,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_secrets() {
        let login = LoginRequest {
            username: "ada".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{login:?}");
        assert!(rendered.contains("ada"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn decodes_login_response() {
        let json = r#"{
            "message": "Login successful",
            "access_token": "abc.def",
            "user": {"id": 1, "username": "ada", "email": "ada@example.com", "learning_level": "advanced"}
        }"#;

        let session: AuthSession = serde_json::from_str(json).unwrap();

        assert_eq!(session.user.id, UserId::from(1));
        assert_eq!(session.user.learning_level, DifficultyLevel::Advanced);
        assert!(!format!("{session:?}").contains("abc.def"));
    }
}
