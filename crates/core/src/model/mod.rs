mod auth;
mod ids;
mod percent;
mod progress;
mod quiz;
mod recommendation;
mod session;
mod topic;

pub use auth::{AuthSession, HealthStatus, LoginRequest, Registration, UserProfile};
pub use ids::{ParseIdError, QuestionId, SessionId, TopicId, UserId};
pub use percent::{Percent, PercentError};
pub use progress::{ProgressRecord, ProgressUpdate};
pub use quiz::{QuestionResult, QuizResult, QuizSubmission};
pub use recommendation::Recommendations;
pub use session::{SessionEnd, SessionEnded, SessionStart, SessionStarted};
pub use topic::{
    DifficultyLevel, NewTopic, ParseDifficultyError, Quiz, Topic, TopicContent, TopicProgress,
};
