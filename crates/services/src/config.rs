use std::env;
use std::time::Duration;

use learn_core::model::UserId;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the learning platform API.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    /// Initial bearer token, e.g. from a previous login.
    pub token: Option<String>,
    /// User whose progress and recommendations are fetched.
    pub user_id: Option<UserId>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: None,
            user_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read `LEARN_API_URL`, `LEARN_API_TOKEN`, `LEARN_USER_ID` and
    /// `LEARN_API_TIMEOUT_SECS`, falling back to defaults for unset values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a set value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();
        if let Some(base_url) = set("LEARN_API_URL") {
            config.base_url = base_url;
        }
        config.token = set("LEARN_API_TOKEN");
        if let Some(raw) = set("LEARN_USER_ID") {
            config.user_id = Some(
                raw.parse()
                    .map_err(|_| ConfigError::InvalidUserId { raw: raw.clone() })?,
            );
        }
        if let Some(raw) = set("LEARN_API_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout { raw: raw.clone() })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
