use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suggested next topics. Always replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendations {
    /// Suggested topic titles, in the order the server ranked them.
    #[serde(rename = "recommendations", default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub user_topics: Vec<String>,
    /// Quiz score per studied topic title.
    #[serde(default)]
    pub performance_summary: BTreeMap<String, f64>,
}

impl Recommendations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
