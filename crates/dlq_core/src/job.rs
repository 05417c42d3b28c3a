use std::fmt;

use serde::{Deserialize, Serialize};

/// One unit of work: the URL to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(String);

impl Job {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Loose correlation between a completed file's basename and this job.
    pub fn matches_token(&self, token: &str) -> bool {
        self.0.contains(token)
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Job {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Job {
    fn from(url: String) -> Self {
        Self(url)
    }
}
