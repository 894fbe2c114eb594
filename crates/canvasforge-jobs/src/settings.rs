//! Job configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits and credentials for provider jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// Maximum number of jobs in flight across all providers.
    pub max_concurrent_jobs: usize,
    /// Delay between two polls, in seconds.
    pub poll_interval_secs: u64,
    /// Give up polling this long after submission, in seconds.
    pub poll_timeout_secs: u64,
    /// Provider credential. Dispatch is rejected while it is blank.
    pub api_key: Option<String>,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 10,
            poll_interval_secs: 5,
            poll_timeout_secs: 180,
            api_key: None,
        }
    }
}

impl JobSettings {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// The API key, if set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
