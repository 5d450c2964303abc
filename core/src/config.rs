/// Configuration management
use crate::retry::RetryPolicy;
use std::time::Duration;

/// Sync-core tunables
#[derive(Debug, Clone)]
pub struct Config {
    /// Automatic retry bound for the conversation-list fetch
    pub list_retry_attempts: u32,

    /// Fixed delay between retry attempts (no backoff)
    pub list_retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            list_retry_attempts: 3,
            list_retry_delay: Duration::from_millis(1500),
        }
    }
}

impl Config {
    pub fn list_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.list_retry_attempts,
            delay: self.list_retry_delay,
        }
    }
}
