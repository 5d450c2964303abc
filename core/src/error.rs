/// Error types for the sync core
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Profile resolution failed: {0}")]
    ProfileResolution(String),

    #[error("Session is no longer valid")]
    SessionInvalid,

    #[error("Subscription error: {0}")]
    Subscription(String),
}

impl ChatError {
    /// Transient failures may be retried; terminal ones must surface at once.
    /// An invalid session requires re-authentication, not another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChatError::Fetch(_))
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
