/// Process-scoped authenticated identity
///
/// One signed-in identity per running instance. The session object is
/// passed explicitly to each component constructor; nothing reads it from
/// a global. Invalidation is sticky and shared across all clones, so every
/// view observes the logout at its next operation.
use crate::error::{ChatError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub avatar: Option<String>,
    valid: Arc<AtomicBool>,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        avatar: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            avatar,
            valid: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    /// Mark the session terminated. The owning application reacts by
    /// starting its re-authentication flow.
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }

    pub fn require_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ChatError::SessionInvalid)
        }
    }
}
