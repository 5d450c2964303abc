/// Bounded fixed-interval retry around idempotent fetch operations
use crate::error::Result;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Fixed-interval policy. Deliberately no backoff and no jitter: the bound
/// is small and the interval is kept as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1500),
        }
    }
}

/// Observable state of a guarded operation. `Exhausted` is recoverable:
/// the next run starts a fresh attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    Running { attempt: u32 },
    Exhausted,
}

pub struct RetryController {
    policy: RetryPolicy,
    state: Mutex<RetryState>,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(RetryState::Idle),
        }
    }

    pub fn state(&self) -> RetryState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: RetryState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Invoke `op` up to `max_attempts` times, sleeping the fixed delay
    /// between attempts, and surface the final error.
    ///
    /// Every call is a fresh attempt run: calling again after exhaustion
    /// is the manual "retry now" and restarts at attempt 1. Non-retryable
    /// errors surface immediately without consuming further attempts.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            self.set_state(RetryState::Running { attempt });

            match op().await {
                Ok(value) => {
                    self.set_state(RetryState::Idle);
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => {
                    self.set_state(RetryState::Idle);
                    return Err(err);
                }
                Err(err) if attempt >= max => {
                    warn!("giving up after {} attempts: {}", attempt, err);
                    self.set_state(RetryState::Exhausted);
                    return Err(err);
                }
                Err(err) => {
                    debug!(
                        "attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, max, err, self.policy.delay
                    );
                    sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
