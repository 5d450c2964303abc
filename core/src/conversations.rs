/// Conversation list: one row per peer, most recent message wins
///
/// The aggregator owns the summary set for the signed-in identity. It is
/// recomputed wholesale from the full bidirectional message collection on
/// every relevant refresh — no incremental patching. Message volume per
/// identity is bounded, so simplicity wins over efficiency here.
use crate::config::Config;
use crate::error::{ChatError, Result};
use crate::gateway::{MessageGateway, ProfileDirectory};
use crate::retry::{RetryController, RetryState};
use crate::session::Session;
use crate::types::{ConversationSummary, LoadPhase, MessageRecord};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub struct ConversationAggregator {
    session: Session,
    gateway: Arc<dyn MessageGateway>,
    directory: Arc<dyn ProfileDirectory>,
    retry: RetryController,
    inner: RwLock<Inner>,
}

struct Inner {
    summaries: Vec<ConversationSummary>,
    phase: LoadPhase,
    epoch: u64,
}

impl ConversationAggregator {
    pub fn new(
        session: Session,
        gateway: Arc<dyn MessageGateway>,
        directory: Arc<dyn ProfileDirectory>,
        config: &Config,
    ) -> Self {
        Self {
            session,
            gateway,
            directory,
            retry: RetryController::new(config.list_retry_policy()),
            inner: RwLock::new(Inner {
                summaries: Vec::new(),
                phase: LoadPhase::Loading,
                epoch: 0,
            }),
        }
    }

    /// Rebuild the whole summary set from the message collection.
    ///
    /// Transient fetch failures are retried up to the configured bound
    /// (fixed interval), then surfaced for a manual-retry affordance. An
    /// invalid session surfaces immediately and is never retried. A run
    /// that finishes after a newer refresh started publishes nothing.
    pub async fn refresh(&self) -> Result<()> {
        self.session.require_valid()?;

        let epoch = {
            let mut inner = self.inner.write().await;
            inner.phase = LoadPhase::Loading;
            inner.epoch += 1;
            inner.epoch
        };

        let self_id = self.session.user_id.clone();
        let records = match self
            .retry
            .run(|| self.gateway.list_involving(&self_id))
            .await
        {
            Ok(records) => records,
            Err(err) => {
                if matches!(err, ChatError::SessionInvalid) {
                    self.session.invalidate();
                }
                let mut inner = self.inner.write().await;
                if inner.epoch == epoch {
                    inner.phase = LoadPhase::Failed;
                }
                return Err(err);
            }
        };

        let mut summaries = Vec::new();
        for record in latest_per_peer(&records, &self_id) {
            let message = &record.message;
            let peer_id = match message.peer_of(&self_id) {
                Some(peer_id) => peer_id.to_string(),
                None => continue,
            };

            // Embedded expansion first, individual lookup second. A peer
            // we cannot resolve is omitted rather than rendered broken.
            let peer_profile = match record.peer_profile(&self_id) {
                Some(profile) => profile.clone(),
                None => match self.directory.profile(&peer_id).await {
                    Ok(profile) => profile,
                    Err(err) => {
                        warn!("omitting conversation with {}: {}", peer_id, err);
                        continue;
                    }
                },
            };

            summaries.push(ConversationSummary {
                peer_id,
                peer_profile,
                last_message_text: message.text.clone(),
                last_message_at: message.created_at,
                last_message_from_me: message.sender_id == self_id,
            });
        }

        let mut inner = self.inner.write().await;
        if inner.epoch != epoch {
            debug!("discarding stale conversation refresh");
            return Ok(());
        }
        inner.summaries = summaries;
        inner.phase = LoadPhase::Ready;
        Ok(())
    }

    /// Manual "retry now": always a fresh attempt run, even right after
    /// exhaustion.
    pub async fn retry_now(&self) -> Result<()> {
        self.refresh().await
    }

    /// Retry progress of the list fetch, for the error affordance.
    pub fn retry_state(&self) -> RetryState {
        self.retry.state()
    }

    pub async fn snapshot(&self) -> (LoadPhase, Vec<ConversationSummary>) {
        let inner = self.inner.read().await;
        (inner.phase, inner.summaries.clone())
    }
}

/// Single pass over a descending-time message list: the first message seen
/// for a peer is that conversation's most recent one, so descending input
/// order is a correctness requirement, not presentation. Output is already
/// in recency order; no secondary sort.
pub fn latest_per_peer<'a>(
    records: &'a [MessageRecord],
    self_id: &str,
) -> Vec<&'a MessageRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut latest = Vec::new();

    for record in records {
        let peer_id = match record.message.peer_of(self_id) {
            Some(peer_id) => peer_id,
            None => continue,
        };
        if seen.insert(peer_id) {
            latest.push(record);
        }
    }

    latest
}
