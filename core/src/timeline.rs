/// Per-conversation message timeline with optimistic sends
///
/// The store owns the timeline of the single open conversation. State is
/// replaced wholesale on every fetch; pending entries from this session
/// ride on top of the latest snapshot until their confirmation arrives.
use crate::error::{ChatError, Result};
use crate::gateway::{MessageDraft, MessageGateway};
use crate::session::Session;
use crate::types::{
    LoadPhase, Message, PendingId, PendingMessage, PendingState, TimelineEntry, TimelineItem,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub struct MessageStore {
    session: Session,
    gateway: Arc<dyn MessageGateway>,
    inner: RwLock<Inner>,
}

struct Inner {
    peer_id: Option<String>,
    entries: Vec<TimelineEntry>,
    phase: LoadPhase,
    /// Bumped on every `open`; a fetch publishes only if the epoch it was
    /// issued under is still current (stale-result suppression).
    epoch: u64,
}

impl MessageStore {
    pub fn new(session: Session, gateway: Arc<dyn MessageGateway>) -> Self {
        Self {
            session,
            gateway,
            inner: RwLock::new(Inner {
                peer_id: None,
                entries: Vec::new(),
                phase: LoadPhase::Loading,
                epoch: 0,
            }),
        }
    }

    /// Switch the open conversation. Clears the visible timeline and
    /// invalidates fetches still in flight for the previous peer.
    pub async fn open(&self, peer_id: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.peer_id = Some(peer_id.into());
        inner.entries.clear();
        inner.phase = LoadPhase::Loading;
        inner.epoch += 1;
    }

    pub async fn open_peer(&self) -> Option<String> {
        self.inner.read().await.peer_id.clone()
    }

    /// Fetch all messages between the current identity and the open peer
    /// (ascending by creation time) and rebuild the timeline: the confirmed
    /// portion comes from the fetch, and every pending entry whose temp id
    /// has not been matched yet is re-appended so an interleaved reload
    /// never drops an in-flight bubble.
    ///
    /// Errors surface immediately; this path is not retried here — a later
    /// realtime event triggers a fresh attempt naturally. Safe to call
    /// right after [`finalize_send`](Self::finalize_send): reconciliation
    /// keeps exactly one row per message either way.
    pub async fn load(&self) -> Result<()> {
        let (peer_id, epoch) = {
            let inner = self.inner.read().await;
            match &inner.peer_id {
                Some(peer_id) => (peer_id.clone(), inner.epoch),
                None => return Ok(()),
            }
        };

        let fetched = match self
            .gateway
            .list_between(&self.session.user_id, &peer_id)
            .await
        {
            Ok(messages) => messages,
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

        let mut inner = self.inner.write().await;
        if inner.epoch != epoch {
            debug!("discarding stale timeline fetch for peer {}", peer_id);
            return Ok(());
        }

        let pendings: Vec<PendingMessage> = inner
            .entries
            .iter()
            .filter_map(|entry| match entry {
                TimelineEntry::Pending(p) => Some(p.clone()),
                TimelineEntry::Confirmed(_) => None,
            })
            .collect();

        inner.entries = fetched.into_iter().map(TimelineEntry::Confirmed).collect();
        inner
            .entries
            .extend(pendings.into_iter().map(TimelineEntry::Pending));
        inner.phase = LoadPhase::Ready;
        Ok(())
    }

    /// Append an optimistic entry for `text` and return it, before any
    /// network call. Whitespace-only text is a no-op. Concurrent sends are
    /// allowed; each produces its own independent pending entry.
    pub async fn send_optimistic(&self, text: &str) -> Option<PendingMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut inner = self.inner.write().await;
        let peer_id = inner.peer_id.clone()?;

        let pending = PendingMessage {
            temp_id: PendingId::new(),
            sender_id: self.session.user_id.clone(),
            receiver_id: peer_id,
            text: text.to_string(),
            created_at: Utc::now(),
            state: PendingState::Sending,
        };
        inner.entries.push(TimelineEntry::Pending(pending.clone()));
        Some(pending)
    }

    /// Issue the confirmed-send request for an optimistic entry.
    ///
    /// On success the pending entry is replaced in place by the confirmed
    /// message — same timeline position, no visible reorder. On failure
    /// the entry is rolled back and `SendFailed` surfaces; the text is not
    /// requeued (a resend would risk duplicates).
    pub async fn finalize_send(&self, pending: &PendingMessage) -> Result<Message> {
        let draft = MessageDraft {
            sender_id: pending.sender_id.clone(),
            receiver_id: pending.receiver_id.clone(),
            text: pending.text.clone(),
        };

        match self.gateway.create(draft).await {
            Ok(confirmed) => {
                self.resolve_pending(pending.temp_id, confirmed.clone()).await;
                Ok(confirmed)
            }
            Err(err) => {
                self.drop_pending(pending.temp_id).await;
                warn!("send to {} failed, rolled back: {}", pending.receiver_id, err);
                match err {
                    ChatError::SessionInvalid => {
                        self.session.invalidate();
                        Err(ChatError::SessionInvalid)
                    }
                    other => Err(ChatError::SendFailed(other.to_string())),
                }
            }
        }
    }

    /// Optimistic send and confirmation in one call, for callers that do
    /// not need to observe the in-between state. Returns `Ok(None)` for
    /// whitespace-only input.
    pub async fn send(&self, text: &str) -> Result<Option<Message>> {
        match self.send_optimistic(text).await {
            Some(pending) => self.finalize_send(&pending).await.map(Some),
            None => Ok(None),
        }
    }

    /// Render-ready sequence, ascending by creation time, with `from_me`
    /// marked against the session identity.
    pub async fn snapshot(&self) -> (LoadPhase, Vec<TimelineItem>) {
        let inner = self.inner.read().await;
        let items = inner
            .entries
            .iter()
            .map(|entry| TimelineItem {
                from_me: entry.sender_id() == self.session.user_id,
                entry: entry.clone(),
            })
            .collect();
        (inner.phase, items)
    }

    async fn resolve_pending(&self, temp_id: PendingId, confirmed: Message) {
        let mut inner = self.inner.write().await;

        let already_confirmed = inner.entries.iter().any(
            |entry| matches!(entry, TimelineEntry::Confirmed(m) if m.id == confirmed.id),
        );
        let pos = inner.entries.iter().position(
            |entry| matches!(entry, TimelineEntry::Pending(p) if p.temp_id == temp_id),
        );

        match pos {
            Some(pos) if already_confirmed => {
                // An interleaved reload already brought the confirmed row
                // in; keeping both would duplicate the message.
                inner.entries.remove(pos);
            }
            Some(pos) => {
                inner.entries[pos] = TimelineEntry::Confirmed(confirmed);
            }
            None => {
                debug!("pending {} already reconciled", temp_id);
            }
        }
    }

    async fn drop_pending(&self, temp_id: PendingId) {
        let mut inner = self.inner.write().await;
        if let Some(pos) = inner.entries.iter().position(
            |entry| matches!(entry, TimelineEntry::Pending(p) if p.temp_id == temp_id),
        ) {
            inner.entries.remove(pos);
        }
    }
}
