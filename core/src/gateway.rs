/// External collaborator contracts
///
/// The sync core never talks to a concrete backend. It consumes three
/// seams: the message collection store, the peer directory, and the
/// hosted search index. Transports, timeouts and reconnection live behind
/// these traits; "no response in time" arrives here as an ordinary
/// `ChatError::Fetch`.
use crate::error::Result;
use crate::types::{ChangeEvent, Message, MessageRecord, SearchHit, UserProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Fields for creating a new message record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
}

/// Message collection store.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// All messages exchanged between `a` and `b`, ascending by creation
    /// time.
    async fn list_between(&self, a: &str, b: &str) -> Result<Vec<Message>>;

    /// All messages where `user_id` is sender or receiver, descending by
    /// creation time (most recent first), with peer profiles expanded
    /// where the store can.
    async fn list_involving(&self, user_id: &str) -> Result<Vec<MessageRecord>>;

    /// Create a confirmed message record; returns the authoritative row
    /// with its server-issued id and timestamp.
    async fn create(&self, draft: MessageDraft) -> Result<Message>;

    /// Change events for the entire message collection. Dropping the
    /// receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Peer directory lookup, used when a list query did not expand a profile.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn profile(&self, user_id: &str) -> Result<UserProfile>;
}

/// Hosted full-text user search, consumed only when starting a new
/// conversation. Pair with [`crate::types::without_self`] so the signed-in
/// user never shows up in their own results.
#[async_trait]
pub trait UserSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}
