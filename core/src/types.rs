/// Shared types for the sync core
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A confirmed message record. Immutable once issued by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// The other party of this message for `self_id`, or None when the
    /// identity is on neither side.
    pub fn peer_of(&self, self_id: &str) -> Option<&str> {
        if self.sender_id == self_id {
            Some(&self.receiver_id)
        } else if self.receiver_id == self_id {
            Some(&self.sender_id)
        } else {
            None
        }
    }
}

/// Temporary identifier for a not-yet-confirmed message.
///
/// A distinct type keeps the namespace disjoint from server-issued string
/// ids, so a collision is impossible by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingId(Uuid);

impl PendingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PendingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingState {
    Sending,
    Failed,
}

/// A locally-originated message awaiting server confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMessage {
    pub temp_id: PendingId,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub state: PendingState,
}

impl PendingMessage {
    /// Copy of this entry marked failed, for the presentation layer to
    /// render after the optimistic row was rolled back.
    pub fn failed(mut self) -> Self {
        self.state = PendingState::Failed;
        self
    }
}

/// One row of the open conversation: confirmed, or still in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    Confirmed(Message),
    Pending(PendingMessage),
}

impl TimelineEntry {
    pub fn sender_id(&self) -> &str {
        match self {
            TimelineEntry::Confirmed(m) => &m.sender_id,
            TimelineEntry::Pending(p) => &p.sender_id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TimelineEntry::Confirmed(m) => &m.text,
            TimelineEntry::Pending(p) => &p.text,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            TimelineEntry::Confirmed(m) => m.created_at,
            TimelineEntry::Pending(p) => p.created_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TimelineEntry::Pending(_))
    }
}

/// Render-ready timeline row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineItem {
    pub entry: TimelineEntry,
    pub from_me: bool,
}

/// Peer directory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// List-query row: a message plus the profiles the store chose to expand.
/// Expansion is an optimization of the data source, never guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message: Message,
    pub sender_profile: Option<UserProfile>,
    pub receiver_profile: Option<UserProfile>,
}

impl MessageRecord {
    pub fn bare(message: Message) -> Self {
        Self {
            message,
            sender_profile: None,
            receiver_profile: None,
        }
    }

    /// Embedded profile of the non-`self_id` party, when present.
    pub fn peer_profile(&self, self_id: &str) -> Option<&UserProfile> {
        if self.message.sender_id == self_id {
            self.receiver_profile.as_ref()
        } else if self.message.receiver_id == self_id {
            self.sender_profile.as_ref()
        } else {
            None
        }
    }
}

/// One conversation row for the list view (derived, never persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub peer_id: String,
    pub peer_profile: UserProfile,
    pub last_message_text: String,
    pub last_message_at: DateTime<Utc>,
    pub last_message_from_me: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Create,
    Update,
    Delete,
}

/// Realtime change notification for the message collection. The channel is
/// not filterable server-side, so every open view sees every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub operation: ChangeOp,
    pub record: Message,
}

/// Tri-state of a derived view. "Empty" is Ready with no rows, never a
/// separate flag, so the three user-visible states cannot overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    Loading,
    Ready,
    Failed,
}

/// Result shape consumed from the external search index when starting a
/// new conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// Drop the signed-in user from search hits before presenting them.
pub fn without_self(hits: Vec<SearchHit>, self_id: &str) -> Vec<SearchHit> {
    hits.into_iter().filter(|h| h.id != self_id).collect()
}
