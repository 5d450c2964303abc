/// Sohbet sync core — realtime one-to-one message synchronization
///
/// Reduces an eventually-consistent message collection into two derived
/// views — the per-peer conversation list and the open conversation's
/// timeline — under optimistic local sends, push-triggered refetches, and
/// bounded retry. Presentation, authentication, and transport live outside
/// this crate, behind the gateway traits.

pub mod config;
pub mod conversations;
pub mod error;
pub mod gateway;
pub mod retry;
pub mod session;
pub mod subscription;
pub mod timeline;
pub mod types;

pub use config::Config;
pub use conversations::ConversationAggregator;
pub use error::{ChatError, Result};
pub use gateway::{MessageDraft, MessageGateway, ProfileDirectory, UserSearch};
pub use retry::{RetryController, RetryPolicy, RetryState};
pub use session::Session;
pub use subscription::{refresh_fn, SubscriptionManager, ViewScope};
pub use timeline::MessageStore;
