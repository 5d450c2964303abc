/// Realtime subscription management
///
/// One realtime channel covers the whole message collection; it cannot be
/// filtered server-side, so each mounted view installs its own client-side
/// relevance filter. A relevant event never carries truth by itself — it
/// only triggers a full refetch through the registered callback.
use crate::gateway::MessageGateway;
use crate::session::Session;
use crate::types::ChangeEvent;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Which view the subscription feeds; decides event relevance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewScope {
    ConversationList,
    Conversation { peer_id: String },
}

/// Refresh callback invoked on every relevant event.
pub type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap a plain async closure as a [`RefreshFn`].
pub fn refresh_fn<F, Fut>(f: F) -> RefreshFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, ()> { Box::pin(f()) })
}

pub struct SubscriptionManager {
    session: Session,
    gateway: Arc<dyn MessageGateway>,
    listener: Option<JoinHandle<()>>,
}

impl SubscriptionManager {
    pub fn new(session: Session, gateway: Arc<dyn MessageGateway>) -> Self {
        Self {
            session,
            gateway,
            listener: None,
        }
    }

    /// Subscribe for `scope` and run `on_relevant` for each event that
    /// passes the filter. Any previous subscription is torn down first, so
    /// re-activating a view never accumulates listeners.
    pub fn activate(&mut self, scope: ViewScope, on_relevant: RefreshFn) {
        self.deactivate();

        let mut rx = self.gateway.subscribe();
        let self_id = self.session.user_id.clone();

        self.listener = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if is_relevant(&event, &self_id, &scope) {
                            on_relevant().await;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        // Skipped events only delay a refetch; the next
                        // relevant one rebuilds the whole view anyway.
                        warn!("subscription lagged {} events", n);
                    }
                    Err(RecvError::Closed) => {
                        debug!("change channel closed, listener exiting");
                        break;
                    }
                }
            }
        }));
    }

    /// Stop listening. The receiver is dropped with the task, which is the
    /// channel's unsubscribe.
    pub fn deactivate(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// Relevance filter. For the list view an event matters when this identity
/// is on either side; for an open conversation the other side must also be
/// the open peer.
pub fn is_relevant(event: &ChangeEvent, self_id: &str, scope: &ViewScope) -> bool {
    let record = &event.record;
    let involves_me = record.sender_id == self_id || record.receiver_id == self_id;

    match scope {
        ViewScope::ConversationList => involves_me,
        ViewScope::Conversation { peer_id } => {
            involves_me && record.peer_of(self_id) == Some(peer_id.as_str())
        }
    }
}
