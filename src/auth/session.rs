//! Session lifecycle: hard logout and the event channel the presentation
//! layer subscribes to.
//!
//! The session layer never navigates anywhere itself. On an unrecoverable
//! auth failure it clears the stored credentials and broadcasts
//! [`SessionEvent::LoggedOut`]; whoever owns the UI decides what to show.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use super::credentials::CredentialStore;

/// Capacity of the session event channel. Events are rare; a small buffer
/// only matters for subscribers that stop polling.
const EVENT_CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were erased and the user must authenticate again.
    LoggedOut,
}

pub struct SessionLifecycle {
    store: Arc<CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionLifecycle {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// Receiver for session events. Each call returns an independent
    /// subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether a non-expired access token is currently stored.
    pub fn is_authenticated(&self) -> bool {
        self.store.is_valid()
    }

    /// Erase all credentials and notify subscribers. Calling this while
    /// already logged out is a no-op: nothing is cleared and no event fires.
    pub fn force_logout(&self) {
        if self.store.access().is_none() && self.store.refresh_token().is_none() {
            return;
        }
        if let Err(e) = self.store.clear() {
            // The in-memory pair is gone either way; a stale file on disk
            // only means the next startup loads tokens the server already
            // rejected.
            tracing::warn!(error = %e, "Failed to clear persisted tokens during logout");
        }
        info!("Session ended, credentials cleared");
        let _ = self.events.send(SessionEvent::LoggedOut);
    }
}
