//! Single-flight renewal of the access token.
//!
//! Every request that hits a 401 funnels through here. The first caller
//! becomes the leader and performs the actual renewal round-trip; callers
//! arriving while that is in flight are queued and woken with the leader's
//! outcome. However many requests expire at once, the renewal endpoint is
//! called exactly once per expiry.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::credentials::CredentialStore;
use super::session::SessionLifecycle;

/// How long a renewal round-trip may take before it is treated as failed.
/// The original behavior left followers suspended indefinitely on a hung
/// renewal; this bound closes that gap.
const RENEWAL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no refresh token available")]
    MissingRefreshToken,
    #[error("token renewal rejected by server: {0}")]
    Rejected(String),
    #[error("token renewal failed: {0}")]
    Transport(String),
    #[error("token renewal timed out after {0}s")]
    TimedOut(u64),
    /// The coordinator was torn down while this caller was queued.
    #[error("token renewal abandoned")]
    Abandoned,
}

/// Outcome of a successful renewal call. Refresh-token rotation is
/// optional server-side; `refresh` is only set when the server rotated.
#[derive(Debug, Clone)]
pub struct RenewedTokens {
    pub access: String,
    pub refresh: Option<String>,
}

/// The actual renewal round-trip, kept behind a trait so the coordinator's
/// state machine is testable without a server.
#[async_trait]
pub trait TokenRenewer: Send + Sync {
    async fn renew(&self, refresh_token: &str) -> Result<RenewedTokens, AuthError>;
}

enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<Result<String, AuthError>>>,
    },
}

pub struct RefreshCoordinator {
    store: Arc<CredentialStore>,
    lifecycle: Arc<SessionLifecycle>,
    state: Mutex<RefreshState>,
    timeout: Duration,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<CredentialStore>, lifecycle: Arc<SessionLifecycle>) -> Self {
        Self::with_timeout(store, lifecycle, Duration::from_secs(RENEWAL_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        store: Arc<CredentialStore>,
        lifecycle: Arc<SessionLifecycle>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            lifecycle,
            state: Mutex::new(RefreshState::Idle),
            timeout,
        }
    }

    // The state lock is never held across an await point.
    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Obtain a fresh access token. The first caller while idle leads the
    /// renewal; concurrent callers wait for its outcome. Returns the new
    /// access token on success. On failure the credential store has been
    /// cleared and the hard-logout path has fired.
    pub async fn refresh(&self, renewer: &dyn TokenRenewer) -> Result<String, AuthError> {
        let waiter = {
            let mut state = self.lock();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: Vec::new(),
                    };
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            debug!("Renewal already in flight, waiting for leader");
            return rx.await.unwrap_or(Err(AuthError::Abandoned));
        }

        let outcome = self.renew_as_leader(renewer).await;

        if outcome.is_err() {
            // Unrecoverable: erase credentials and signal re-login before
            // waking the queue, so no follower observes stale tokens.
            self.lifecycle.force_logout();
        }

        let waiters = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };
        debug!(followers = waiters.len(), ok = outcome.is_ok(), "Renewal settled");
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }

        outcome
    }

    async fn renew_as_leader(&self, renewer: &dyn TokenRenewer) -> Result<String, AuthError> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(AuthError::MissingRefreshToken)?;

        debug!("Renewing access token");
        let renewed = match tokio::time::timeout(self.timeout, renewer.renew(&refresh_token)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(AuthError::TimedOut(self.timeout.as_secs())),
        };

        if let Err(e) = self.store.rotate(renewed.access.clone(), renewed.refresh) {
            // In-memory tokens are current; only the on-disk copy is stale.
            warn!(error = %e, "Failed to persist renewed tokens");
        }
        Ok(renewed.access)
    }
}
