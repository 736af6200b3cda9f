//! Session layer: credential storage, single-flight token renewal, and
//! the hard-logout lifecycle.
//!
//! This module provides:
//! - `CredentialStore`: the persisted access/refresh token pair
//! - `RefreshCoordinator`: collapses concurrent 401s into one renewal call
//! - `SessionLifecycle`: clears credentials and broadcasts logout events

pub mod credentials;
pub mod refresh;
pub mod session;

pub use credentials::{decode_claims, CredentialStore, TokenPair};
pub use refresh::{AuthError, RefreshCoordinator, RenewedTokens, TokenRenewer};
pub use session::{SessionEvent, SessionLifecycle};
