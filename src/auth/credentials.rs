//! Persistent storage for the access/refresh token pair.
//!
//! Tokens live in `tokens.json` inside the data directory, mirroring the
//! two slots the API hands out on login. The pair is stored and cleared as
//! a unit: after any successful operation either both tokens are present
//! or neither is.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::TokenClaims;

/// Token file name in the data directory
const TOKEN_FILE: &str = "tokens.json";

/// The access/refresh pair issued together by login, registration, or a
/// rotating renewal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "access_token")]
    pub access: String,
    #[serde(rename = "refresh_token")]
    pub refresh: String,
}

/// Process-wide credential store: one in-memory pair with write-through to
/// disk so a restart picks the session back up.
pub struct CredentialStore {
    path: Option<PathBuf>,
    tokens: Mutex<Option<TokenPair>>,
}

impl CredentialStore {
    /// Open the store backed by `data_dir/tokens.json`, loading any pair a
    /// previous run persisted. A missing or unreadable file starts empty.
    pub fn open(data_dir: PathBuf) -> Self {
        let path = data_dir.join(TOKEN_FILE);
        let tokens = Self::load_file(&path);
        Self {
            path: Some(path),
            tokens: Mutex::new(tokens),
        }
    }

    /// A store with no backing file. Used by tests and callers that manage
    /// persistence themselves.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tokens: Mutex::new(None),
        }
    }

    fn load_file(path: &std::path::Path) -> Option<TokenPair> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<TokenPair>(&contents) {
            Ok(pair) => Some(pair),
            Err(e) => {
                debug!(error = %e, "Ignoring unparseable token file");
                None
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<TokenPair>> {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Persist a freshly issued pair. Both slots are replaced together; the
    /// in-memory pair is updated even when the disk write fails.
    pub fn set(&self, access: String, refresh: String) -> Result<()> {
        let pair = TokenPair { access, refresh };
        *self.lock() = Some(pair.clone());
        self.write_file(Some(&pair))
    }

    /// Store a renewed access token. When the server rotated the refresh
    /// token the new one replaces the old; otherwise the existing refresh
    /// token is kept so the pair stays complete.
    pub fn rotate(&self, access: String, new_refresh: Option<String>) -> Result<()> {
        let mut guard = self.lock();
        let refresh = match new_refresh.or_else(|| guard.as_ref().map(|p| p.refresh.clone())) {
            Some(r) => r,
            // No refresh token anywhere: storing a lone access token would
            // break the pair invariant, so drop everything instead.
            None => {
                drop(guard);
                return self.clear();
            }
        };
        let pair = TokenPair { access, refresh };
        *guard = Some(pair.clone());
        drop(guard);
        self.write_file(Some(&pair))
    }

    /// Current access token, if any.
    pub fn access(&self) -> Option<String> {
        self.lock().as_ref().map(|p| p.access.clone())
    }

    /// Current refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.lock().as_ref().map(|p| p.refresh.clone())
    }

    /// Remove both tokens. Idempotent.
    pub fn clear(&self) -> Result<()> {
        *self.lock() = None;
        if let Some(ref path) = self.path {
            if path.exists() {
                std::fs::remove_file(path).context("Failed to remove token file")?;
            }
        }
        Ok(())
    }

    /// Whether a non-expired access token is present. Missing, malformed,
    /// and expired tokens all answer false; decoding problems are never
    /// surfaced as errors.
    pub fn is_valid(&self) -> bool {
        match self.claims() {
            Some(claims) => claims.exp > Utc::now().timestamp(),
            None => false,
        }
    }

    /// Claims embedded in the stored access token, when one is present and
    /// its payload decodes.
    pub fn claims(&self) -> Option<TokenClaims> {
        let access = self.access()?;
        decode_claims(&access)
    }

    fn write_file(&self, pair: Option<&TokenPair>) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        match pair {
            Some(pair) => {
                // Write-then-rename so a crash never leaves a half-written
                // pair on disk.
                let contents = serde_json::to_string_pretty(pair)?;
                let tmp = path.with_extension("json.tmp");
                std::fs::write(&tmp, contents).context("Failed to write token file")?;
                std::fs::rename(&tmp, path).context("Failed to replace token file")?;
            }
            None => {
                if path.exists() {
                    std::fs::remove_file(path).context("Failed to remove token file")?;
                }
            }
        }
        Ok(())
    }
}

/// Decode the claims from a JWT payload without verifying the signature.
/// The client only needs the expiry; validation is the server's job.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}
