//! ecopoints-client - async client library for the EcoPoints gamification API.
//!
//! The EcoPoints backend tracks ecological tasks, points, rankings, and
//! achievements behind JWT bearer authentication with short-lived access
//! tokens. This crate wraps it in a typed client whose session layer
//! handles token expiry transparently: a 401 triggers a single-flight
//! renewal against the refresh endpoint, the original request is retried
//! once, and only an unrecoverable failure ends the session.
//!
//! ```no_run
//! use ecopoints_client::{ApiClient, Config, SessionEvent};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let client = ApiClient::new(&config)?;
//!
//! let mut events = client.subscribe_session_events();
//! tokio::spawn(async move {
//!     while let Ok(SessionEvent::LoggedOut) = events.recv().await {
//!         // show the login screen
//!     }
//! });
//!
//! client.login("maria", "hunter2").await?;
//! let ranking = client.ranking(Some(10)).await?;
//! println!("{} users ranked", ranking.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest, TaskQuery};
pub use auth::{AuthError, CredentialStore, SessionEvent, SessionLifecycle};
pub use config::Config;
