//! REST API client module for the EcoPoints backend.
//!
//! This module provides the `ApiClient` for dispatching authenticated
//! requests, the transport seam it sits on, and thin typed wrappers for
//! the task, ranking, achievement, and group endpoints.
//!
//! The API uses short-lived JWT bearer tokens; an expired token is renewed
//! transparently through the session layer in `crate::auth`.

pub mod client;
pub mod error;
pub mod gamification;
pub mod request;
pub mod tasks;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use request::ApiRequest;
pub use tasks::TaskQuery;
pub use transport::{ApiTransport, HttpTransport, RawResponse};
