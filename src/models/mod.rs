//! Wire models for the EcoPoints REST API.
//!
//! The backend exposes Spanish snake_case field names; these structs map
//! them onto idiomatic Rust names with `#[serde(rename)]`. List endpoints
//! use the standard DRF pagination envelope, covered by [`Paginated`].

pub mod achievement;
pub mod task;
pub mod user;

use serde::Deserialize;

pub use achievement::{Achievement, EarnedAchievement, Group};
pub use task::{LoggedTask, NewTask, TaskLogged, TaskStats, TaskType};
pub use user::{Profile, ProfileUpdate, RankingEntry, Registration, TokenClaims, User};

/// Standard paginated list envelope: `{count, next, previous, results}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}
