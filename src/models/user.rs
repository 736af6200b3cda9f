//! User, profile, and ranking models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(rename = "rol")]
    pub role: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    pub avatar: Option<String>,
    #[serde(rename = "puntos_totales", default)]
    pub total_points: i64,
    #[serde(rename = "nivel", default)]
    pub level: i64,
    #[serde(rename = "co2_total_evitado", default)]
    pub total_co2_avoided: f64,
    #[serde(rename = "fecha_creacion")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "activo", default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl User {
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() => format!("{} {}", first, last),
            (Some(first), None) if !first.is_empty() => first.to_string(),
            _ => self.username.clone(),
        }
    }
}

/// Full profile as returned by `GET /usuarios/perfil/`; extends [`User`]
/// with aggregate counters.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "tareas_completadas", default)]
    pub tasks_completed: i64,
    #[serde(rename = "logros_obtenidos_count", default)]
    pub achievements_earned: i64,
}

/// Editable profile fields for `PUT /usuarios/perfil/editar/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "fecha_nacimiento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

/// Body for `POST /usuarios/registro/`. The server validates that the two
/// password fields match.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "fecha_nacimiento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// One row of the global ranking (`GET /usuarios/ranking/`).
#[derive(Debug, Clone, Deserialize)]
pub struct RankingEntry {
    pub id: i64,
    pub username: String,
    pub avatar: Option<String>,
    #[serde(rename = "puntos_totales", default)]
    pub total_points: i64,
    #[serde(rename = "nivel", default)]
    pub level: i64,
    #[serde(rename = "co2_total_evitado", default)]
    pub total_co2_avoided: f64,
}

/// Claims embedded in the access token payload. Only the fields the client
/// reads; everything else in the JWT is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}
