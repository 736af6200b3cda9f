//! Achievement and group models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// An achievement definition (`GET /logros/`).
#[derive(Debug, Clone, Deserialize)]
pub struct Achievement {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: Option<String>,
    #[serde(rename = "icono")]
    pub icon: Option<String>,
    #[serde(rename = "puntos_requeridos", default)]
    pub points_required: i64,
    #[serde(rename = "tareas_requeridas", default)]
    pub tasks_required: i64,
    #[serde(rename = "co2_requerido", default)]
    pub co2_required: f64,
    #[serde(rename = "activo", default)]
    pub active: bool,
}

/// An achievement the current user has earned (`GET /logros/mis-logros/`).
#[derive(Debug, Clone, Deserialize)]
pub struct EarnedAchievement {
    pub id: i64,
    #[serde(rename = "logro")]
    pub achievement: Achievement,
    #[serde(rename = "fecha_obtencion")]
    pub earned_at: Option<DateTime<Utc>>,
}

/// A user group (`GET /grupos/`).
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "publico", default)]
    pub public: bool,
    #[serde(rename = "miembros_count", default)]
    pub member_count: i64,
    #[serde(rename = "activo", default)]
    pub active: bool,
}
