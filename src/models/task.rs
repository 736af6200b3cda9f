//! Task catalog and task-logging models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An entry from the task catalog (`GET /tipos-tarea/`).
#[derive(Debug, Clone, Deserialize)]
pub struct TaskType {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "co2_evitado_por_accion", default)]
    pub co2_avoided_per_action: f64,
    #[serde(rename = "puntos_otorgados", default)]
    pub points_awarded: i64,
    #[serde(rename = "icono")]
    pub icon: Option<String>,
    #[serde(rename = "activa", default)]
    pub active: bool,
}

/// A task the user has logged (`GET /tareas/`).
#[derive(Debug, Clone, Deserialize)]
pub struct LoggedTask {
    pub id: i64,
    #[serde(rename = "tipo_tarea")]
    pub task_type: i64,
    #[serde(rename = "tipo_tarea_nombre", default)]
    pub task_type_name: Option<String>,
    #[serde(rename = "fecha_realizacion")]
    pub performed_on: Option<NaiveDate>,
    #[serde(rename = "co2_evitado", default)]
    pub co2_avoided: f64,
    #[serde(rename = "puntos_ganados", default)]
    pub points_earned: i64,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
    #[serde(rename = "validada", default)]
    pub validated: bool,
    #[serde(rename = "fecha_registro")]
    pub logged_at: Option<DateTime<Utc>>,
}

/// Body for `POST /tareas/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    #[serde(rename = "tipo_tarea")]
    pub task_type: i64,
    #[serde(rename = "fecha_realizacion", skip_serializing_if = "Option::is_none")]
    pub performed_on: Option<NaiveDate>,
    #[serde(rename = "notas", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewTask {
    pub fn new(task_type: i64) -> Self {
        Self {
            task_type,
            performed_on: None,
            notes: None,
        }
    }
}

/// Response to a successful task registration: the created task plus the
/// points and CO2 the server credited for it.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskLogged {
    #[serde(rename = "tarea")]
    pub task: LoggedTask,
    #[serde(rename = "puntos_ganados", default)]
    pub points_earned: i64,
    #[serde(rename = "co2_evitado", default)]
    pub co2_avoided: f64,
}

/// Aggregate statistics from `GET /tareas/estadisticas/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStats {
    #[serde(rename = "estadisticas")]
    pub totals: TaskTotals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskTotals {
    #[serde(rename = "total_tareas", default)]
    pub total_tasks: i64,
    #[serde(rename = "total_co2_evitado", default)]
    pub total_co2_avoided: f64,
    #[serde(rename = "total_puntos_ganados", default)]
    pub total_points_earned: i64,
    #[serde(rename = "tareas_por_categoria", default)]
    pub tasks_by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCount {
    #[serde(rename = "tipo_tarea__categoria")]
    pub category: Option<String>,
    #[serde(rename = "cantidad", default)]
    pub count: i64,
}
