//! Task catalog and task-logging endpoints.

use crate::models::{LoggedTask, NewTask, TaskLogged, TaskStats, TaskType};

use super::client::{parse_list, ApiClient};
use super::error::ApiError;
use super::request::ApiRequest;

/// Number of entries the "recent tasks" view shows.
const RECENT_TASK_LIMIT: u32 = 5;

/// Query parameters for the task history listing.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub limit: Option<u32>,
    /// Server-side ordering, e.g. `-fecha_registro` for newest first.
    pub ordering: Option<String>,
}

impl ApiClient {
    /// Available task types (`GET /tipos-tarea/`).
    pub async fn task_types(&self) -> Result<Vec<TaskType>, ApiError> {
        let response = self.send(ApiRequest::get("/tipos-tarea/")).await?;
        parse_list(&response)
    }

    /// Log a completed task (`POST /tareas/`); returns the created entry
    /// plus the points and CO2 the server credited.
    pub async fn log_task(&self, task: &NewTask) -> Result<TaskLogged, ApiError> {
        let body = serde_json::to_value(task)
            .map_err(|e| ApiError::InvalidResponse(format!("Unserializable task: {}", e)))?;
        self.request(ApiRequest::post("/tareas/").with_json(body))
            .await
    }

    /// The current user's task history (`GET /tareas/`).
    pub async fn my_tasks(&self, query: &TaskQuery) -> Result<Vec<LoggedTask>, ApiError> {
        let mut request = ApiRequest::get("/tareas/");
        if let Some(limit) = query.limit {
            request = request.with_query("limit", limit);
        }
        if let Some(ref ordering) = query.ordering {
            request = request.with_query("ordering", ordering);
        }
        let response = self.send(request).await?;
        parse_list(&response)
    }

    /// The most recently logged tasks, newest first.
    pub async fn recent_tasks(&self) -> Result<Vec<LoggedTask>, ApiError> {
        self.my_tasks(&TaskQuery {
            limit: Some(RECENT_TASK_LIMIT),
            ordering: Some("-fecha_registro".into()),
        })
        .await
    }

    /// Personal aggregates (`GET /tareas/estadisticas/`).
    pub async fn my_stats(&self) -> Result<TaskStats, ApiError> {
        self.request(ApiRequest::get("/tareas/estadisticas/")).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::test_transport::ScriptedTransport;
    use super::*;
    use crate::auth::credentials::test_support::make_jwt;
    use crate::auth::CredentialStore;
    use chrono::Utc;
    use std::sync::Arc;

    fn authed_client(responses: Vec<(u16, &str)>) -> (ApiClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        let store = Arc::new(CredentialStore::in_memory());
        store
            .set(make_jwt(Utc::now().timestamp() + 3600), "refresh-0".into())
            .expect("set should succeed");
        (
            ApiClient::with_transport(transport.clone(), store),
            transport,
        )
    }

    #[tokio::test]
    async fn task_types_accept_plain_and_paginated_lists() {
        let plain = r#"[{"id": 1, "nombre": "Reciclar vidrio", "puntos_otorgados": 10, "activa": true}]"#;
        let paginated = r#"{"count": 1, "next": null, "previous": null, "results":
            [{"id": 1, "nombre": "Reciclar vidrio", "puntos_otorgados": 10, "activa": true}]}"#;

        for body in [plain, paginated] {
            let (client, _) = authed_client(vec![(200, body)]);
            let types = client.task_types().await.expect("should parse");
            assert_eq!(types.len(), 1);
            assert_eq!(types[0].name, "Reciclar vidrio");
            assert_eq!(types[0].points_awarded, 10);
        }
    }

    #[tokio::test]
    async fn recent_tasks_request_carries_limit_and_ordering() {
        let (client, transport) = authed_client(vec![(200, "[]")]);
        client.recent_tasks().await.expect("should succeed");

        assert_eq!(transport.paths(), vec!["/tareas/"]);
        let requests = transport.requests.lock().expect("requests lock");
        assert_eq!(
            requests[0].query,
            vec![
                ("limit".to_string(), "5".to_string()),
                ("ordering".to_string(), "-fecha_registro".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn log_task_returns_awarded_points() {
        let body = r#"{
            "message": "Tarea registrada",
            "tarea": {"id": 9, "tipo_tarea": 1, "puntos_ganados": 10, "validada": false},
            "puntos_ganados": 10,
            "co2_evitado": 0.8
        }"#;
        let (client, _) = authed_client(vec![(200, body)]);

        let logged = client
            .log_task(&NewTask::new(1))
            .await
            .expect("should succeed");
        assert_eq!(logged.points_earned, 10);
        assert_eq!(logged.task.id, 9);
    }
}
