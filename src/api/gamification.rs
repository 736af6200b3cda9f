//! Ranking, achievement, group, and profile endpoints.

use crate::models::user::ProfileUpdate;
use crate::models::{Achievement, EarnedAchievement, Group, Profile, RankingEntry};

use super::client::{parse_list, ApiClient};
use super::error::ApiError;
use super::request::ApiRequest;

impl ApiClient {
    /// Global points ranking (`GET /usuarios/ranking/`).
    pub async fn ranking(&self, limit: Option<u32>) -> Result<Vec<RankingEntry>, ApiError> {
        let mut request = ApiRequest::get("/usuarios/ranking/");
        if let Some(limit) = limit {
            request = request.with_query("limit", limit);
        }
        let response = self.send(request).await?;
        parse_list(&response)
    }

    /// All achievement definitions (`GET /logros/`).
    pub async fn achievements(&self) -> Result<Vec<Achievement>, ApiError> {
        let response = self.send(ApiRequest::get("/logros/")).await?;
        parse_list(&response)
    }

    /// Achievements the current user has earned (`GET /logros/mis-logros/`).
    pub async fn my_achievements(&self) -> Result<Vec<EarnedAchievement>, ApiError> {
        let response = self.send(ApiRequest::get("/logros/mis-logros/")).await?;
        parse_list(&response)
    }

    /// Visible groups (`GET /grupos/`).
    pub async fn groups(&self) -> Result<Vec<Group>, ApiError> {
        let response = self.send(ApiRequest::get("/grupos/")).await?;
        parse_list(&response)
    }

    /// Join a group (`POST /grupos/{id}/unirse/`).
    pub async fn join_group(&self, group_id: i64) -> Result<(), ApiError> {
        self.send(ApiRequest::post(format!("/grupos/{}/unirse/", group_id)))
            .await?;
        Ok(())
    }

    /// Leave a group (`POST /grupos/{id}/salir/`).
    pub async fn leave_group(&self, group_id: i64) -> Result<(), ApiError> {
        self.send(ApiRequest::post(format!("/grupos/{}/salir/", group_id)))
            .await?;
        Ok(())
    }

    /// The authenticated user's full profile (`GET /usuarios/perfil/`).
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.request(ApiRequest::get("/usuarios/perfil/")).await
    }

    /// Update profile fields (`PUT /usuarios/perfil/editar/`).
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let body = serde_json::to_value(update)
            .map_err(|e| ApiError::InvalidResponse(format!("Unserializable profile: {}", e)))?;
        self.request(ApiRequest::put("/usuarios/perfil/editar/").with_json(body))
            .await
    }
}
