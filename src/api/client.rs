//! API client for the EcoPoints REST backend.
//!
//! `ApiClient` is the request dispatcher of the session layer: it attaches
//! the stored bearer token to every call, intercepts 401 responses, renews
//! the token through the [`RefreshCoordinator`] and retries the original
//! request exactly once. Every other outcome passes through untouched.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::{
    AuthError, CredentialStore, RefreshCoordinator, RenewedTokens, SessionEvent,
    SessionLifecycle, TokenRenewer,
};
use crate::config::Config;
use crate::models::user::Registration;
use crate::models::{Paginated, TokenClaims, User};

use super::error::ApiError;
use super::request::ApiRequest;
use super::transport::{ApiTransport, HttpTransport, RawResponse};

// ============================================================================
// Endpoint paths (relative to the configured base URL)
// ============================================================================

const LOGIN_PATH: &str = "/usuarios/login/";
const REGISTER_PATH: &str = "/usuarios/registro/";
const REFRESH_PATH: &str = "/token/refresh/";

/// Login and registration responses: the user payload plus the freshly
/// issued token pair.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(rename = "usuario")]
    user: User,
    tokens: IssuedTokens,
}

#[derive(Debug, Deserialize)]
struct IssuedTokens {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Renewal round-trip against `POST /token/refresh/`. Auth-exempt: it is
/// authenticated by the refresh token in its body, never by a bearer header.
struct HttpRenewer {
    transport: Arc<dyn ApiTransport>,
}

#[async_trait]
impl TokenRenewer for HttpRenewer {
    async fn renew(&self, refresh_token: &str) -> Result<RenewedTokens, AuthError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .auth_exempt()
            .with_json(json!({ "refresh": refresh_token }));

        let response = self
            .transport
            .execute(&request, None)
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !response.status.is_success() {
            return Err(AuthError::Rejected(format!(
                "status {}",
                response.status.as_u16()
            )));
        }

        let parsed: RefreshResponse = response
            .json()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        Ok(RenewedTokens {
            access: parsed.access,
            refresh: parsed.refresh,
        })
    }
}

/// Dispatcher plus thin typed wrappers over the EcoPoints endpoints.
/// Clone is cheap - all state is shared behind Arcs.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    store: Arc<CredentialStore>,
    lifecycle: Arc<SessionLifecycle>,
    coordinator: Arc<RefreshCoordinator>,
    renewer: Arc<HttpRenewer>,
}

impl ApiClient {
    /// Build a client against the configured base URL, picking up any token
    /// pair persisted by a previous run.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let transport = Arc::new(HttpTransport::new(&config.api_base_url)?);
        let store = Arc::new(CredentialStore::open(config.data_dir()));
        Ok(Self::with_transport(transport, store))
    }

    /// Assemble the session layer around an arbitrary transport. Tests use
    /// this with in-process transports.
    pub fn with_transport(transport: Arc<dyn ApiTransport>, store: Arc<CredentialStore>) -> Self {
        let lifecycle = Arc::new(SessionLifecycle::new(store.clone()));
        let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), lifecycle.clone()));
        let renewer = Arc::new(HttpRenewer {
            transport: transport.clone(),
        });
        Self {
            transport,
            store,
            lifecycle,
            coordinator,
            renewer,
        }
    }

    /// Whether a non-expired access token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.lifecycle.is_authenticated()
    }

    /// Session events (currently only hard logout), for the layer that owns
    /// navigation.
    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.lifecycle.subscribe()
    }

    /// Identity claims from the stored access token, without a server call.
    pub fn current_user(&self) -> Option<TokenClaims> {
        self.store.claims()
    }

    // ===== Dispatcher =====

    /// Issue a request with the current credentials. A 401 on an ordinary
    /// request triggers one renewal cycle and one retry; a 401 anywhere
    /// else (auth endpoints, the retried attempt) ends the session.
    pub async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let bearer = self.store.access();
        let response = self.transport.execute(&request, bearer.as_deref()).await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Self::into_result(response);
        }

        if request.auth_exempt {
            warn!(path = %request.path, "Credentials rejected by auth endpoint");
            self.lifecycle.force_logout();
            return Err(ApiError::Unauthorized);
        }

        debug!(path = %request.path, "Got 401, renewing access token");
        let access = self.coordinator.refresh(self.renewer.as_ref()).await?;

        let retried = self.transport.execute(&request, Some(&access)).await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            // Renewed token rejected too: permanent failure, never a second
            // renewal cycle for the same request.
            warn!(path = %request.path, "Request still unauthorized after renewal");
            self.lifecycle.force_logout();
            return Err(ApiError::Unauthorized);
        }
        Self::into_result(retried)
    }

    /// [`send`](Self::send) plus JSON decoding of the 2xx body.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response.json()
    }

    fn into_result(response: RawResponse) -> Result<RawResponse, ApiError> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    // ===== Auth endpoints =====

    /// Authenticate and persist the issued token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .auth_exempt()
            .with_json(json!({ "username": username, "password": password }));
        let response = self.send(request).await?;
        let auth: AuthResponse = response.json()?;
        self.adopt_tokens(auth.tokens);
        info!(username, "Logged in");
        Ok(auth.user)
    }

    /// Create an account; the backend logs the new user straight in, so the
    /// returned tokens are persisted like a login.
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let body = serde_json::to_value(registration)
            .map_err(|e| ApiError::InvalidResponse(format!("Unserializable registration: {}", e)))?;
        let request = ApiRequest::post(REGISTER_PATH).auth_exempt().with_json(body);
        let response = self.send(request).await?;
        let auth: AuthResponse = response.json()?;
        self.adopt_tokens(auth.tokens);
        info!(username = %auth.user.username, "Registered");
        Ok(auth.user)
    }

    /// Drop the session locally. No server call is involved; the tokens are
    /// simply erased and subscribers are notified.
    pub fn logout(&self) {
        self.lifecycle.force_logout();
    }

    fn adopt_tokens(&self, tokens: IssuedTokens) {
        if let Err(e) = self.store.set(tokens.access, tokens.refresh) {
            warn!(error = %e, "Failed to persist issued tokens");
        }
    }
}

/// Decode a list endpoint body: either a plain JSON array or the DRF
/// pagination envelope, depending on server configuration.
pub(crate) fn parse_list<T: DeserializeOwned>(response: &RawResponse) -> Result<Vec<T>, ApiError> {
    if let Ok(items) = response.json::<Vec<T>>() {
        return Ok(items);
    }
    let page: Paginated<T> = response.json()?;
    Ok(page.results)
}


#[cfg(test)]
mod tests {
    use super::test_transport::ScriptedTransport;
    use super::*;
    use crate::auth::credentials::test_support::make_jwt;
    use chrono::Utc;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn expired_jwt() -> String {
        make_jwt(Utc::now().timestamp() - 60)
    }

    fn valid_jwt() -> String {
        make_jwt(Utc::now().timestamp() + 3600)
    }

    fn client_with(
        responses: Vec<(u16, &str)>,
        tokens: Option<(String, String)>,
    ) -> (ApiClient, Arc<ScriptedTransport>, Arc<CredentialStore>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        let store = Arc::new(CredentialStore::in_memory());
        if let Some((access, refresh)) = tokens {
            store.set(access, refresh).expect("set should succeed");
        }
        let client = ApiClient::with_transport(transport.clone(), store.clone());
        (client, transport, store)
    }

    #[tokio::test]
    async fn unauthenticated_request_goes_out_without_bearer() {
        let (client, transport, _store) = client_with(vec![(200, "{}")], None);

        assert!(!client.is_authenticated());
        client
            .send(ApiRequest::get("/tareas/"))
            .await
            .expect("request should succeed");

        assert_eq!(transport.calls(), vec![("/tareas/".to_string(), None)]);
    }

    #[tokio::test]
    async fn success_passes_through_with_bearer_and_no_renewal() {
        let access = valid_jwt();
        let (client, transport, _store) = client_with(
            vec![(200, r#"{"ok": true}"#)],
            Some((access.clone(), "refresh-0".into())),
        );

        assert!(client.is_authenticated());
        let response = client
            .send(ApiRequest::get("/tareas/"))
            .await
            .expect("request should succeed");

        assert_eq!(response.body, r#"{"ok": true}"#);
        assert_eq!(transport.calls(), vec![("/tareas/".to_string(), Some(access))]);
    }

    #[tokio::test]
    async fn expired_token_is_renewed_transparently() {
        let (client, transport, store) = client_with(
            vec![
                (401, ""),
                (200, r#"{"access": "new-access", "refresh": "refresh-1"}"#),
                (200, r#"{"ok": true}"#),
            ],
            Some((expired_jwt(), "refresh-0".into())),
        );

        let response = client
            .send(ApiRequest::get("/tareas/"))
            .await
            .expect("request should succeed after renewal");

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            transport.paths(),
            vec!["/tareas/", "/token/refresh/", "/tareas/"]
        );
        // Retry carried the renewed token, and the rotated pair was stored.
        assert_eq!(transport.calls()[2].1.as_deref(), Some("new-access"));
        assert_eq!(store.access().as_deref(), Some("new-access"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn renewal_keeps_old_refresh_token_when_not_rotated() {
        let (client, _transport, store) = client_with(
            vec![
                (401, ""),
                (200, r#"{"access": "new-access"}"#),
                (200, "{}"),
            ],
            Some((expired_jwt(), "refresh-0".into())),
        );

        client
            .send(ApiRequest::get("/tareas/"))
            .await
            .expect("request should succeed");
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-0"));
    }

    #[tokio::test]
    async fn failed_renewal_ends_the_session() {
        let (client, transport, store) = client_with(
            vec![(401, ""), (401, r#"{"detail": "token invalid"}"#)],
            Some((expired_jwt(), "refresh-0".into())),
        );
        let mut events = client.subscribe_session_events();

        let result = client.send(ApiRequest::get("/tareas/")).await;
        assert!(matches!(
            result,
            Err(ApiError::SessionExpired(AuthError::Rejected(_)))
        ));
        assert_eq!(transport.paths(), vec!["/tareas/", "/token/refresh/"]);
        assert!(store.access().is_none());
        assert!(store.refresh_token().is_none());
        assert_eq!(events.recv().await.expect("event"), SessionEvent::LoggedOut);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn second_401_after_retry_fails_without_another_renewal() {
        let (client, transport, _store) = client_with(
            vec![
                (401, ""),
                (200, r#"{"access": "new-access"}"#),
                (401, ""),
            ],
            Some((expired_jwt(), "refresh-0".into())),
        );
        let mut events = client.subscribe_session_events();

        let result = client.send(ApiRequest::get("/tareas/")).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        // Exactly one renewal: no second /token/refresh/ entry.
        assert_eq!(
            transport.paths(),
            vec!["/tareas/", "/token/refresh/", "/tareas/"]
        );
        assert_eq!(events.recv().await.expect("event"), SessionEvent::LoggedOut);
    }

    #[tokio::test]
    async fn non_401_errors_bypass_the_refresh_coordinator() {
        for (status, expect_variant) in [(404u16, "not found"), (500, "server")] {
            let (client, transport, store) = client_with(
                vec![(status, "boom")],
                Some((valid_jwt(), "refresh-0".into())),
            );

            let result = client.send(ApiRequest::get("/grupos/")).await;
            match (status, result) {
                (404, Err(ApiError::NotFound(_))) => {}
                (500, Err(ApiError::ServerError(_))) => {}
                (_, other) => panic!("unexpected outcome for {}: {:?}", expect_variant, other.err().map(|e| e.to_string())),
            }
            assert_eq!(transport.paths(), vec!["/grupos/"]);
            // Credentials untouched.
            assert!(store.access().is_some());
        }
    }

    #[tokio::test]
    async fn login_rejection_never_triggers_renewal() {
        let (client, transport, store) = client_with(
            vec![(401, r#"{"error": "Credenciales inválidas"}"#)],
            Some((expired_jwt(), "refresh-0".into())),
        );

        let result = client.login("maria", "wrong-password").await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert_eq!(transport.paths(), vec!["/usuarios/login/"]);
        assert!(store.access().is_none());
    }

    #[tokio::test]
    async fn login_persists_issued_pair() {
        let access = valid_jwt();
        let body = format!(
            r#"{{
                "message": "Inicio de sesión exitoso",
                "usuario": {{"id": 7, "username": "maria", "puntos_totales": 320}},
                "tokens": {{"access": "{}", "refresh": "refresh-0"}}
            }}"#,
            access
        );
        let (client, _transport, store) = client_with(vec![(200, body.as_str())], None);

        let user = client.login("maria", "hunter2").await.expect("login should succeed");
        assert_eq!(user.username, "maria");
        assert_eq!(store.access(), Some(access));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-0"));
        assert!(client.is_authenticated());
        assert_eq!(client.current_user().and_then(|c| c.user_id), Some(7));
    }

    /// Five requests expire at once; the renewal endpoint is hit exactly
    /// once and all five complete.
    struct ExpiringTransport {
        refresh_calls: AtomicUsize,
    }

    #[async_trait]
    impl ApiTransport for ExpiringTransport {
        async fn execute(
            &self,
            request: &ApiRequest,
            bearer: Option<&str>,
        ) -> Result<RawResponse, ApiError> {
            if request.path == "/token/refresh/" {
                // Keep the renewal in flight long enough for every other
                // request to queue behind it.
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                return Ok(RawResponse {
                    status: StatusCode::OK,
                    body: r#"{"access": "new-access"}"#.into(),
                });
            }
            let status = if bearer == Some("new-access") {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            };
            Ok(RawResponse {
                status,
                body: "{}".into(),
            })
        }
    }

    #[tokio::test]
    async fn five_concurrent_401s_share_one_renewal() {
        let transport = Arc::new(ExpiringTransport {
            refresh_calls: AtomicUsize::new(0),
        });
        let store = Arc::new(CredentialStore::in_memory());
        store
            .set(expired_jwt(), "refresh-0".into())
            .expect("set should succeed");
        let client = ApiClient::with_transport(transport.clone(), store);

        let mut handles = Vec::new();
        for i in 0..5 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                client.send(ApiRequest::get(format!("/tareas/{}/", i))).await
            }));
            tokio::task::yield_now().await;
        }

        for result in join_all(handles).await {
            let response = result
                .expect("task should not panic")
                .expect("request should succeed");
            assert_eq!(response.status, StatusCode::OK);
        }
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
    }
}
