//! The wire seam between the dispatcher and the network.
//!
//! `ApiTransport` carries one request/response exchange and nothing else:
//! no token handling, no retries. Everything above it (bearer attachment,
//! 401 interception, renewal) is dispatcher logic and is tested against
//! in-process transports.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ApiError;
use super::request::ApiRequest;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Status and body of a completed exchange. The body is kept as text so
/// error responses can be reported without a second read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode failed: {}", e)))
    }
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Perform one exchange, attaching `bearer` as the authorization header
    /// when present. Only transport-level failures are errors; HTTP error
    /// statuses come back as a normal [`RawResponse`].
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<RawResponse, ApiError>;
}

/// Production transport backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<RawResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(method = %request.method, url = %url, status = %status, "API exchange completed");

        Ok(RawResponse { status, body })
    }
}
