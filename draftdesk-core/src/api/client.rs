use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::stream::consume_event_stream;
use super::types::{
    ErrorBody, GenerationRequest, HealthStatus, ProgressEvent, RegenerateRequest,
    RegenerateResponse,
};
use crate::error::ApiError;
use crate::types::GenerationResult;

/// Proxy upper bound on a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP client for the generation service behind the `/api` proxy.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Connectivity(err.to_string()))?;

        Ok(Self::with_http(base_url, http))
    }

    /// Wraps a preconfigured `reqwest::Client`.
    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)?;
        check_status(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await.map_err(ApiError::from)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::Protocol(format!("invalid response body: {err}")))
    }

    /// `POST /api/inspire/stream`: reports progress through `on_progress` and
    /// resolves with the terminal payload.
    pub async fn generate_stream<F>(
        &self,
        request: &GenerationRequest,
        on_progress: F,
    ) -> Result<GenerationResult, ApiError>
    where
        F: FnMut(ProgressEvent),
    {
        request.validate()?;
        tracing::info!(
            username = %request.username,
            content_type = %request.content_type,
            "starting streamed generation"
        );
        let response = self.post("/api/inspire/stream", request).await?;
        consume_event_stream(response.bytes_stream(), on_progress).await
    }

    /// `POST /api/inspire`: same contract without progress.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, ApiError> {
        request.validate()?;
        let response = self.post("/api/inspire", request).await?;
        Self::decode(response).await
    }

    /// `POST /api/inspire/regenerate`.
    pub async fn regenerate(
        &self,
        request: &RegenerateRequest,
    ) -> Result<RegenerateResponse, ApiError> {
        tracing::info!(
            research_id = %request.research_id,
            content_type = %request.content_type,
            "regenerating"
        );
        let response = self.post("/api/inspire/regenerate", request).await?;
        Self::decode(response).await
    }

    /// `GET /health` on the proxy.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(ApiError::from)?;
        let response = check_status(response).await?;
        Self::decode(response).await
    }
}

/// Maps non-2xx responses onto the error taxonomy. The proxy answers 504 on
/// timeout and 502 when the backend is unreachable.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::GATEWAY_TIMEOUT => return Err(ApiError::Timeout),
        StatusCode::BAD_GATEWAY => {
            return Err(ApiError::Connectivity(format!("proxy returned {status}")))
        }
        _ => {}
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.message(),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    };
    tracing::error!(status = status.as_u16(), %message, "service returned an error");
    Err(ApiError::Application {
        status: Some(status.as_u16()),
        message,
    })
}
