//! Wire types for the generation service.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{ContentType, Proposals};

pub const MIN_THREAD_COUNT: u8 = 2;
pub const MAX_THREAD_COUNT: u8 = 20;

/// Body of `POST /api/inspire` and `POST /api/inspire/stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub content_type: ContentType,
    pub thread_count: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_file: Option<String>,
    pub deep_research: bool,
    pub use_full_content: bool,
}

impl GenerationRequest {
    pub fn new(username: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            username: username.into(),
            tweet_url: None,
            topic: None,
            content_type,
            thread_count: 5,
            vibe: None,
            context: None,
            profile_file: None,
            deep_research: false,
            use_full_content: false,
        }
    }

    /// Rejects requests the service would refuse, before anything is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::MissingUsername);
        }
        let has_url = self.tweet_url.as_deref().is_some_and(|u| !u.trim().is_empty());
        let has_topic = self.topic.as_deref().is_some_and(|t| !t.trim().is_empty());
        if self.content_type != ContentType::Tweet && !has_url {
            return Err(ValidationError::MissingTweetUrl(self.content_type));
        }
        if !has_url && !has_topic {
            return Err(ValidationError::MissingSource);
        }
        if !(MIN_THREAD_COUNT..=MAX_THREAD_COUNT).contains(&self.thread_count) {
            return Err(ValidationError::ThreadCountOutOfRange(self.thread_count));
        }
        Ok(())
    }
}

/// Body of `POST /api/inspire/regenerate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerateRequest {
    pub research_id: String,
    pub content_type: ContentType,
    pub thread_count: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegenerateResponse {
    #[serde(default)]
    pub proposals: Proposals,
}

/// One decoded stream event. `data` is only meaningful on `complete`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressEvent {
    pub step: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ProgressEvent {
    pub const COMPLETE: &'static str = "complete";
    pub const ERROR: &'static str = "error";
}

/// FastAPI error body: `detail` is a string for `HTTPException`s and a list
/// of field errors for request validation failures.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Response of `GET /health` on the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
