//! Error taxonomy for draftdesk.
//!
//! Four families matter to the user: the service could not be reached
//! (`Connectivity`, plus the proxy's `Timeout`), the service spoke a broken
//! protocol (`Protocol`), the service reported a failure (`Application`), or
//! the input never left the client (`Validation`).

use crate::types::ContentType;

/// Coarse classification used to pick banner wording in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connectivity,
    Timeout,
    Protocol,
    Application,
    Validation,
}

/// Failure of a generation, regeneration, or health call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("cannot reach the generation service: {0}")]
    Connectivity(String),

    #[error("request timed out")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{message}")]
    Application { status: Option<u16>, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Connectivity(_) => ErrorKind::Connectivity,
            ApiError::Timeout => ErrorKind::Timeout,
            ApiError::Protocol(_) => ErrorKind::Protocol,
            ApiError::Application { .. } => ErrorKind::Application,
            ApiError::Validation(_) => ErrorKind::Validation,
        }
    }
}

/// Transport failures. A timeout, whether on connect or while the body is
/// still streaming, stays `Timeout`.
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Connectivity(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => ApiError::Timeout,
            _ => ApiError::Connectivity(err.to_string()),
        }
    }
}

/// Request-form problems caught before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("username is required")]
    MissingUsername,

    #[error("a tweet URL is required for {0} content")]
    MissingTweetUrl(ContentType),

    #[error("provide a tweet URL or a topic")]
    MissingSource,

    #[error("thread count must be between 2 and 20 (got {0})")]
    ThreadCountOutOfRange(u8),
}

/// Rejection of a candidate annotation by the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
    #[error("suggestion text is empty")]
    EmptySuggestion,

    #[error("selection is empty")]
    EmptyRange,

    #[error("selection overlaps annotation {0}")]
    Overlap(String),

    #[error("no thread item at index {0}")]
    NoSuchItem(usize),
}

/// Why a regenerate submission was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("card is not being edited")]
    NotOpen,

    #[error("nothing to submit yet")]
    NothingToSubmit,

    #[error("a request is already in flight")]
    RequestInFlight,

    #[error("this result has no research id to regenerate from")]
    MissingResearchId,
}

/// Failure reading or writing the local history journal.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Db(#[from] tokio_rusqlite::Error),

    #[error("history entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
