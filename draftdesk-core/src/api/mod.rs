pub mod client;
pub mod sse;
pub mod stream;
pub mod types;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use stream::consume_event_stream;
pub use types::{GenerationRequest, ProgressEvent, RegenerateRequest, RegenerateResponse};
