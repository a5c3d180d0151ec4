//! Progress-stream protocol: progress events, then exactly one terminal event.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::sse::SseDecoder;
use super::types::ProgressEvent;
use crate::error::ApiError;
use crate::types::GenerationResult;

/// What a decoded event means for the run.
enum Outcome {
    Progress(ProgressEvent),
    Done(GenerationResult),
    Failed(ApiError),
    Ignored,
}

fn interpret(payload: &str) -> Outcome {
    let event: ProgressEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(%err, payload, "skipping malformed progress event");
            return Outcome::Ignored;
        }
    };

    match event.step.as_str() {
        ProgressEvent::ERROR => Outcome::Failed(ApiError::Application {
            status: None,
            message: event.message,
        }),
        ProgressEvent::COMPLETE => match event.data {
            Some(data) if !data.is_null() => match serde_json::from_value(data) {
                Ok(result) => Outcome::Done(result),
                Err(err) => Outcome::Failed(ApiError::Protocol(format!(
                    "invalid completion payload: {err}"
                ))),
            },
            _ => {
                tracing::debug!("complete event without data; waiting");
                Outcome::Ignored
            }
        },
        _ => Outcome::Progress(event),
    }
}

/// Drives `stream` to its terminal event.
///
/// `on_progress` fires for every non-terminal event in arrival order. The
/// stream is consumed by value and dropped on every return path. Chunk errors
/// convert through `Into<ApiError>`, so a body that times out mid-stream is
/// reported as `Timeout` rather than a lost connection.
pub async fn consume_event_stream<S, E, F>(
    stream: S,
    mut on_progress: F,
) -> Result<GenerationResult, ApiError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<ApiError>,
    F: FnMut(ProgressEvent),
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| -> ApiError { err.into() })?;
        for payload in decoder.push(&chunk) {
            match interpret(&payload) {
                Outcome::Progress(event) => on_progress(event),
                Outcome::Done(result) => return Ok(result),
                Outcome::Failed(err) => return Err(err),
                Outcome::Ignored => {}
            }
        }
    }

    if decoder.pending() > 0 {
        tracing::debug!(bytes = decoder.pending(), "dropping unterminated trailing event");
    }
    Err(ApiError::Protocol("stream ended without completing".into()))
}
