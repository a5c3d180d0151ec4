//! Requests accepted by the background workers.
//!
//! All payloads are owned so they can cross from the UI loop to the worker
//! thread without borrowing `AppState`.

use draftdesk_core::api::{GenerationRequest, RegenerateRequest};
use draftdesk_core::types::{GenerationMeta, GenerationResult};

/// Commands sent over a `crossbeam_channel::Sender<ApiRequest>` to the API
/// worker thread.
#[derive(Debug)]
pub enum ApiRequest {
    /// Streamed generation; progress arrives as `AppEvent::Progress`.
    Generate(Box<GenerationRequest>),
    /// Regenerate the proposals shown on card `card`.
    Regenerate {
        card: usize,
        request: Box<RegenerateRequest>,
    },
    /// Check `GET /health`.
    Health,
}

/// Commands for the history task.
#[derive(Debug)]
pub enum HistoryRequest {
    /// Journal a finished run, then publish the refreshed list.
    Record {
        meta: GenerationMeta,
        result: Box<GenerationResult>,
    },
    /// Publish the current list.
    List,
    /// Load one entry by id.
    Load(String),
    /// Drop every entry, then publish the (empty) list.
    Clear,
}
