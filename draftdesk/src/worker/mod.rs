//! Background workers for draftdesk.
//!
//! `api` owns the HTTP client on a dedicated `std::thread` with its own
//! single-threaded runtime and serves one request at a time, so at most one
//! generation or regeneration is ever in flight. `history` is a tokio task that
//! owns the journal connection.
pub mod api;
pub mod history;
pub mod types;
