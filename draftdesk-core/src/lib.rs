//! Annotation engine, generation-service client, and history journal for
//! draftdesk.

pub mod api;
pub mod db;
pub mod error;
pub mod payload;
pub mod resolver;
pub mod schema;
pub mod segment;
pub mod session;
pub mod store;
pub mod text;
pub mod types;
