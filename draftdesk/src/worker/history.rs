//! Tokio task that owns the history journal connection.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_rusqlite::Connection;

use draftdesk_core::db;

use crate::event::AppEvent;
use crate::worker::types::HistoryRequest;

/// Entries shown in the history panel.
pub const HISTORY_PAGE: usize = 50;

/// Spawns the journal task. It runs until every `HistoryRequest` sender is
/// dropped.
pub fn spawn_history_task(
    conn: Connection,
    mut rx: UnboundedReceiver<HistoryRequest>,
    event_tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let event = match request {
                HistoryRequest::Record { meta, result } => {
                    if let Err(err) = db::record_generation(&conn, &meta, &result).await {
                        tracing::warn!(%err, "failed to journal generation");
                    }
                    AppEvent::HistoryListed(db::list_history(&conn, HISTORY_PAGE).await)
                }
                HistoryRequest::List => {
                    AppEvent::HistoryListed(db::list_history(&conn, HISTORY_PAGE).await)
                }
                HistoryRequest::Load(id) => {
                    AppEvent::HistoryLoaded(Box::new(db::load_generation(&conn, &id).await))
                }
                HistoryRequest::Clear => {
                    match db::clear_history(&conn).await {
                        Ok(removed) => tracing::info!(removed, "history cleared"),
                        Err(err) => tracing::warn!(%err, "failed to clear history"),
                    }
                    AppEvent::HistoryListed(db::list_history(&conn, HISTORY_PAGE).await)
                }
            };
            if event_tx.send(event).is_err() {
                break;
            }
        }
    });
}
