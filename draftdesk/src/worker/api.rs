//! Background thread that owns the generation-service client.
//!
//! The thread builds a current-thread tokio runtime and drives each request to
//! completion before taking the next one from the channel. Results go back to
//! the UI loop as `AppEvent`s.

use crossbeam_channel::Receiver;
use tokio::sync::mpsc::UnboundedSender;

use draftdesk_core::api::ApiClient;

use crate::event::AppEvent;
use crate::worker::types::ApiRequest;

/// Entry point for the API worker thread.
///
/// Loops over incoming `ApiRequest`s until the channel is closed (sender
/// dropped). A runtime that fails to build ends the thread; the UI then sees
/// every request silently dropped, so the failure is logged.
pub fn api_worker_loop(
    client: ApiClient,
    rx: Receiver<ApiRequest>,
    event_tx: UnboundedSender<AppEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!(%err, "api worker could not start its runtime");
            return;
        }
    };

    for request in rx {
        let event = runtime.block_on(handle_request(&client, request, &event_tx));
        if event_tx.send(event).is_err() {
            break;
        }
    }
    tracing::debug!("api worker exiting");
}

/// Runs one request and returns the event carrying its outcome.
async fn handle_request(
    client: &ApiClient,
    request: ApiRequest,
    event_tx: &UnboundedSender<AppEvent>,
) -> AppEvent {
    match request {
        ApiRequest::Generate(request) => {
            let progress_tx = event_tx.clone();
            let result = client
                .generate_stream(&request, move |event| {
                    let _ = progress_tx.send(AppEvent::Progress(event));
                })
                .await;
            if let Err(err) = &result {
                tracing::warn!(%err, kind = ?err.kind(), "generation failed");
            }
            AppEvent::Generated(Box::new(result))
        }
        ApiRequest::Regenerate { card, request } => {
            let result = client.regenerate(&request).await;
            if let Err(err) = &result {
                tracing::warn!(%err, card, "regeneration failed");
            }
            AppEvent::Regenerated {
                card,
                result: Box::new(result),
            }
        }
        ApiRequest::Health => AppEvent::Health(client.health().await),
    }
}
