//! The single event channel the main loop reads from.
//!
//! Terminal input, the render and spinner timers, and every worker result
//! arrive as one `AppEvent`. Renders fire at about 30 FPS; ticks every 250 ms
//! advance the progress spinner.

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;

use draftdesk_core::api::types::HealthStatus;
use draftdesk_core::api::{ProgressEvent, RegenerateResponse};
use draftdesk_core::error::{ApiError, HistoryError};
use draftdesk_core::types::{GenerationResult, HistoryEntry, HistorySummary};

const RENDER_EVERY: Duration = Duration::from_millis(33);
const TICK_EVERY: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub enum AppEvent {
    /// Key press; repeats and releases are filtered out.
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Text delivered by bracketed paste.
    Paste(String),
    /// New terminal size (columns, rows).
    Resize(u16, u16),
    Tick,
    Render,
    /// Non-terminal event from a streamed generation.
    Progress(ProgressEvent),
    /// Terminal outcome of a generation request.
    Generated(Box<Result<GenerationResult, ApiError>>),
    /// Outcome of a regenerate request for the card at `card`.
    Regenerated {
        card: usize,
        result: Box<Result<RegenerateResponse, ApiError>>,
    },
    /// Startup health check.
    Health(Result<HealthStatus, ApiError>),
    /// Fresh history list from the journal task.
    HistoryListed(Result<Vec<HistorySummary>, HistoryError>),
    /// A journal entry the user asked to reopen.
    HistoryLoaded(Box<Result<Option<HistoryEntry>, HistoryError>>),
    /// Terminal input ended; the loop should shut down.
    Quit,
}

/// Both ends of the event channel. Workers get clones of `tx`.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps one crossterm event onto the app's vocabulary.
fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Paste(text) => Some(AppEvent::Paste(text)),
        Event::Resize(cols, rows) => Some(AppEvent::Resize(cols, rows)),
        _ => None,
    }
}

/// Spawns the input and timer task.
///
/// The task ends once the main loop drops its receiver. If the terminal input
/// stream closes it sends `Quit` first.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut ticks = interval(TICK_EVERY);
        let mut renders = interval(RENDER_EVERY);
        let mut input = EventStream::new();

        loop {
            let event = tokio::select! {
                _ = ticks.tick() => Some(AppEvent::Tick),
                _ = renders.tick() => Some(AppEvent::Render),
                read = input.next().fuse() => match read {
                    Some(Ok(event)) => translate(event),
                    Some(Err(err)) => {
                        tracing::warn!(%err, "terminal input error");
                        None
                    }
                    None => Some(AppEvent::Quit),
                },
            };
            let Some(event) = event else {
                continue;
            };
            let quit = matches!(event, AppEvent::Quit);
            if tx.send(event).is_err() || quit {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    #[test]
    fn only_presses_and_pastes_pass_through() {
        let press = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let release = KeyEvent {
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
            ..press
        };
        assert!(matches!(translate(Event::Key(press)), Some(AppEvent::Key(_))));
        assert!(translate(Event::Key(release)).is_none());
        assert!(matches!(
            translate(Event::Paste("https://x.com/a/status/1".into())),
            Some(AppEvent::Paste(text)) if text.ends_with("/1")
        ));
        assert!(translate(Event::FocusLost).is_none());
    }
}
