//! draftdesk: annotate and regenerate AI-drafted social posts in the terminal.
//!
//! Entry point for the `draftdesk` binary. Wires together configuration
//! (`config`), the terminal lifecycle (`tui`), the unified event bus (`event`),
//! the background workers (`worker`), the UI (`ui`) and the theme system
//! (`theme`).
//!
//! # Startup sequence
//!
//! 1. Parse flags, read `config.toml`, start file logging.
//! 2. Open the history database and build the API client. Both can fail, so
//!    they run before the terminal is touched and errors print normally.
//! 3. `install_panic_hook()` then `register_sigterm()`.
//! 4. `init_tui()` enters alternate screen and enables raw mode.
//! 5. Spawn the event task, the history task and the API worker thread, then
//!    queue the initial history listing and health check.
//!
//! `restore_tui()` is called after the event loop exits (quit key, SIGTERM,
//! draw failure, or channel close). The panic hook covers unexpected panics.

mod app;
mod config;
mod event;
mod theme;
mod tui;
mod ui;
mod worker;
mod wrap;

use std::path::Path;
use std::sync::atomic::Ordering;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use draftdesk_core::api::ApiClient;

use crate::event::AppEvent;
use crate::ui::keybindings::{handle_key, handle_mouse, handle_paste, KeyAction};
use crate::worker::types::{ApiRequest, HistoryRequest};

/// Installs the file subscriber. The terminal belongs to the UI, so nothing
/// is logged to stdout or stderr.
fn init_logging(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(log_dir, "draftdesk.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "draftdesk=info,draftdesk_core=info,warn".into()
        }))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    guard
}

fn other_error(err: impl std::error::Error + Send + Sync + 'static) -> std::io::Error {
    std::io::Error::other(err)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Step 1: configuration and logging.
    let cli = config::Cli::parse();
    let config_file = cli.config.clone().unwrap_or_else(config::config_path);
    let (file_config, config_error) = match config::load_file(&config_file) {
        config::Loaded::Invalid(err) => (config::FileConfig::default(), Some(err)),
        loaded => (loaded.into_config(), None),
    };
    let settings = config::Settings::merge(cli, file_config);

    std::fs::create_dir_all(&settings.log_dir)?;
    let _log_guard = init_logging(&settings.log_dir);
    if let Some(err) = config_error {
        tracing::warn!(path = %config_file.display(), %err, "config parse error, using defaults");
    }
    tracing::info!(
        api_url = %settings.api_url,
        log = %settings.log_dir.join("draftdesk.log").display(),
        "starting draftdesk"
    );

    let theme = theme::Theme::from_name(&settings.theme);

    // Step 2: history database and API client.
    if let Some(parent) = settings.history_db.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = draftdesk_core::db::open_db(&settings.history_db.to_string_lossy())
        .await
        .map_err(other_error)?;
    let client = ApiClient::new(&settings.api_url, settings.timeout).map_err(other_error)?;

    // Step 3: panic hook first, then the SIGTERM flag polled by the heartbeat arm.
    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;

    // Step 4: enter alternate screen and raw mode.
    let mut terminal = tui::init_tui()?;

    // Step 5: event bus and workers.
    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let (history_tx, history_rx) = tokio::sync::mpsc::unbounded_channel();
    worker::history::spawn_history_task(conn, history_rx, handler.tx.clone());

    let (api_tx, api_rx) = crossbeam_channel::unbounded();
    let api_event_tx = handler.tx.clone();
    std::thread::Builder::new()
        .name("draftdesk-api".to_owned())
        .spawn(move || worker::api::api_worker_loop(client, api_rx, api_event_tx))?;

    let _ = history_tx.send(HistoryRequest::List);
    let _ = api_tx.send(ApiRequest::Health);

    let mut state = app::AppState {
        api_tx: Some(api_tx),
        history_tx: Some(history_tx),
        ..Default::default()
    };
    state.form.username = settings.username.clone();

    // Event loop. Exits only via `break` so `restore_tui()` is always reached.
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: SIGTERM is checked at least every 50ms even when no
            // other event arrives.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        // Exactly one draw() call per Render event, never elsewhere.
                        if let Err(err) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            tracing::error!(%err, "draw failed");
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Mouse(mouse)) => {
                        if handle_mouse(mouse, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Paste(text)) => {
                        handle_paste(&text, &mut state);
                    }
                    // frame.area() picks up the new size on the next Render.
                    Some(AppEvent::Resize(_, _)) => {}
                    Some(AppEvent::Tick) => state.on_tick(),
                    Some(AppEvent::Progress(progress)) => state.apply_progress(progress),
                    Some(AppEvent::Generated(outcome)) => state.apply_generated(*outcome),
                    Some(AppEvent::Regenerated { card, result }) => {
                        state.apply_regenerated(card, *result);
                    }
                    Some(AppEvent::Health(outcome)) => state.apply_health(outcome),
                    Some(AppEvent::HistoryListed(outcome)) => state.apply_history(outcome),
                    Some(AppEvent::HistoryLoaded(outcome)) => state.apply_history_entry(*outcome),
                    Some(AppEvent::Quit) | None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    // Dropping the senders lets both workers wind down.
    state.api_tx = None;
    state.history_tx = None;

    tui::restore_tui()?;
    tracing::info!("draftdesk exiting");
    Ok(())
}
