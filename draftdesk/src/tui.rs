//! Terminal setup and teardown.
//!
//! Frames go to stderr so stdout stays usable in pipelines; diagnostics go to
//! the log file, never to either stream. Besides raw mode and the alternate
//! screen, draftdesk turns on mouse capture (drag-to-select on cards) and
//! bracketed paste (tweet URLs and longer suggestions arrive as one event).

use std::io::{stderr, BufWriter, Stderr};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

/// Buffered so each frame's escape sequences leave in as few writes as possible.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Puts the terminal into draftdesk's drawing state.
///
/// # Errors
///
/// Any failure switching modes or building the `Terminal`. The caller should
/// still run [`restore_tui`], since raw mode may already be on.
pub fn init_tui() -> std::io::Result<Tui> {
    enable_raw_mode()?;
    let mut out = BufWriter::new(stderr());
    execute!(
        out,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste,
        SetTitle("draftdesk")
    )?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Undoes [`init_tui`]. Safe to call more than once.
///
/// # Errors
///
/// Any failure writing the reset sequences or leaving raw mode.
pub fn restore_tui() -> std::io::Result<()> {
    execute!(
        stderr(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    disable_raw_mode()
}

/// Chains a hook that restores the terminal and logs the panic before the
/// previous hook prints it. Install before [`init_tui`].
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_tui();
        tracing::error!(%info, "draftdesk panicked");
        previous(info);
    }));
}

/// Flag set asynchronously on SIGTERM; the event loop checks it every 50 ms.
///
/// # Errors
///
/// Returns `Err` if the handler cannot be registered.
pub fn register_sigterm() -> std::io::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&flag))?;
    Ok(flag)
}
