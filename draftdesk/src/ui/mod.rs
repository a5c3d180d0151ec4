//! UI rendering module for draftdesk.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each
//! panel has its own module.

mod layout;
pub mod cards;
pub mod form;
pub mod help;
pub mod history;
pub mod keybindings;

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Clear, Paragraph},
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, render_status_bar};

/// Renders one complete frame: form, cards, history, status bar and any overlay.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()`. Panel
/// rects and the selected card's text area are written back into `state` so the
/// next mouse event and selection can be mapped onto the screen that was drawn.
///
/// # Arguments
///
/// * `frame` — current render frame provided by `terminal.draw()`
/// * `state` — mutable reference to app state (geometry is cached here)
/// * `theme` — active color theme
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [left, center, right, status_bar] = compute_layout(frame, state);
    state.panel_rects = [left, center, right];

    if left.width > 0 {
        form::render_form(frame, left, state, theme);
    }
    if center.width > 0 {
        cards::render_cards(frame, center, state, theme);
    } else {
        state.card_text_area = ratatui::layout::Rect::default();
    }
    if right.width > 0 {
        history::render_history(frame, right, state, theme);
    }

    render_status_bar(frame, status_bar, state, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::ConfirmQuit => render_confirm_quit(frame, state, theme),
        _ => {}
    }
}

/// Small centred dialog asking whether to drop open sessions and quit.
fn render_confirm_quit(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Length(48), Constraint::Length(5));
    let reason = if state.in_flight.is_some() {
        "A request is still running."
    } else {
        "Open cards have unsent feedback."
    };
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(vec![
            Line::raw(reason),
            Line::styled("Quit anyway? (y/n)", Style::default().add_modifier(Modifier::BOLD)),
        ])
        .block(
            Block::bordered()
                .title(" Quit ")
                .border_style(Style::default().fg(theme.banner_error)),
        ),
        area,
    );
}
