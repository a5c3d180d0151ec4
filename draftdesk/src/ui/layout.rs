//! Responsive 3-panel layout engine for draftdesk.
//!
//! Pure layout arithmetic plus the shared panel chrome. Called inside
//! `terminal.draw()` on every render so every frame reflects the current
//! terminal size.
//!
//! # Panel geometry
//!
//! At `>= 100` columns the form, cards and history panels are all visible with
//! widths driven by `AppState.left_pct / center_pct / right_pct` (defaults
//! 25 / 50 / 25). Below that only the focused panel is shown, full width.
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes adjacent panel borders share a single column.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Banner, Mode, PanelFocus};
use crate::theme::Theme;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Returns `[left, center, right, status_bar]` panel `Rect`s for the current frame.
///
/// | Terminal width | Layout |
/// |----------------|--------|
/// | `< 100` cols   | Focused panel only, full width |
/// | `>= 100` cols  | 3-panel split using `state.left_pct / center_pct / right_pct` |
///
/// # Arguments
///
/// * `frame` — current render frame (provides `frame.area()` with live terminal size)
/// * `state` — read-only app state supplying panel widths and focus
pub fn compute_layout(frame: &Frame, state: &AppState) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let horizontal = if term_width >= 100 {
        Layout::horizontal([
            Constraint::Percentage(state.left_pct),
            Constraint::Percentage(state.center_pct),
            Constraint::Percentage(state.right_pct),
        ])
        .spacing(Spacing::Overlap(1))
    } else {
        let pick = |panel: PanelFocus| {
            if state.focus == panel {
                Constraint::Fill(1)
            } else {
                Constraint::Length(0)
            }
        };
        Layout::horizontal([
            pick(PanelFocus::Form),
            pick(PanelFocus::Cards),
            pick(PanelFocus::History),
        ])
    };

    let [left, center, right] = main_area.layout(&horizontal);

    [left, center, right, status_bar]
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border on each side.
///
/// # Arguments
///
/// * `area` — the outer `Rect` of the panel (including borders)
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// Applies `BorderType::Thick` when the panel is focused and `BorderType::Plain`
/// otherwise. `MergeStrategy::Fuzzy` because `Exact` produces broken junctions
/// when `Thick` and `Plain` borders meet.
///
/// # Arguments
///
/// * `title` — panel title shown in the top border
/// * `is_focused` — `true` when this panel has keyboard focus
/// * `theme` — active color theme (supplies `border_active` / `border_inactive`)
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Key hints for the current mode and focus.
fn hints(state: &AppState) -> String {
    match state.mode {
        Mode::FormInsert => "type, Enter/Esc done".to_owned(),
        Mode::Suggestion => "type suggestion, Enter add, Esc dismiss".to_owned(),
        Mode::CardEdit => match state.submit_blocker() {
            Some(why) => format!("Tab annotate, Esc cancel, Ctrl-r disabled: {why}"),
            None => "Tab annotate, Esc cancel, Ctrl-r regenerate".to_owned(),
        },
        Mode::HelpOverlay => "j/k scroll, ? close".to_owned(),
        Mode::ConfirmQuit => "y quit, n stay".to_owned(),
        Mode::Normal => match state.focus {
            PanelFocus::Form => "j/k field, Enter edit, h/l adjust, S generate, ? help".to_owned(),
            PanelFocus::History => "j/k move, Enter open, D clear".to_owned(),
            PanelFocus::Cards => match state.selected().and_then(|c| c.editor.mode()) {
                None => "j/k card, a annotate, e edit".to_owned(),
                Some(_) => match state.submit_blocker() {
                    Some(why) => format!("v select, Enter suggest, x remove, Ctrl-r disabled: {why}"),
                    None => "v select, Enter suggest, x remove, Ctrl-r regenerate".to_owned(),
                },
            },
        },
    }
}

/// Renders the 1-row status bar at the bottom of the terminal.
///
/// Shows the mode indicator, then the banner (progress, info or error), then
/// key hints for the current context. Never renders blank.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the 1-row `Rect` returned by `compute_layout` (index 3)
/// * `state` — read-only app state supplying mode, banner and focus
/// * `theme` — active color theme
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::FormInsert => (" INSERT ", theme.status_mode_insert),
        Mode::CardEdit => (" EDIT ", theme.status_mode_insert),
        Mode::Suggestion => (" SUGGEST ", theme.status_mode_insert),
        Mode::Normal | Mode::ConfirmQuit | Mode::HelpOverlay => {
            match state.selected().and_then(|c| c.editor.mode()) {
                Some(_) if state.focus == PanelFocus::Cards => (" ANNOTATE ", theme.status_mode_normal),
                _ => (" NORMAL ", theme.status_mode_normal),
            }
        }
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    match &state.banner {
        Banner::Idle => {}
        Banner::Info(message) => {
            spans.push(Span::styled(format!(" {message} "), Style::default().fg(theme.banner_info)));
        }
        Banner::Progress { step, message, progress } => {
            let spin = SPINNER[state.spinner % SPINNER.len()];
            let pct = progress
                .map(|p| format!(" {:>3.0}%", p.clamp(0.0, 100.0)))
                .unwrap_or_default();
            spans.push(Span::styled(
                format!(" {spin}{pct} [{step}] {message} "),
                Style::default().fg(theme.banner_info),
            ));
        }
        Banner::Error(message) => {
            spans.push(Span::styled(
                format!(" {message} "),
                Style::default().fg(theme.banner_error).add_modifier(Modifier::BOLD),
            ));
        }
    }

    spans.push(Span::raw(" "));
    spans.push(Span::raw(hints(state)));

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
