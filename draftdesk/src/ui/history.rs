//! History panel (right): previous runs, newest first.

use std::time::{SystemTime, UNIX_EPOCH};

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Compact age of a Unix timestamp relative to `now`: `just now`, `5m`, `3h`, `2d`.
pub fn relative_age(created_at: i64, now: i64) -> String {
    let secs = (now - created_at).max(0);
    match secs {
        0..60 => "just now".to_owned(),
        60..3_600 => format!("{}m", secs / 60),
        3_600..86_400 => format!("{}h", secs / 3_600),
        _ => format!("{}d", secs / 86_400),
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Renders the journal list with a two-line item per entry.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the `Rect` for the right panel (includes borders)
/// * `state` — app state; the `ListState` is mutated by ratatui to keep the
///   selection in view
/// * `theme` — active color theme
pub fn render_history(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::History;
    let title = format!(" History ({}) ", state.history.len());
    frame.render_widget(panel_block(title, is_focused, theme), area);
    let inner = inner_rect(area);

    if state.history.is_empty() {
        frame.render_widget(
            List::new(vec![ListItem::new(Line::styled(
                "No saved runs yet",
                Style::default().fg(theme.muted),
            ))]),
            inner,
        );
        return;
    }

    let now = now_secs();
    let width = inner.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = state
        .history
        .iter()
        .map(|entry| {
            let header = Line::from(vec![
                Span::styled(
                    format!("@{} ", entry.username),
                    Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{} · {}", entry.content_type.label(), relative_age(entry.created_at, now)),
                    Style::default().fg(theme.muted),
                ),
            ]);
            let preview: String = entry.preview.chars().take(width).collect();
            ListItem::new(vec![header, Line::styled(preview, Style::default().fg(theme.muted))])
        })
        .collect();

    let highlight = if is_focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let list = List::new(items).highlight_style(highlight);
    frame.render_stateful_widget(list, inner, &mut state.history_state);
}
