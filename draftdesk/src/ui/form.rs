//! Request form panel (left).

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, FormField, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

fn checkbox(on: bool) -> &'static str {
    if on { "[x]" } else { "[ ]" }
}

/// Renders one line per form field plus the submit hint.
///
/// The selected field is reversed while the panel has focus; in `FormInsert`
/// mode a block caret trails its value.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the `Rect` for the left panel (includes borders)
/// * `state` — read-only app state supplying the form and mode
/// * `theme` — active color theme
pub fn render_form(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Form;
    frame.render_widget(panel_block(" Generate ", is_focused, theme), area);
    let inner = inner_rect(area);
    let form = &state.form;

    let mut lines: Vec<Line> = Vec::with_capacity(FormField::ALL.len() + 2);
    for field in FormField::ALL {
        let value = match field {
            FormField::ContentType => format!("< {} >", form.content_type.label()),
            FormField::ThreadCount => format!("< {} >", form.thread_count),
            FormField::DeepResearch => checkbox(form.deep_research).to_owned(),
            FormField::FullContent => checkbox(form.use_full_content).to_owned(),
            _ => form.text(field).unwrap_or_default().to_owned(),
        };
        let selected = is_focused && form.field == field;
        let label_style = if selected {
            Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted)
        };
        let mut spans = vec![
            Span::styled(format!("{:<13}", field.label()), label_style),
            Span::styled(value, Style::default().fg(theme.text)),
        ];
        if selected && state.mode == Mode::FormInsert {
            spans.push(Span::styled(" ", Style::default().bg(theme.caret_bg)));
        }
        let line = Line::from(spans);
        lines.push(if selected && state.mode != Mode::FormInsert {
            line.patch_style(Style::default().add_modifier(Modifier::REVERSED))
        } else {
            line
        });
    }

    lines.push(Line::raw(""));
    let submit = if state.in_flight.is_some() {
        Span::styled("  generating...", Style::default().fg(theme.muted))
    } else {
        Span::styled("  S  generate", Style::default().fg(theme.banner_info))
    };
    lines.push(Line::from(submit));

    frame.render_widget(Paragraph::new(lines), inner);
}
