//! Help overlay renderer for draftdesk.
//!
//! Draws a centred modal box over the panel layout using ratatui's `Clear`
//! widget to erase the background first, inside the same `terminal.draw()`
//! closure as all other panels.

use ratatui::{
    Frame,
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay as a centred modal on top of the 3-panel layout.
///
/// Skipped on terminals narrower than 60 columns to avoid a zero-height `Rect`.
///
/// # Arguments
///
/// * `frame` — current render frame provided by `terminal.draw()`
/// * `theme` — active color theme (supplies `border_active` for the modal border)
/// * `help_scroll` — vertical scroll offset; j/k in HelpOverlay mode mutate this field
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help: j/k scroll, ? or Esc to dismiss ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

/// Builds the help text as a multi-line `Text` value, grouped by panel.
fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Panels"),
        Line::from("  H / L         Move focus left / right"),
        Line::from("  < / >         Shrink / grow the cards panel"),
        Line::from("  S             Generate from the form"),
        Line::from(""),
        Line::from("Form"),
        Line::from("  j / k         Next / previous field"),
        Line::from("  Enter         Edit a text field (Enter or Esc to finish)"),
        Line::from("  h / l         Cycle type, change thread size"),
        Line::from("  Space         Toggle deep research / full content"),
        Line::from(""),
        Line::from("Cards"),
        Line::from("  j / k         Next / previous card"),
        Line::from("  a / e         Open in annotate / edit mode"),
        Line::from("  Tab           Switch between annotate and edit"),
        Line::from("  Esc           Discard the open session"),
        Line::from("  Ctrl-r        Regenerate with your feedback"),
        Line::from(""),
        Line::from("Annotate"),
        Line::from("  h / l         Move caret (also arrows)"),
        Line::from("  w / b         Next / previous word"),
        Line::from("  0 / $         Start / end of text"),
        Line::from("  J / K         Next / previous thread item"),
        Line::from("  v             Start or drop a selection"),
        Line::from("  Enter         Suggest a change for the selection"),
        Line::from("  mouse drag    Select text, release to suggest"),
        Line::from("  x             Remove the annotation under the caret"),
        Line::from(""),
        Line::from("Edit"),
        Line::from("  typing        Edits the draft; Enter inserts a newline"),
        Line::from("  arrows        Move caret; Up / Down switch thread items"),
        Line::from("  Home / End    Start / end of text"),
        Line::from(""),
        Line::from("History"),
        Line::from("  j / k         Move selection"),
        Line::from("  Enter         Reopen the entry"),
        Line::from("  D             Clear all entries"),
        Line::from(""),
        Line::from("General"),
        Line::from("  paste         Inserts into the field, suggestion or draft being typed"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q             Quit (confirms if a card is open)"),
    ])
}
