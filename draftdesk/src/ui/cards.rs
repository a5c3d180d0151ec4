//! Proposal cards panel (centre).
//!
//! Cards are stacked top to bottom starting at the selected one, so the card
//! being worked on always has the most room. Proposal text is wrapped by
//! display width with [`crate::wrap::layout_rows`], the same layout mouse
//! hit-testing uses; the rect of the selected card's focused item is cached in
//! `AppState::card_text_area` for selection bounds and mouse hit-testing.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
};
use similar::{ChangeTag, TextDiff};

use draftdesk_core::segment::segment;
use draftdesk_core::session::EditMode;
use draftdesk_core::store::AnnotationSet;

use crate::app::{quote, AppState, Card, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};
use crate::wrap::layout_rows;

/// Lines of one card plus where the focused item's text rows start.
struct CardBody {
    lines: Vec<Line<'static>>,
    /// `(first line index, row count)` of the focused item's text.
    focus_rows: Option<(usize, usize)>,
}

/// Groups per-char styles into wrapped lines, one span per run of equal style.
fn styled_lines(chars: &[char], styles: &[Style], width: u16) -> Vec<Line<'static>> {
    let text: String = chars.iter().collect();
    layout_rows(&text, width)
        .into_iter()
        .map(|row| {
            let mut spans: Vec<Span<'static>> = Vec::new();
            let mut run = String::new();
            let mut run_style = Style::default();
            for idx in row {
                let style = styles.get(idx).copied().unwrap_or_default();
                if style != run_style && !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style));
                }
                run_style = style;
                run.push(chars[idx]);
            }
            if !run.is_empty() {
                spans.push(Span::styled(run, run_style));
            }
            Line::from(spans)
        })
        .collect()
}

/// Base style per char with annotated runs highlighted.
fn highlighted_styles(text: &str, annotations: Option<&AnnotationSet>, theme: &Theme) -> Vec<Style> {
    let base = Style::default().fg(theme.text);
    let mut styles = vec![base; text.chars().count()];
    let Some(set) = annotations else {
        return styles;
    };
    for seg in segment(text, set.as_slice()) {
        if seg.annotation.is_some() {
            for style in styles.iter_mut().take(seg.end).skip(seg.start) {
                *style = base.bg(theme.highlight_bg);
            }
        }
    }
    styles
}

/// Inline diff of `original` against `edited`, one `-`/`+` line per changed line.
fn diff_lines(original: &str, edited: &str, width: u16, theme: &Theme) -> Vec<Line<'static>> {
    let diff = TextDiff::from_lines(original, edited);
    let mut chars: Vec<char> = Vec::new();
    let mut styles: Vec<Style> = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            let (sign, color) = match change.tag() {
                ChangeTag::Delete => ('-', theme.diff_removed),
                ChangeTag::Insert => ('+', theme.diff_added),
                ChangeTag::Equal => (' ', theme.muted),
            };
            chars.push(sign);
            styles.push(Style::default().fg(color));
            for (emphasized, value) in change.iter_strings_lossy() {
                let style = if emphasized {
                    Style::default().fg(color).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    Style::default().fg(color)
                };
                for ch in value.trim_end_matches('\n').chars() {
                    chars.push(ch);
                    styles.push(style);
                }
            }
            chars.push('\n');
            styles.push(Style::default());
        }
    }
    if chars.last() == Some(&'\n') {
        chars.pop();
        styles.pop();
    }
    styled_lines(&chars, &styles, width)
}

fn card_title(card: &Card, index: usize, total: usize, selected: bool, theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" {} {}/{} ", card.kind.label(), index + 1, total),
        if selected {
            Style::default().fg(theme.card_selected).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted)
        },
    )];
    if let Some(score) = card.proposal.virality_score {
        spans.push(Span::styled(format!("· score {score:.1} "), Style::default().fg(theme.muted)));
    }
    if let Some(mode) = card.editor.mode() {
        spans.push(Span::styled(
            format!("· {} ", mode.label().to_uppercase()),
            Style::default().fg(theme.status_mode_insert).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

/// Builds the body lines of one card at `width` columns.
fn card_body(card: &Card, width: u16, selected: bool, mode: Mode, theme: &Theme) -> CardBody {
    let items = card.proposal.content.items();
    let is_thread = card.proposal.content.is_thread();
    let session = card.editor.session();
    let editing = session.map(|s| s.mode) == Some(EditMode::Edit);
    let mut lines = Vec::new();
    let mut focus_rows = None;

    for (i, original) in items.iter().copied().enumerate() {
        let focused = selected && i == card.item;
        if is_thread {
            let label_style = if focused {
                Style::default().fg(theme.text).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted)
            };
            lines.push(Line::styled(format!("Tweet {}/{}", i + 1, items.len()), label_style));
        }

        let annotations = session.and_then(|s| s.draft.annotations(i));
        let text = if editing {
            session.and_then(|s| s.draft.edited(i)).unwrap_or(original)
        } else {
            original
        };
        let mut chars: Vec<char> = text.chars().collect();
        let mut styles = if editing {
            vec![Style::default().fg(theme.text); chars.len()]
        } else {
            highlighted_styles(text, annotations, theme)
        };

        if focused && session.is_some() {
            if editing {
                if card.edit_caret >= chars.len() {
                    chars.push(' ');
                    styles.push(Style::default());
                }
                if let Some(style) = styles.get_mut(card.edit_caret) {
                    *style = style.bg(theme.caret_bg).fg(theme.background);
                }
            } else {
                let pending = session
                    .and_then(|s| s.pending.as_ref())
                    .filter(|p| p.index == i)
                    .map(|p| (p.selection.start, p.selection.end));
                if let Some((lo, hi)) = card.selection_range().or(pending) {
                    for style in styles.iter_mut().take(hi).skip(lo) {
                        *style = style.bg(theme.selection_bg);
                    }
                }
                if mode != Mode::Suggestion {
                    if let Some(style) = styles.get_mut(card.caret) {
                        *style = style.bg(theme.caret_bg).fg(theme.background);
                    }
                }
            }
        }

        let rows = styled_lines(&chars, &styles, width);
        if focused {
            focus_rows = Some((lines.len(), rows.len()));
        }
        lines.extend(rows);
    }

    if let Some(session) = session {
        match session.mode {
            EditMode::Annotate => {
                if let Some(set) = session.draft.annotations(card.item).filter(|s| !s.is_empty()) {
                    lines.push(Line::raw(""));
                    for a in set {
                        lines.push(Line::from(vec![
                            Span::styled(
                                format!("  \"{}\" ", quote(&a.text, 30)),
                                Style::default().fg(theme.text).bg(theme.highlight_bg),
                            ),
                            Span::styled(format!(" → {}", a.suggestion), Style::default().fg(theme.muted)),
                        ]));
                    }
                }
                let total = session.draft.annotation_count();
                if total > 0 {
                    lines.push(Line::styled(
                        format!("{total} suggestion{} ready", if total == 1 { "" } else { "s" }),
                        Style::default().fg(theme.banner_info),
                    ));
                }
            }
            EditMode::Edit => {
                let original = card.original();
                let edited = card.edited();
                if original != edited {
                    lines.push(Line::styled("Changes", Style::default().fg(theme.muted)));
                    lines.extend(diff_lines(original, edited, width, theme));
                }
            }
        }
    } else if selected {
        if let Some(note) = card.proposal.virality_notes.first() {
            lines.push(Line::styled(note.clone(), Style::default().fg(theme.muted)));
        }
        if !card.proposal.followup_formats.is_empty() {
            lines.push(Line::styled(
                format!("Follow-ups: {}", card.proposal.followup_formats.join(", ")),
                Style::default().fg(theme.muted),
            ));
        }
    }

    if let Some(notice) = &card.notice {
        lines.push(Line::styled(
            notice.clone(),
            Style::default().fg(theme.banner_error).add_modifier(Modifier::BOLD),
        ));
    }

    CardBody { lines, focus_rows }
}

/// Renders the header (source tweet) and as many cards as fit, starting at
/// the selected one.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the `Rect` for the centre panel (includes borders)
/// * `state` — app state; `card_text_area` is written back for the next keypress
/// * `theme` — active color theme
pub fn render_cards(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Cards;
    frame.render_widget(panel_block(" Proposals ", is_focused, theme), area);
    let mut inner = inner_rect(area);
    state.card_text_area = Rect::default();

    if let Some(tweet) = state.result.as_ref().and_then(|r| r.original_tweet.as_ref()) {
        let header = format!("@{}: {}", tweet.author_username, tweet.text);
        let height = (layout_rows(&header, inner.width).len() as u16).min(3);
        let header_area = Rect { height, ..inner };
        frame.render_widget(
            Paragraph::new(header)
                .style(Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC))
                .wrap(Wrap { trim: false }),
            header_area,
        );
        inner.y += height + 1;
        inner.height = inner.height.saturating_sub(height + 1);
    }

    if state.cards.is_empty() {
        let message = if state.in_flight.is_some() {
            "Generating..."
        } else {
            "No proposals yet. Fill in the form and press S."
        };
        frame.render_widget(
            Paragraph::new(Line::styled(message, Style::default().fg(theme.muted))),
            inner,
        );
        return;
    }

    let total = state.cards.len();
    let mut y = inner.y;
    let bottom = inner.y + inner.height;
    let text_width = inner.width.saturating_sub(2);

    for index in state.selected_card..total {
        if y + 2 >= bottom {
            break;
        }
        let card = &state.cards[index];
        let selected = index == state.selected_card;
        let body = card_body(card, text_width, selected, state.mode, theme);
        let height = (body.lines.len() as u16 + 2).min(bottom - y);
        let card_area = Rect::new(inner.x, y, inner.width, height);
        let border = if selected && is_focused {
            Style::default().fg(theme.card_selected)
        } else {
            Style::default().fg(theme.border_inactive)
        };
        let block = Block::bordered()
            .title(card_title(card, index, total, selected, theme))
            .border_style(border);
        let body_area = block.inner(card_area);
        frame.render_widget(block, card_area);
        frame.render_widget(Paragraph::new(body.lines), body_area);

        if selected {
            if let Some((first, rows)) = body.focus_rows {
                let top = body_area.y + first as u16;
                if top < body_area.y + body_area.height {
                    let visible = (rows as u16).min(body_area.y + body_area.height - top);
                    state.card_text_area = Rect::new(body_area.x, top, body_area.width, visible);
                }
            }
        }
        y += height;
    }

    if state.mode == Mode::Suggestion {
        render_popover(frame, area, state, theme);
    }
}

/// Draws the suggestion input just below (or above) the pending selection.
fn render_popover(frame: &mut Frame, panel: Rect, state: &AppState, theme: &Theme) {
    let Some(session) = state.selected().and_then(|c| c.editor.session()) else {
        return;
    };
    let Some(pending) = &session.pending else {
        return;
    };
    let origin = state.card_text_area;
    let anchor = pending.selection.popover;
    let height = 3;
    let width = 44u16.min(panel.width.saturating_sub(2)).max(10);
    let x = (origin.x + anchor.x).min((panel.x + panel.width).saturating_sub(width));
    let below = origin.y + anchor.y + anchor.height;
    let y = if below + height <= panel.y + panel.height {
        below
    } else {
        (origin.y + anchor.y).saturating_sub(height)
    };
    let popover = Rect::new(x, y, width, height).intersection(frame.area());

    let block = Block::bordered()
        .title(format!(" Suggestion for \"{}\" ", quote(&pending.selection.text, 20)))
        .border_style(Style::default().fg(theme.border_active));
    let input = Line::from(vec![
        Span::styled(session.suggestion_draft.clone(), Style::default().fg(theme.text)),
        Span::styled(" ", Style::default().bg(theme.caret_bg)),
    ]);
    frame.render_widget(Clear, popover);
    frame.render_widget(Paragraph::new(input).block(block), popover);
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftdesk_core::types::Annotation;

    #[test]
    fn runs_split_on_style_changes() {
        let theme = Theme::dark();
        let mut set = AnnotationSet::new();
        set.add(Annotation::new(2, 6, "love", "x")).unwrap();
        let text = "I love cats";
        let styles = highlighted_styles(text, Some(&set), &theme);
        let chars: Vec<char> = text.chars().collect();
        let lines = styled_lines(&chars, &styles, 40);
        assert_eq!(lines.len(), 1);
        let contents: Vec<&str> = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(contents, vec!["I ", "love", " cats"]);
    }

    #[test]
    fn diff_marks_changed_lines() {
        let theme = Theme::dark();
        let lines = diff_lines("hello world", "hello there", 40, &theme);
        let rendered: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(rendered, vec!["-hello world", "+hello there"]);
    }
}
