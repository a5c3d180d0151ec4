//! Keybinding dispatcher for draftdesk.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue or quit. The dispatcher
//! branches first on `state.mode` so every mode has an isolated handler, then on
//! `state.focus` for Normal mode.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use draftdesk_core::session::EditMode;

use crate::app::{AppState, Mode, PanelFocus};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Continue the event loop normally.
    Continue,
    /// Exit cleanly.
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
///
/// # Arguments
///
/// * `key`   — the raw crossterm key event (code + modifiers)
/// * `state` — mutable reference to all UI state
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::FormInsert => handle_form_insert(key, state),
        Mode::CardEdit => handle_card_edit(key, state),
        Mode::Suggestion => handle_suggestion(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

/// Handles a key event while in Normal mode.
///
/// Panel-specific keys are tried first; global keys (focus, resize, help,
/// generate, quit) apply from any panel.
///
/// # Arguments
///
/// * `key`   — the raw crossterm key event
/// * `state` — mutable reference to all UI state
fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let consumed = match state.focus {
        PanelFocus::Form => handle_form_key(key, state),
        PanelFocus::Cards => handle_card_key(key, state),
        PanelFocus::History => handle_history_key(key, state),
    };
    if let Some(action) = consumed {
        return action;
    }

    match key.code {
        // Panel focus
        KeyCode::Char('H') => {
            state.focus = state.focus.prev();
            KeyAction::Continue
        }
        KeyCode::Char('L') => {
            state.focus = state.focus.next();
            KeyAction::Continue
        }

        // Cards panel resize
        KeyCode::Char('<') => { state.shrink_cards_panel(); KeyAction::Continue }
        KeyCode::Char('>') => { state.grow_cards_panel(); KeyAction::Continue }

        KeyCode::Char('S') => { state.submit_generation(); KeyAction::Continue }

        // Help overlay
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }

        // Quit / confirm-quit
        KeyCode::Char('q') => {
            if state.any_card_open() || state.in_flight.is_some() {
                state.mode = Mode::ConfirmQuit;
                KeyAction::Continue
            } else {
                KeyAction::Quit
            }
        }

        _ => KeyAction::Continue,
    }
}

/// Form navigation: j/k move between fields, Enter edits or toggles, h/l adjust.
///
/// Returns `Some(KeyAction)` when the key was consumed, `None` when the key
/// should fall through to the global Normal handler.
fn handle_form_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.form.select_next(),
        KeyCode::Char('k') | KeyCode::Up => state.form.select_prev(),
        KeyCode::Char('h') | KeyCode::Left => state.form.adjust(false),
        KeyCode::Char('l') | KeyCode::Right => state.form.adjust(true),
        KeyCode::Char(' ') => state.form.toggle(),
        KeyCode::Enter if state.form.field.is_text() => state.mode = Mode::FormInsert,
        KeyCode::Enter => state.form.adjust(true),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

/// Card keys. With the selected card closed: j/k select, a/e open. With an
/// annotate session open: caret, selection and annotation keys as well.
fn handle_card_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Keys that work whether or not the card is open.
    match key.code {
        KeyCode::Char('r') if ctrl => {
            state.submit_regenerate();
            return Some(KeyAction::Continue);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.next_card();
            return Some(KeyAction::Continue);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.prev_card();
            return Some(KeyAction::Continue);
        }
        KeyCode::Char('a') => {
            state.open_card(EditMode::Annotate);
            return Some(KeyAction::Continue);
        }
        KeyCode::Char('e') => {
            state.open_card(EditMode::Edit);
            return Some(KeyAction::Continue);
        }
        _ => {}
    }

    let open = state.selected().is_some_and(|c| c.editor.is_open());
    if !open {
        return None;
    }

    match key.code {
        KeyCode::Tab => state.toggle_card_mode(),
        KeyCode::Esc => state.cancel_card(),
        KeyCode::Enter => state.begin_suggestion(),
        _ => {
            let card = state.selected_mut()?;
            match key.code {
                KeyCode::Char('h') | KeyCode::Left => card.caret_left(),
                KeyCode::Char('l') | KeyCode::Right => card.caret_right(),
                KeyCode::Char('w') => card.word_forward(),
                KeyCode::Char('b') => card.word_backward(),
                KeyCode::Char('0') | KeyCode::Home => card.caret_home(),
                KeyCode::Char('$') | KeyCode::End => card.caret_end(),
                KeyCode::Char('J') => card.focus_item(true),
                KeyCode::Char('K') => card.focus_item(false),
                KeyCode::Char('v') => card.toggle_anchor(),
                KeyCode::Char('x') => {
                    card.remove_annotation_at_caret();
                }
                _ => return None,
            }
        }
    }
    Some(KeyAction::Continue)
}

/// History list keys: j/k move, Enter reopens, D clears.
fn handle_history_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.history_state.select_next(),
        KeyCode::Char('k') | KeyCode::Up => state.history_state.select_previous(),
        KeyCode::Char('g') => state.history_state.select_first(),
        KeyCode::Char('G') => state.history_state.select_last(),
        KeyCode::Enter => state.open_history_entry(),
        KeyCode::Char('D') => state.clear_history(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Typing modes
// ---------------------------------------------------------------------------

/// Appends to or trims the selected text field. Enter or Esc finishes.
fn handle_form_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let field = state.form.field;
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => state.mode = Mode::Normal,
        KeyCode::Backspace => {
            if let Some(value) = state.form.text_mut(field) {
                value.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(value) = state.form.text_mut(field) {
                value.push(ch);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Edits the selected card's draft. Esc discards the session, Tab switches to
/// annotate, Ctrl-r submits.
fn handle_card_edit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('r') if ctrl => state.submit_regenerate(),
        KeyCode::Esc => state.cancel_card(),
        KeyCode::Tab => state.toggle_card_mode(),
        code => {
            let Some(card) = state.selected_mut() else {
                state.mode = Mode::Normal;
                return KeyAction::Continue;
            };
            match code {
                KeyCode::Left => card.edit_left(),
                KeyCode::Right => card.edit_right(),
                KeyCode::Home => card.edit_home(),
                KeyCode::End => card.edit_end(),
                KeyCode::Up => card.focus_item(false),
                KeyCode::Down => card.focus_item(true),
                KeyCode::Backspace => card.backspace(),
                KeyCode::Delete => card.delete(),
                KeyCode::Enter => card.insert_char('\n'),
                KeyCode::Char(ch) if !ctrl => card.insert_char(ch),
                _ => {}
            }
        }
    }
    KeyAction::Continue
}

/// Types into the suggestion popover. Enter adds the annotation, Esc dismisses.
fn handle_suggestion(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Enter => state.commit_suggestion(),
        KeyCode::Esc => state.dismiss_suggestion(),
        KeyCode::Backspace => {
            if let Some(session) = state.selected_mut().and_then(|c| c.editor.session_mut()) {
                session.pop_suggestion_char();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(session) = state.selected_mut().and_then(|c| c.editor.session_mut()) {
                session.push_suggestion_char(ch);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Inserts bracketed-paste text into whatever is being typed.
///
/// Form fields and the suggestion popover are single-line, so line breaks
/// become spaces there. Outside a typing mode, a paste while the form has
/// focus goes into the selected text field.
pub fn handle_paste(text: &str, state: &mut AppState) -> KeyAction {
    let single_line = || text.trim_end_matches(['\r', '\n']).replace(['\r', '\n'], " ");
    match state.mode {
        Mode::FormInsert => {
            let field = state.form.field;
            if let Some(value) = state.form.text_mut(field) {
                value.push_str(&single_line());
            }
        }
        Mode::Normal if state.focus == PanelFocus::Form => {
            let field = state.form.field;
            if let Some(value) = state.form.text_mut(field) {
                value.push_str(&single_line());
            }
        }
        Mode::Suggestion => {
            if let Some(session) = state.selected_mut().and_then(|c| c.editor.session_mut()) {
                single_line().chars().for_each(|ch| session.push_suggestion_char(ch));
            }
        }
        Mode::CardEdit => {
            if let Some(card) = state.selected_mut() {
                text.chars().filter(|ch| *ch != '\r').for_each(|ch| card.insert_char(ch));
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

/// Handles a key event while the help overlay is visible.
///
/// j/k/g/G scroll; `?`, `Esc`, or `q` dismisses the overlay.
fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => {
            state.help_scroll = state.help_scroll.saturating_add(1);
            KeyAction::Continue
        }
        KeyCode::Char('k') => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
            KeyAction::Continue
        }
        KeyCode::Char('g') => {
            state.help_scroll = 0;
            KeyAction::Continue
        }
        KeyCode::Char('G') => {
            state.help_scroll = u16::MAX;
            KeyAction::Continue
        }
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// ConfirmQuit mode
// ---------------------------------------------------------------------------

/// `y` / `Y` quits. `n` / `N` / `Esc` returns to Normal mode.
fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Handles a mouse event: click-to-focus, drag-to-select and scroll-wheel.
///
/// Dragging across the selected card's text while an annotate session is open
/// builds a selection; releasing the button resolves it, like a mouseup on a
/// rendered document.
///
/// # Arguments
///
/// * `mouse` — the crossterm mouse event
/// * `state` — mutable reference to all UI state
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => handle_mouse_down(mouse.column, mouse.row, state),
        MouseEventKind::Drag(MouseButton::Left) => {
            if state.dragging {
                if let Some(offset) = state.offset_at(mouse.column, mouse.row) {
                    if let Some(card) = state.selected_mut() {
                        card.caret = offset;
                    }
                }
            }
            KeyAction::Continue
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if std::mem::take(&mut state.dragging) {
                let collapsed = state
                    .selected()
                    .is_some_and(|c| c.anchor == Some(c.caret));
                if collapsed {
                    if let Some(card) = state.selected_mut() {
                        card.anchor = None;
                    }
                } else {
                    state.begin_suggestion();
                }
            }
            KeyAction::Continue
        }
        MouseEventKind::ScrollUp => handle_mouse_scroll(state, false),
        MouseEventKind::ScrollDown => handle_mouse_scroll(state, true),
        _ => KeyAction::Continue,
    }
}

/// Sets panel focus from the clicked position and starts a drag when the
/// click lands on annotatable text.
fn handle_mouse_down(col: u16, row: u16, state: &mut AppState) -> KeyAction {
    if state.mode != Mode::Normal {
        return KeyAction::Continue;
    }
    let pos = Position { x: col, y: row };
    let [left, center, right] = state.panel_rects;

    if left.width > 0 && left.contains(pos) {
        state.focus = PanelFocus::Form;
    } else if center.width > 0 && center.contains(pos) {
        state.focus = PanelFocus::Cards;
        let annotating = state.selected().and_then(|c| c.editor.mode()) == Some(EditMode::Annotate);
        if annotating {
            if let Some(offset) = state.offset_at(col, row) {
                if let Some(card) = state.selected_mut() {
                    card.caret = offset;
                    card.anchor = Some(offset);
                }
                state.dragging = true;
            }
        }
    } else if right.width > 0 && right.contains(pos) {
        state.focus = PanelFocus::History;
    }

    KeyAction::Continue
}

/// Scroll wheel: help text in the overlay, otherwise cards or history entries.
fn handle_mouse_scroll(state: &mut AppState, down: bool) -> KeyAction {
    match (state.mode, state.focus) {
        (Mode::HelpOverlay, _) => {
            state.help_scroll = if down {
                state.help_scroll.saturating_add(3)
            } else {
                state.help_scroll.saturating_sub(3)
            };
        }
        (_, PanelFocus::Cards) if down => state.next_card(),
        (_, PanelFocus::Cards) => state.prev_card(),
        (_, PanelFocus::History) if down => state.history_state.select_next(),
        (_, PanelFocus::History) => state.history_state.select_previous(),
        (_, PanelFocus::Form) if down => state.form.select_next(),
        (_, PanelFocus::Form) => state.form.select_prev(),
    }
    KeyAction::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftdesk_core::types::{ContentType, Proposal, ProposalContent};

    use crate::app::Card;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn with_card(text: &str) -> AppState {
        let mut state = AppState::default();
        state.cards.push(Card::new(
            ContentType::Tweet,
            Proposal::new(ProposalContent::Text(text.to_owned())),
        ));
        state.focus = PanelFocus::Cards;
        state.card_text_area = ratatui::layout::Rect::new(0, 0, 40, 3);
        state
    }

    #[test]
    fn quit_asks_when_a_card_is_open() {
        let mut state = with_card("hello");
        assert_eq!(handle_key(press(KeyCode::Char('a')), &mut state), KeyAction::Continue);
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::ConfirmQuit);
        assert_eq!(handle_key(press(KeyCode::Char('y')), &mut state), KeyAction::Quit);
    }

    #[test]
    fn annotate_flow_by_keys() {
        let mut state = with_card("I love cats");
        for code in [
            KeyCode::Char('a'),
            KeyCode::Char('w'),
            KeyCode::Char('v'),
            KeyCode::Char('l'),
            KeyCode::Char('l'),
            KeyCode::Char('l'),
            KeyCode::Enter,
        ] {
            handle_key(press(code), &mut state);
        }
        assert_eq!(state.mode, Mode::Suggestion);
        for ch in "adore".chars() {
            handle_key(press(KeyCode::Char(ch)), &mut state);
        }
        handle_key(press(KeyCode::Enter), &mut state);
        assert_eq!(state.mode, Mode::Normal);
        let session = state.cards[0].editor.session().unwrap();
        let set = session.draft.annotations(0).unwrap();
        assert_eq!(set.as_slice()[0].text, "love");
        assert_eq!(set.as_slice()[0].suggestion, "adore");

        // Caret sits on "e"; x removes the covering annotation.
        handle_key(press(KeyCode::Char('x')), &mut state);
        assert_eq!(state.cards[0].editor.session().unwrap().draft.annotation_count(), 0);
    }

    #[test]
    fn edit_mode_types_and_escape_discards() {
        let mut state = with_card("hi");
        handle_key(press(KeyCode::Char('e')), &mut state);
        assert_eq!(state.mode, Mode::CardEdit);
        handle_key(press(KeyCode::Char('!')), &mut state);
        assert_eq!(state.cards[0].edited(), "hi!");
        handle_key(press(KeyCode::Esc), &mut state);
        assert_eq!(state.mode, Mode::Normal);
        assert!(!state.cards[0].editor.is_open());
    }

    #[test]
    fn paste_fills_form_field_on_one_line() {
        let mut state = AppState::default();
        state.form.field = crate::app::FormField::TweetUrl;
        handle_paste("https://x.com/a/status/1\n", &mut state);
        assert_eq!(state.form.tweet_url, "https://x.com/a/status/1");

        let mut state = with_card("hi");
        handle_key(press(KeyCode::Char('e')), &mut state);
        handle_key(press(KeyCode::End), &mut state);
        handle_paste("\r\nthere", &mut state);
        assert_eq!(state.cards[0].edited(), "hi\nthere");
    }

    #[test]
    fn mouse_drag_selects_and_opens_popover() {
        let mut state = with_card("I love cats");
        state.panel_rects[1] = ratatui::layout::Rect::new(0, 0, 40, 3);
        handle_key(press(KeyCode::Char('a')), &mut state);
        let at = |kind, column| MouseEvent {
            kind,
            column,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(at(MouseEventKind::Down(MouseButton::Left), 2), &mut state);
        handle_mouse(at(MouseEventKind::Drag(MouseButton::Left), 5), &mut state);
        handle_mouse(at(MouseEventKind::Up(MouseButton::Left), 5), &mut state);
        assert_eq!(state.mode, Mode::Suggestion);
        let pending = state.cards[0].editor.session().unwrap().pending.clone().unwrap();
        assert_eq!(pending.selection.text, "love");
    }
}
