//! Central application state for draftdesk.
//!
//! This module owns all mutable UI state: the current mode, which panel has focus,
//! the request form, one `Card` per proposal with its editor, the history list, and
//! the banner shown in the status bar. No ratatui rendering logic lives here;
//! `app.rs` is read by the render module and mutated by the keybinding dispatcher
//! and by `apply_*` methods called from the event loop.

use crossbeam_channel::Sender;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

use draftdesk_core::api::types::{HealthStatus, MAX_THREAD_COUNT, MIN_THREAD_COUNT};
use draftdesk_core::api::{GenerationRequest, ProgressEvent, RegenerateResponse};
use draftdesk_core::error::{ApiError, AnnotationError, ErrorKind, HistoryError};
use draftdesk_core::payload::RegenerateContext;
use draftdesk_core::resolver::{self, Bounds, RenderTree};
use draftdesk_core::segment::segment;
use draftdesk_core::session::{CardEditor, EditMode};
use draftdesk_core::text::{byte_offset, char_len, char_slice};
use draftdesk_core::types::{
    ContentType, GenerationMeta, GenerationResult, HistoryEntry, HistorySummary, Proposal,
    Proposals,
};

use crate::worker::types::{ApiRequest, HistoryRequest};
use crate::wrap;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Navigation; on an open annotate card, caret and selection keys.
    #[default]
    Normal,
    /// Typing into the selected form field.
    FormInsert,
    /// Typing into the selected card's edited draft.
    CardEdit,
    /// Typing into the suggestion popover.
    Suggestion,
    /// Full-screen help overlay is shown above all panels.
    HelpOverlay,
    /// Quit-confirmation dialog shown when open cards or a request would be lost.
    ConfirmQuit,
}

/// Which panel currently has keyboard focus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Left panel: the generation request form.
    #[default]
    Form,
    /// Centre panel: proposal cards.
    Cards,
    /// Right panel: previous runs.
    History,
}

impl PanelFocus {
    /// Cycle order: `Form` → `History` → `Cards` → `Form` (reversed).
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Form => PanelFocus::History,
            PanelFocus::Cards => PanelFocus::Form,
            PanelFocus::History => PanelFocus::Cards,
        }
    }

    /// Cycle order: `Form` → `Cards` → `History` → `Form`.
    pub fn next(self) -> Self {
        match self {
            PanelFocus::Form => PanelFocus::Cards,
            PanelFocus::Cards => PanelFocus::History,
            PanelFocus::History => PanelFocus::Form,
        }
    }
}

/// One row of the request form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Username,
    TweetUrl,
    Topic,
    ContentType,
    ThreadCount,
    Vibe,
    Context,
    ProfileFile,
    DeepResearch,
    FullContent,
}

impl FormField {
    pub const ALL: [FormField; 10] = [
        FormField::Username,
        FormField::TweetUrl,
        FormField::Topic,
        FormField::ContentType,
        FormField::ThreadCount,
        FormField::Vibe,
        FormField::Context,
        FormField::ProfileFile,
        FormField::DeepResearch,
        FormField::FullContent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Username => "Username",
            FormField::TweetUrl => "Tweet URL",
            FormField::Topic => "Topic",
            FormField::ContentType => "Type",
            FormField::ThreadCount => "Thread size",
            FormField::Vibe => "Vibe",
            FormField::Context => "Context",
            FormField::ProfileFile => "Profile file",
            FormField::DeepResearch => "Deep research",
            FormField::FullContent => "Full content",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            FormField::Username
                | FormField::TweetUrl
                | FormField::Topic
                | FormField::Vibe
                | FormField::Context
                | FormField::ProfileFile
        )
    }
}

/// Values typed into the request form. Strings stay raw until
/// [`RequestForm::to_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestForm {
    pub field: FormField,
    pub username: String,
    pub tweet_url: String,
    pub topic: String,
    pub content_type: ContentType,
    pub thread_count: u8,
    pub vibe: String,
    pub context: String,
    pub profile_file: String,
    pub deep_research: bool,
    pub use_full_content: bool,
}

impl Default for RequestForm {
    fn default() -> Self {
        Self {
            field: FormField::Username,
            username: String::new(),
            tweet_url: String::new(),
            topic: String::new(),
            content_type: ContentType::Tweet,
            thread_count: 5,
            vibe: String::new(),
            context: String::new(),
            profile_file: String::new(),
            deep_research: false,
            use_full_content: false,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

impl RequestForm {
    pub fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Username => Some(&self.username),
            FormField::TweetUrl => Some(&self.tweet_url),
            FormField::Topic => Some(&self.topic),
            FormField::Vibe => Some(&self.vibe),
            FormField::Context => Some(&self.context),
            FormField::ProfileFile => Some(&self.profile_file),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Username => Some(&mut self.username),
            FormField::TweetUrl => Some(&mut self.tweet_url),
            FormField::Topic => Some(&mut self.topic),
            FormField::Vibe => Some(&mut self.vibe),
            FormField::Context => Some(&mut self.context),
            FormField::ProfileFile => Some(&mut self.profile_file),
            _ => None,
        }
    }

    pub fn select_next(&mut self) {
        let idx = FormField::ALL.iter().position(|f| *f == self.field).unwrap_or(0);
        self.field = FormField::ALL[(idx + 1).min(FormField::ALL.len() - 1)];
    }

    pub fn select_prev(&mut self) {
        let idx = FormField::ALL.iter().position(|f| *f == self.field).unwrap_or(0);
        self.field = FormField::ALL[idx.saturating_sub(1)];
    }

    /// `h`/`l` on the selected field: cycles the content type or steps the
    /// thread size within its bounds.
    pub fn adjust(&mut self, forward: bool) {
        match self.field {
            FormField::ContentType => {
                self.content_type = if forward {
                    self.content_type.next()
                } else {
                    self.content_type.prev()
                };
            }
            FormField::ThreadCount => {
                self.thread_count = if forward {
                    self.thread_count.saturating_add(1)
                } else {
                    self.thread_count.saturating_sub(1)
                }
                .clamp(MIN_THREAD_COUNT, MAX_THREAD_COUNT);
            }
            FormField::DeepResearch | FormField::FullContent => self.toggle(),
            _ => {}
        }
    }

    pub fn toggle(&mut self) {
        match self.field {
            FormField::DeepResearch => self.deep_research = !self.deep_research,
            FormField::FullContent => self.use_full_content = !self.use_full_content,
            _ => {}
        }
    }

    /// Builds the wire request. Blank text fields are omitted and the thread
    /// size is clamped; everything else is left to `validate()`.
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            username: self.username.trim().to_owned(),
            tweet_url: non_empty(&self.tweet_url),
            topic: non_empty(&self.topic),
            content_type: self.content_type,
            thread_count: self.thread_count.clamp(MIN_THREAD_COUNT, MAX_THREAD_COUNT),
            vibe: non_empty(&self.vibe),
            context: non_empty(&self.context),
            profile_file: non_empty(&self.profile_file),
            deep_research: self.deep_research,
            use_full_content: self.use_full_content,
        }
    }

    pub fn meta(&self) -> GenerationMeta {
        GenerationMeta {
            username: self.username.trim().to_owned(),
            tweet_url: non_empty(&self.tweet_url),
            prompt: non_empty(&self.topic),
            content_type: self.content_type,
        }
    }

    /// Refills the identifying fields from a journal entry.
    pub fn fill_from(&mut self, meta: &GenerationMeta) {
        self.username = meta.username.clone();
        self.tweet_url = meta.tweet_url.clone().unwrap_or_default();
        self.topic = meta.prompt.clone().unwrap_or_default();
        self.content_type = meta.content_type;
    }
}

/// One proposal on screen plus its editing state.
#[derive(Debug, Clone)]
pub struct Card {
    pub kind: ContentType,
    pub proposal: Proposal,
    pub editor: CardEditor,
    /// Thread item under the caret; always 0 for single posts.
    pub item: usize,
    /// Annotate caret, a char offset into the original text of `item`.
    pub caret: usize,
    /// Start of a keyboard or mouse selection.
    pub anchor: Option<usize>,
    /// Edit caret, a char offset into the edited text of `item`.
    pub edit_caret: usize,
    /// Last submit failure shown inside the card.
    pub notice: Option<String>,
}

impl Card {
    pub fn new(kind: ContentType, proposal: Proposal) -> Self {
        Self {
            kind,
            proposal,
            editor: CardEditor::new(),
            item: 0,
            caret: 0,
            anchor: None,
            edit_caret: 0,
            notice: None,
        }
    }

    pub fn item_count(&self) -> usize {
        self.proposal.content.items().len()
    }

    /// Original text of the focused item.
    pub fn original(&self) -> &str {
        self.proposal
            .content
            .items()
            .get(self.item)
            .copied()
            .unwrap_or("")
    }

    /// Edited text of the focused item, or the original when no session is open.
    pub fn edited(&self) -> &str {
        self.editor
            .session()
            .and_then(|s| s.draft.edited(self.item))
            .unwrap_or_else(|| self.original())
    }

    /// Inline tree for the focused item, highlights included.
    pub fn render_tree(&self) -> RenderTree {
        let annotations = self
            .editor
            .session()
            .and_then(|s| s.draft.annotations(self.item))
            .map(|set| set.as_slice())
            .unwrap_or(&[]);
        RenderTree::from_segments(segment(self.original(), annotations))
    }

    fn step_caret(&mut self, forward: bool) {
        let tree = self.render_tree();
        let Some(boundary) = tree.boundary_at(self.caret) else {
            return;
        };
        let next = if forward {
            tree.step_forward(boundary)
        } else {
            tree.step_backward(boundary)
        };
        if let Some(offset) = tree.offset_within(RenderTree::ROOT, next) {
            self.caret = offset;
        }
    }

    pub fn caret_left(&mut self) {
        self.step_caret(false);
    }

    pub fn caret_right(&mut self) {
        self.step_caret(true);
    }

    pub fn caret_home(&mut self) {
        self.caret = 0;
    }

    pub fn caret_end(&mut self) {
        self.caret = char_len(self.original()).saturating_sub(1);
    }

    pub fn word_forward(&mut self) {
        self.caret = next_word(self.original(), self.caret);
    }

    pub fn word_backward(&mut self) {
        self.caret = prev_word(self.original(), self.caret);
    }

    /// Moves to another thread item, resetting carets and any selection.
    pub fn focus_item(&mut self, forward: bool) {
        let count = self.item_count();
        let next = if forward {
            (self.item + 1).min(count.saturating_sub(1))
        } else {
            self.item.saturating_sub(1)
        };
        if next == self.item {
            return;
        }
        self.item = next;
        self.caret = 0;
        self.anchor = None;
        self.edit_caret = char_len(self.edited());
        if let Some(session) = self.editor.session_mut() {
            session.dismiss_pending();
        }
    }

    pub fn toggle_anchor(&mut self) {
        self.anchor = match self.anchor {
            Some(_) => None,
            None => Some(self.caret),
        };
    }

    /// Char range covered by the selection: anchor through the caret, both
    /// inclusive.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        let len = char_len(self.original());
        let lo = anchor.min(self.caret);
        let hi = (anchor.max(self.caret) + 1).min(len);
        (lo < hi).then_some((lo, hi))
    }

    pub fn open(&mut self, mode: EditMode) {
        let was_open = self.editor.is_open();
        self.editor.open(&self.proposal.content, mode);
        if !was_open {
            self.item = 0;
            self.caret = 0;
            self.anchor = None;
            self.notice = None;
        }
        self.edit_caret = char_len(self.edited());
    }

    pub fn cancel(&mut self) {
        self.editor.cancel();
        self.anchor = None;
        self.notice = None;
    }

    pub fn insert_char(&mut self, ch: char) {
        let caret = self.edit_caret;
        let Some(text) = self
            .editor
            .session_mut()
            .and_then(|s| s.draft.edited_mut(self.item))
        else {
            return;
        };
        let at = byte_offset(text, caret);
        text.insert(at, ch);
        self.edit_caret += 1;
    }

    pub fn backspace(&mut self) {
        if self.edit_caret == 0 {
            return;
        }
        let caret = self.edit_caret;
        let Some(text) = self
            .editor
            .session_mut()
            .and_then(|s| s.draft.edited_mut(self.item))
        else {
            return;
        };
        let at = byte_offset(text, caret - 1);
        text.remove(at);
        self.edit_caret -= 1;
    }

    pub fn delete(&mut self) {
        let caret = self.edit_caret;
        let Some(text) = self
            .editor
            .session_mut()
            .and_then(|s| s.draft.edited_mut(self.item))
        else {
            return;
        };
        if caret < char_len(text) {
            let at = byte_offset(text, caret);
            text.remove(at);
        }
    }

    pub fn edit_left(&mut self) {
        self.edit_caret = self.edit_caret.saturating_sub(1);
    }

    pub fn edit_right(&mut self) {
        self.edit_caret = (self.edit_caret + 1).min(char_len(self.edited()));
    }

    pub fn edit_home(&mut self) {
        self.edit_caret = 0;
    }

    pub fn edit_end(&mut self) {
        self.edit_caret = char_len(self.edited());
    }

    /// Removes the annotation covering the caret, if any.
    pub fn remove_annotation_at_caret(&mut self) -> bool {
        let item = self.item;
        let caret = self.caret;
        let Some(session) = self.editor.session_mut() else {
            return false;
        };
        let Some(id) = session
            .draft
            .annotations(item)
            .and_then(|set| set.at(caret))
            .map(|a| a.id.clone())
        else {
            return false;
        };
        session.draft.remove_annotation(item, &id).is_some()
    }
}

fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace()
}

/// Char offset of the start of the next word after `from`.
pub fn next_word(text: &str, from: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut i = from.min(chars.len());
    while i < chars.len() && is_word_char(chars[i]) {
        i += 1;
    }
    while i < chars.len() && !is_word_char(chars[i]) {
        i += 1;
    }
    i.min(chars.len().saturating_sub(1))
}

/// Char offset of the start of the word before `from`.
pub fn prev_word(text: &str, from: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut i = from.min(chars.len());
    while i > 0 && !is_word_char(chars[i - 1]) {
        i -= 1;
    }
    while i > 0 && is_word_char(chars[i - 1]) {
        i -= 1;
    }
    i
}

/// The request currently owned by the API worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Generate,
    Regenerate(usize),
}

/// Status-bar message.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Banner {
    #[default]
    Idle,
    Info(String),
    Progress {
        step: String,
        message: String,
        progress: Option<f64>,
    },
    Error(String),
}

/// User-facing wording for a failed call.
pub fn describe_error(err: &ApiError) -> String {
    match err.kind() {
        ErrorKind::Connectivity => {
            format!("Connection failed. Is the generation service running? ({err})")
        }
        ErrorKind::Timeout => {
            "Request timed out. The service may be busy, please try again.".to_owned()
        }
        ErrorKind::Protocol => format!("Unexpected response from the service: {err}"),
        ErrorKind::Application => format!("Generation failed: {err}"),
        ErrorKind::Validation => format!("Check the form: {err}"),
    }
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    /// Current editor mode governing which keybindings are active.
    pub mode: Mode,
    /// Which panel currently receives navigation keys.
    pub focus: PanelFocus,

    pub form: RequestForm,
    pub cards: Vec<Card>,
    pub selected_card: usize,

    /// Last generation result, kept in sync with card content after regenerations.
    pub result: Option<GenerationResult>,
    /// Request-side facts of `result`, journaled with every update.
    pub meta: Option<GenerationMeta>,
    /// Meta of the generation currently in flight.
    pub(crate) pending_meta: Option<GenerationMeta>,

    pub in_flight: Option<Pending>,
    pub banner: Banner,
    /// Spinner frame, advanced on every tick while a request is in flight.
    pub spinner: usize,
    pub service: Option<Result<HealthStatus, String>>,

    pub history: Vec<HistorySummary>,
    pub history_state: ListState,

    pub help_scroll: u16,
    /// Outer rects of [form, cards, history], cached after each render for mouse hit-testing.
    pub panel_rects: [Rect; 3],
    /// Where the focused item's text of the selected card was drawn last frame.
    pub card_text_area: Rect,
    /// True between a left-button press and release inside `card_text_area`.
    pub dragging: bool,

    /// Width percentage of the left (form) panel. Default: 25.
    pub left_pct: u16,
    /// Width percentage of the centre (cards) panel. Default: 50.
    pub center_pct: u16,
    /// Width percentage of the right (history) panel. Default: 25.
    pub right_pct: u16,

    pub api_tx: Option<Sender<ApiRequest>>,
    pub history_tx: Option<UnboundedSender<HistoryRequest>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            form: RequestForm::default(),
            cards: Vec::new(),
            selected_card: 0,
            result: None,
            meta: None,
            pending_meta: None,
            in_flight: None,
            banner: Banner::Idle,
            spinner: 0,
            service: None,
            history: Vec::new(),
            history_state: ListState::default(),
            help_scroll: 0,
            panel_rects: [Rect::default(); 3],
            card_text_area: Rect::default(),
            dragging: false,
            left_pct: 25,
            center_pct: 50,
            right_pct: 25,
            api_tx: None,
            history_tx: None,
        }
    }
}

fn rect_bounds(rect: Rect) -> Bounds {
    Bounds::new(rect.x, rect.y, rect.width, rect.height)
}

impl AppState {
    pub fn selected(&self) -> Option<&Card> {
        self.cards.get(self.selected_card)
    }

    pub fn selected_mut(&mut self) -> Option<&mut Card> {
        self.cards.get_mut(self.selected_card)
    }

    pub fn any_card_open(&self) -> bool {
        self.cards.iter().any(|c| c.editor.is_open())
    }

    pub fn next_card(&mut self) {
        if !self.cards.is_empty() {
            self.selected_card = (self.selected_card + 1).min(self.cards.len() - 1);
        }
    }

    pub fn prev_card(&mut self) {
        self.selected_card = self.selected_card.saturating_sub(1);
    }

    pub fn open_card(&mut self, mode: EditMode) {
        let Some(card) = self.selected_mut() else {
            return;
        };
        card.open(mode);
        self.mode = match mode {
            EditMode::Edit => Mode::CardEdit,
            EditMode::Annotate => Mode::Normal,
        };
    }

    pub fn toggle_card_mode(&mut self) {
        let Some(card) = self.selected_mut() else {
            return;
        };
        card.editor.toggle_mode();
        card.anchor = None;
        card.edit_caret = char_len(card.edited());
        self.mode = match card.editor.mode() {
            Some(EditMode::Edit) => Mode::CardEdit,
            _ => Mode::Normal,
        };
    }

    pub fn cancel_card(&mut self) {
        if let Some(card) = self.selected_mut() {
            card.cancel();
        }
        self.mode = Mode::Normal;
    }

    /// Resolves the selected card's selection into a pending range and opens
    /// the suggestion popover. Rejected selections are dropped silently.
    pub fn begin_suggestion(&mut self) {
        let area = self.card_text_area;
        let Some(card) = self.cards.get_mut(self.selected_card) else {
            return;
        };
        if card.editor.mode() != Some(EditMode::Annotate) {
            return;
        }
        let Some((lo, hi)) = card.selection_range() else {
            card.anchor = None;
            return;
        };
        let tree = card.render_tree();
        let (Some(start), Some(end)) = (tree.boundary_at(lo), tree.boundary_at(hi)) else {
            card.anchor = None;
            return;
        };
        let rect = wrap::Wrapped::new(card.original(), area.width).selection_rect(lo, hi, area);
        let selection = tree.select(start, end, rect_bounds(rect));

        let item = card.item;
        let Some(session) = card.editor.session_mut() else {
            return;
        };
        let existing = session.draft.annotations(item).cloned().unwrap_or_default();
        card.anchor = None;
        match resolver::resolve(
            &tree,
            RenderTree::ROOT,
            &selection,
            rect_bounds(area),
            &existing,
        ) {
            Ok(resolved) => {
                session.set_pending(item, resolved);
                self.mode = Mode::Suggestion;
            }
            Err(reason) => tracing::debug!(%reason, "selection dropped"),
        }
    }

    pub fn commit_suggestion(&mut self) {
        let Some(session) = self
            .cards
            .get_mut(self.selected_card)
            .and_then(|c| c.editor.session_mut())
        else {
            self.mode = Mode::Normal;
            return;
        };
        match session.commit_pending().map(|a| (a.start, a.end)) {
            Ok((start, end)) => {
                tracing::debug!(start, end, "annotation added");
                self.mode = Mode::Normal;
            }
            Err(AnnotationError::EmptySuggestion) => {}
            Err(err) => {
                tracing::debug!(%err, "annotation rejected");
                self.mode = Mode::Normal;
            }
        }
    }

    pub fn dismiss_suggestion(&mut self) {
        if let Some(session) = self.selected_mut().and_then(|c| c.editor.session_mut()) {
            session.dismiss_pending();
        }
        self.mode = Mode::Normal;
    }

    /// Why `Ctrl-r` would be refused for the selected card, if it would be.
    pub fn submit_blocker(&self) -> Option<&'static str> {
        let card = self.selected()?;
        let session = card.editor.session()?;
        if self.in_flight.is_some() {
            Some("a request is in flight")
        } else if !session.has_feedback() {
            Some(match session.mode {
                EditMode::Annotate => "add an annotation first",
                EditMode::Edit => "edit the text first",
            })
        } else {
            None
        }
    }

    fn regenerate_context(&self, kind: ContentType) -> RegenerateContext {
        RegenerateContext {
            research_id: self.result.as_ref().and_then(|r| r.research_id.clone()),
            content_type: kind,
            vibe: self.form.vibe.clone(),
            context: self.form.context.clone(),
            thread_count: self.form.thread_count,
        }
    }

    pub fn submit_regenerate(&mut self) {
        let idx = self.selected_card;
        let Some(kind) = self.selected().map(|c| c.kind) else {
            return;
        };
        let ctx = self.regenerate_context(kind);
        let in_flight = self.in_flight.is_some();
        let Some(card) = self.cards.get_mut(idx) else {
            return;
        };
        match card.editor.prepare_submit(&ctx, in_flight) {
            Ok(request) => {
                card.notice = None;
                let Some(tx) = &self.api_tx else {
                    return;
                };
                if tx
                    .send(ApiRequest::Regenerate {
                        card: idx,
                        request: Box::new(request),
                    })
                    .is_err()
                {
                    self.banner = Banner::Error("API worker is not running".to_owned());
                    return;
                }
                self.in_flight = Some(Pending::Regenerate(idx));
                self.banner = Banner::Progress {
                    step: "regenerate".to_owned(),
                    message: format!("Regenerating {}...", kind.label().to_lowercase()),
                    progress: None,
                };
            }
            Err(err) => card.notice = Some(err.to_string()),
        }
    }

    pub fn submit_generation(&mut self) {
        if self.in_flight.is_some() {
            self.banner = Banner::Error("Wait for the current request to finish".to_owned());
            return;
        }
        let request = self.form.to_request();
        if let Err(err) = request.validate() {
            self.banner = Banner::Error(describe_error(&ApiError::from(err)));
            return;
        }
        let Some(tx) = &self.api_tx else {
            return;
        };
        if tx.send(ApiRequest::Generate(Box::new(request))).is_err() {
            self.banner = Banner::Error("API worker is not running".to_owned());
            return;
        }
        self.pending_meta = Some(self.form.meta());
        self.in_flight = Some(Pending::Generate);
        self.banner = Banner::Progress {
            step: "start".to_owned(),
            message: "Starting generation...".to_owned(),
            progress: Some(0.0),
        };
    }

    pub fn on_tick(&mut self) {
        if self.in_flight.is_some() {
            self.spinner = self.spinner.wrapping_add(1);
        }
    }

    pub fn apply_progress(&mut self, event: ProgressEvent) {
        if self.in_flight != Some(Pending::Generate) {
            return;
        }
        self.banner = Banner::Progress {
            step: event.step,
            message: event.message,
            progress: event.progress,
        };
    }

    fn show_result(&mut self, result: GenerationResult, meta: GenerationMeta) {
        self.cards = result
            .proposals
            .cards()
            .map(|(kind, p)| Card::new(kind, p.clone()))
            .collect();
        self.selected_card = 0;
        self.result = Some(result);
        self.meta = Some(meta);
        if self.mode != Mode::FormInsert {
            self.mode = Mode::Normal;
        }
    }

    fn record(&self) {
        let (Some(meta), Some(result), Some(tx)) = (&self.meta, &self.result, &self.history_tx)
        else {
            return;
        };
        let _ = tx.send(HistoryRequest::Record {
            meta: meta.clone(),
            result: Box::new(result.clone()),
        });
    }

    pub fn apply_generated(&mut self, outcome: Result<GenerationResult, ApiError>) {
        self.in_flight = None;
        let meta = self.pending_meta.take();
        match outcome {
            Ok(result) => {
                let count = result.proposals.len();
                let meta = meta.unwrap_or_else(|| self.form.meta());
                self.show_result(result, meta);
                self.banner = if count == 0 {
                    Banner::Info("The service returned no proposals".to_owned())
                } else {
                    Banner::Info(format!("Generated {count} proposals"))
                };
                if count > 0 {
                    self.focus = PanelFocus::Cards;
                }
                self.record();
            }
            Err(err) => {
                tracing::warn!(%err, "generation failed");
                self.banner = Banner::Error(describe_error(&err));
            }
        }
    }

    /// Swaps in the regenerated buckets. Cards of kinds the response left
    /// empty keep their state, open sessions included.
    pub fn apply_regenerated(&mut self, card: usize, outcome: Result<RegenerateResponse, ApiError>) {
        self.in_flight = None;
        match outcome {
            Ok(response) => {
                if let Some(c) = self.cards.get_mut(card) {
                    c.editor.complete_submit();
                    c.anchor = None;
                }
                if self.selected_card == card && matches!(self.mode, Mode::CardEdit | Mode::Suggestion) {
                    self.mode = Mode::Normal;
                }
                let replaced: Vec<ContentType> = Proposals::ORDER
                    .into_iter()
                    .filter(|k| !response.proposals.bucket(*k).is_empty())
                    .collect();
                let Some(result) = self.result.as_mut() else {
                    return;
                };
                result.proposals.replace_with(response.proposals);
                let mut old = std::mem::take(&mut self.cards);
                for kind in Proposals::ORDER {
                    let (same, rest): (Vec<Card>, Vec<Card>) =
                        old.into_iter().partition(|c| c.kind == kind);
                    old = rest;
                    if replaced.contains(&kind) {
                        self.cards.extend(
                            result
                                .proposals
                                .bucket(kind)
                                .iter()
                                .map(|p| Card::new(kind, p.clone())),
                        );
                    } else {
                        self.cards.extend(same);
                    }
                }
                if self.selected_card >= self.cards.len() {
                    self.selected_card = self.cards.len().saturating_sub(1);
                }
                self.banner = if replaced.is_empty() {
                    Banner::Info("The service returned no new proposals".to_owned())
                } else {
                    Banner::Info("Proposals regenerated".to_owned())
                };
                self.record();
            }
            Err(err) => {
                let message = describe_error(&err);
                if let Some(c) = self.cards.get_mut(card) {
                    c.notice = Some(message.clone());
                }
                self.banner = Banner::Error(message);
            }
        }
    }

    pub fn apply_health(&mut self, outcome: Result<HealthStatus, ApiError>) {
        match outcome {
            Ok(status) => {
                tracing::info!(status = %status.status, "service reachable");
                self.service = Some(Ok(status));
            }
            Err(err) => {
                tracing::warn!(%err, "service health check failed");
                self.banner = Banner::Error(describe_error(&err));
                self.service = Some(Err(err.to_string()));
            }
        }
    }

    pub fn apply_history(&mut self, outcome: Result<Vec<HistorySummary>, HistoryError>) {
        match outcome {
            Ok(entries) => {
                self.history = entries;
                match self.history_state.selected() {
                    _ if self.history.is_empty() => self.history_state.select(None),
                    Some(i) if i >= self.history.len() => {
                        self.history_state.select(Some(self.history.len() - 1));
                    }
                    None => self.history_state.select(Some(0)),
                    Some(_) => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "history unavailable");
                self.banner = Banner::Error(format!("History unavailable: {err}"));
            }
        }
    }

    pub fn apply_history_entry(&mut self, outcome: Result<Option<HistoryEntry>, HistoryError>) {
        match outcome {
            Ok(Some(entry)) => {
                if self.in_flight.is_some() {
                    return;
                }
                self.form.fill_from(&entry.meta);
                self.show_result(entry.result, entry.meta);
                self.focus = PanelFocus::Cards;
                self.banner = Banner::Info("Loaded from history".to_owned());
            }
            Ok(None) => self.banner = Banner::Error("That entry no longer exists".to_owned()),
            Err(err) => self.banner = Banner::Error(format!("Could not load entry: {err}")),
        }
    }

    pub fn open_history_entry(&mut self) {
        if self.in_flight.is_some() {
            self.banner = Banner::Error("Wait for the current request to finish".to_owned());
            return;
        }
        let Some(entry) = self
            .history_state
            .selected()
            .and_then(|i| self.history.get(i))
        else {
            return;
        };
        if let Some(tx) = &self.history_tx {
            let _ = tx.send(HistoryRequest::Load(entry.id.clone()));
        }
    }

    pub fn clear_history(&mut self) {
        if let Some(tx) = &self.history_tx {
            let _ = tx.send(HistoryRequest::Clear);
        }
    }

    /// Char offset drawn at screen cell (`col`, `row`) inside `card_text_area`.
    /// Both halves of a wide glyph resolve to that glyph.
    pub fn offset_at(&self, col: u16, row: u16) -> Option<usize> {
        let area = self.card_text_area;
        if col < area.x || row < area.y || col >= area.x + area.width || row >= area.y + area.height
        {
            return None;
        }
        let card = self.selected()?;
        let offset = wrap::Wrapped::new(card.original(), area.width)
            .offset_at(col - area.x, row - area.y)?;
        Some(offset.min(char_len(card.original()).saturating_sub(1)))
    }

    /// Shrinks the cards (centre) panel by 5%, split between the side panels.
    pub fn shrink_cards_panel(&mut self) {
        const MIN_CENTER: u16 = 30;
        const STEP: u16 = 5;
        if self.center_pct <= MIN_CENTER {
            return;
        }
        let transfer = STEP.min(self.center_pct - MIN_CENTER);
        self.center_pct -= transfer;
        let left_gain = transfer / 2;
        let right_gain = transfer - left_gain;
        self.left_pct = self.left_pct.saturating_add(left_gain);
        self.right_pct = self.right_pct.saturating_add(right_gain);
    }

    /// Grows the cards (centre) panel by 5%, taken from the side panels.
    pub fn grow_cards_panel(&mut self) {
        const MAX_CENTER: u16 = 80;
        const MIN_SIDE: u16 = 10;
        const STEP: u16 = 5;
        if self.center_pct >= MAX_CENTER {
            return;
        }
        let transfer = STEP.min(MAX_CENTER - self.center_pct);
        let left_give = (transfer / 2).min(self.left_pct.saturating_sub(MIN_SIDE));
        let right_give = (transfer - transfer / 2).min(self.right_pct.saturating_sub(MIN_SIDE));
        self.left_pct -= left_give;
        self.right_pct -= right_give;
        self.center_pct += left_give + right_give;
    }
}

/// Visible slice helper for the suggestion popover and previews.
pub fn quote(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        text.to_owned()
    } else {
        format!("{}...", char_slice(text, 0, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftdesk_core::types::ProposalContent;

    fn state_with(texts: &[(&str, ContentType)]) -> AppState {
        let mut state = AppState::default();
        state.cards = texts
            .iter()
            .map(|(t, k)| Card::new(*k, Proposal::new(ProposalContent::Text((*t).to_owned()))))
            .collect();
        state.result = Some(GenerationResult {
            research_id: Some("r-1".into()),
            ..Default::default()
        });
        state.card_text_area = Rect::new(10, 4, 40, 5);
        state
    }

    #[test]
    fn form_omits_blank_fields_and_clamps_thread_size() {
        let form = RequestForm {
            username: "  alice ".into(),
            topic: "rust".into(),
            vibe: "   ".into(),
            thread_count: 40,
            ..Default::default()
        };
        let request = form.to_request();
        assert_eq!(request.username, "alice");
        assert_eq!(request.topic.as_deref(), Some("rust"));
        assert!(request.vibe.is_none());
        assert!(request.tweet_url.is_none());
        assert_eq!(request.thread_count, MAX_THREAD_COUNT);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn word_motions() {
        let text = "I love  cats";
        assert_eq!(next_word(text, 0), 2);
        assert_eq!(next_word(text, 2), 8);
        assert_eq!(prev_word(text, 8), 2);
        assert_eq!(prev_word(text, 2), 0);
    }

    #[test]
    fn keyboard_selection_becomes_pending_then_annotation() {
        let mut state = state_with(&[("I love cats", ContentType::Tweet)]);
        state.open_card(EditMode::Annotate);
        let card = state.selected_mut().unwrap();
        card.word_forward();
        card.toggle_anchor();
        for _ in 0..3 {
            card.caret_right();
        }
        assert_eq!(card.selection_range(), Some((2, 6)));

        state.begin_suggestion();
        assert_eq!(state.mode, Mode::Suggestion);
        let session = state.selected().unwrap().editor.session().unwrap();
        let pending = session.pending.as_ref().unwrap();
        assert_eq!((pending.selection.start, pending.selection.end), (2, 6));
        assert_eq!(pending.selection.text, "love");

        // Blank suggestion keeps the popover.
        state.commit_suggestion();
        assert_eq!(state.mode, Mode::Suggestion);

        for ch in "adore".chars() {
            state
                .selected_mut()
                .unwrap()
                .editor
                .session_mut()
                .unwrap()
                .push_suggestion_char(ch);
        }
        state.commit_suggestion();
        assert_eq!(state.mode, Mode::Normal);
        let session = state.selected().unwrap().editor.session().unwrap();
        assert_eq!(session.draft.annotation_count(), 1);
    }

    #[test]
    fn overlapping_selection_is_dropped_silently() {
        let mut state = state_with(&[("I love cats", ContentType::Tweet)]);
        state.open_card(EditMode::Annotate);
        {
            let card = state.selected_mut().unwrap();
            card.editor
                .session_mut()
                .unwrap()
                .draft
                .add_annotation(0, draftdesk_core::types::Annotation::new(2, 6, "love", "x"))
                .unwrap();
            card.caret = 4;
            card.toggle_anchor();
            card.caret = 8;
        }
        state.begin_suggestion();
        assert_eq!(state.mode, Mode::Normal);
        let card = state.selected().unwrap();
        assert!(card.anchor.is_none());
        assert!(card.editor.session().unwrap().pending.is_none());
    }

    #[test]
    fn caret_walks_across_highlights() {
        let mut state = state_with(&[("abcXYZdef", ContentType::Tweet)]);
        state.open_card(EditMode::Annotate);
        let card = state.selected_mut().unwrap();
        card.editor
            .session_mut()
            .unwrap()
            .draft
            .add_annotation(0, draftdesk_core::types::Annotation::new(3, 6, "XYZ", "x"))
            .unwrap();
        for _ in 0..7 {
            card.caret_right();
        }
        assert_eq!(card.caret, 7);
        card.caret_left();
        card.caret_left();
        assert_eq!(card.caret, 5);
        assert!(card.remove_annotation_at_caret());
        assert_eq!(card.editor.session().unwrap().draft.annotation_count(), 0);
    }

    #[test]
    fn click_after_wide_glyph_hits_the_drawn_char() {
        let mut state = state_with(&[("🐱 love", ContentType::Tweet)]);
        let area = state.card_text_area;
        // `l` is drawn at column 3 because the cat fills columns 0 and 1.
        assert_eq!(state.offset_at(area.x + 3, area.y), Some(2));
        assert_eq!(state.offset_at(area.x + 1, area.y), Some(0));

        state.open_card(EditMode::Annotate);
        let card = state.selected_mut().unwrap();
        card.caret = 2;
        card.toggle_anchor();
        card.caret = 5;
        state.begin_suggestion();
        let session = state.selected().unwrap().editor.session().unwrap();
        let pending = session.pending.as_ref().unwrap();
        assert_eq!(pending.selection.text, "love");
        assert_eq!((pending.selection.popover.x, pending.selection.popover.width), (3, 4));
    }

    #[test]
    fn edit_typing_is_char_safe() {
        let mut state = state_with(&[("héllo", ContentType::Tweet)]);
        state.open_card(EditMode::Edit);
        assert_eq!(state.mode, Mode::CardEdit);
        let card = state.selected_mut().unwrap();
        card.edit_home();
        card.edit_right();
        card.edit_right();
        card.backspace();
        card.insert_char('e');
        card.edit_end();
        card.insert_char('!');
        assert_eq!(card.edited(), "hello!");
        assert!(card.editor.session().unwrap().draft.is_modified());
    }

    #[test]
    fn regenerate_without_feedback_sets_notice() {
        let mut state = state_with(&[("I love cats", ContentType::Tweet)]);
        state.open_card(EditMode::Annotate);
        assert_eq!(state.submit_blocker(), Some("add an annotation first"));
        state.submit_regenerate();
        assert!(state.selected().unwrap().notice.is_some());
        assert!(state.in_flight.is_none());
    }

    #[test]
    fn regenerate_failure_keeps_session_and_success_closes_it() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut state = state_with(&[("I love cats", ContentType::Tweet), ("dogs", ContentType::Reply)]);
        state.api_tx = Some(tx);
        state.open_card(EditMode::Edit);
        state.selected_mut().unwrap().insert_char('!');
        state.submit_regenerate();
        assert_eq!(state.in_flight, Some(Pending::Regenerate(0)));
        assert!(matches!(rx.try_recv(), Ok(ApiRequest::Regenerate { card: 0, .. })));

        state.apply_regenerated(0, Err(ApiError::Timeout));
        assert!(state.in_flight.is_none());
        assert!(state.cards[0].editor.is_open());
        assert!(state.cards[0].notice.is_some());

        let response = RegenerateResponse {
            proposals: Proposals {
                tweet: vec![Proposal::new(ProposalContent::Text("I adore cats".into()))],
                ..Default::default()
            },
        };
        state.apply_regenerated(0, Ok(response));
        let kinds: Vec<ContentType> = state.cards.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ContentType::Tweet, ContentType::Reply]);
        assert_eq!(state.cards[0].original(), "I adore cats");
        assert!(!state.cards[0].editor.is_open());
        assert_eq!(state.cards[1].original(), "dogs");
    }

    #[test]
    fn generation_validation_stays_local() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut state = AppState {
            api_tx: Some(tx),
            ..Default::default()
        };
        state.submit_generation();
        assert!(matches!(state.banner, Banner::Error(_)));
        assert!(rx.try_recv().is_err());

        state.form.username = "alice".into();
        state.form.topic = "rust".into();
        state.submit_generation();
        assert_eq!(state.in_flight, Some(Pending::Generate));
        assert!(matches!(rx.try_recv(), Ok(ApiRequest::Generate(_))));
    }
}
