//! Per-card edit state machine.
//!
//! ```text
//! Closed ──open──▶ Open(Annotate) ◀──toggle──▶ Open(Edit)
//!    ▲                   │                         │
//!    └──── cancel / complete_submit ───────────────┘
//! ```
//!
//! Switching between the two open substates keeps both the annotations and
//! the edited text; only leaving `Open` discards them.

use crate::api::types::RegenerateRequest;
use crate::error::{AnnotationError, SubmitError};
use crate::payload::{self, RegenerateContext};
use crate::resolver::ResolvedSelection;
use crate::store::{AnnotationSet, ThreadAnnotations};
use crate::types::{Annotation, ProposalContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Annotate,
    Edit,
}

impl EditMode {
    pub fn label(self) -> &'static str {
        match self {
            EditMode::Annotate => "ANNOTATE",
            EditMode::Edit => "EDIT",
        }
    }
}

/// Working copy of a card's content plus the feedback gathered on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Single {
        original: String,
        edited: String,
        annotations: AnnotationSet,
    },
    Thread {
        original: Vec<String>,
        edited: Vec<String>,
        annotations: ThreadAnnotations,
    },
}

impl Draft {
    /// Seeds the edited copy from `content` with no annotations.
    pub fn from_content(content: &ProposalContent) -> Self {
        match content {
            ProposalContent::Text(text) => Draft::Single {
                original: text.clone(),
                edited: text.clone(),
                annotations: AnnotationSet::new(),
            },
            ProposalContent::Thread(items) => Draft::Thread {
                original: items.clone(),
                edited: items.clone(),
                annotations: ThreadAnnotations::new(),
            },
        }
    }

    pub fn is_thread(&self) -> bool {
        matches!(self, Draft::Thread { .. })
    }

    /// Number of editable items (1 for a single post).
    pub fn item_count(&self) -> usize {
        match self {
            Draft::Single { .. } => 1,
            Draft::Thread { original, .. } => original.len(),
        }
    }

    pub fn original(&self, index: usize) -> Option<&str> {
        match self {
            Draft::Single { original, .. } => (index == 0).then_some(original.as_str()),
            Draft::Thread { original, .. } => original.get(index).map(String::as_str),
        }
    }

    pub fn edited(&self, index: usize) -> Option<&str> {
        match self {
            Draft::Single { edited, .. } => (index == 0).then_some(edited.as_str()),
            Draft::Thread { edited, .. } => edited.get(index).map(String::as_str),
        }
    }

    pub fn edited_mut(&mut self, index: usize) -> Option<&mut String> {
        match self {
            Draft::Single { edited, .. } => (index == 0).then_some(edited),
            Draft::Thread { edited, .. } => edited.get_mut(index),
        }
    }

    /// Annotations on item `index`. `None` for a thread item that has never
    /// been annotated.
    pub fn annotations(&self, index: usize) -> Option<&AnnotationSet> {
        match self {
            Draft::Single { annotations, .. } => (index == 0).then_some(annotations),
            Draft::Thread { annotations, .. } => annotations.get(index),
        }
    }

    /// Annotation count across every item.
    pub fn annotation_count(&self) -> usize {
        match self {
            Draft::Single { annotations, .. } => annotations.len(),
            Draft::Thread { annotations, .. } => annotations.total(),
        }
    }

    /// True when any item's edited text differs from its original.
    pub fn is_modified(&self) -> bool {
        match self {
            Draft::Single { original, edited, .. } => original != edited,
            Draft::Thread { original, edited, .. } => {
                original.iter().zip(edited).any(|(o, e)| o != e)
            }
        }
    }

    pub fn add_annotation(
        &mut self,
        index: usize,
        candidate: Annotation,
    ) -> Result<&Annotation, AnnotationError> {
        match self {
            Draft::Single { annotations, .. } if index == 0 => annotations.add(candidate),
            Draft::Thread { original, annotations, .. } if index < original.len() => {
                annotations.add(index, candidate)
            }
            _ => Err(AnnotationError::NoSuchItem(index)),
        }
    }

    pub fn remove_annotation(&mut self, index: usize, id: &str) -> Option<Annotation> {
        match self {
            Draft::Single { annotations, .. } if index == 0 => annotations.remove(id),
            Draft::Thread { annotations, .. } => annotations.remove(index, id),
            _ => None,
        }
    }
}

/// A resolved selection waiting for its suggestion text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSelection {
    pub index: usize,
    pub selection: ResolvedSelection,
}

/// Ephemeral editing state for one open card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub mode: EditMode,
    pub draft: Draft,
    pub pending: Option<PendingSelection>,
    pub suggestion_draft: String,
}

impl EditSession {
    pub fn new(content: &ProposalContent, mode: EditMode) -> Self {
        Self {
            mode,
            draft: Draft::from_content(content),
            pending: None,
            suggestion_draft: String::new(),
        }
    }

    /// Submit guard for the current substate, ignoring in-flight requests.
    pub fn has_feedback(&self) -> bool {
        match self.mode {
            EditMode::Annotate => self.draft.annotation_count() > 0,
            EditMode::Edit => self.draft.is_modified(),
        }
    }

    /// Opens the suggestion popover for `selection` on item `index` with an
    /// empty draft.
    pub fn set_pending(&mut self, index: usize, selection: ResolvedSelection) {
        self.pending = Some(PendingSelection { index, selection });
        self.suggestion_draft.clear();
    }

    pub fn push_suggestion_char(&mut self, ch: char) {
        if self.pending.is_some() {
            self.suggestion_draft.push(ch);
        }
    }

    pub fn pop_suggestion_char(&mut self) {
        self.suggestion_draft.pop();
    }

    pub fn dismiss_pending(&mut self) {
        self.pending = None;
        self.suggestion_draft.clear();
    }

    /// Turns the pending selection plus the typed suggestion into an
    /// annotation.
    ///
    /// A blank suggestion keeps the popover open so the user can keep typing;
    /// any other rejection closes it.
    pub fn commit_pending(&mut self) -> Result<&Annotation, AnnotationError> {
        let Some(pending) = self.pending.take() else {
            return Err(AnnotationError::EmptyRange);
        };
        if self.suggestion_draft.trim().is_empty() {
            self.pending = Some(pending);
            return Err(AnnotationError::EmptySuggestion);
        }
        let suggestion = std::mem::take(&mut self.suggestion_draft);
        let sel = pending.selection;
        let candidate = Annotation::new(sel.start, sel.end, sel.text, suggestion.trim());
        self.draft.add_annotation(pending.index, candidate)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Closed,
    Open(EditSession),
}

/// Owns the edit state of one proposal card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardEditor {
    state: EditorState,
}

impl CardEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, EditorState::Open(_))
    }

    pub fn session(&self) -> Option<&EditSession> {
        match &self.state {
            EditorState::Open(session) => Some(session),
            EditorState::Closed => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        match &mut self.state {
            EditorState::Open(session) => Some(session),
            EditorState::Closed => None,
        }
    }

    pub fn mode(&self) -> Option<EditMode> {
        self.session().map(|s| s.mode)
    }

    /// Enters `mode`. From `Closed` this seeds a fresh session from `content`;
    /// an already open session only switches substate.
    pub fn open(&mut self, content: &ProposalContent, mode: EditMode) {
        match &mut self.state {
            EditorState::Open(session) => session.mode = mode,
            EditorState::Closed => {
                self.state = EditorState::Open(EditSession::new(content, mode));
            }
        }
    }

    /// Switches substate; no-op when closed.
    pub fn set_mode(&mut self, mode: EditMode) {
        if let Some(session) = self.session_mut() {
            session.mode = mode;
        }
    }

    pub fn toggle_mode(&mut self) {
        if let Some(session) = self.session_mut() {
            session.mode = match session.mode {
                EditMode::Annotate => EditMode::Edit,
                EditMode::Edit => EditMode::Annotate,
            };
            session.dismiss_pending();
        }
    }

    /// Discards the session unconditionally.
    pub fn cancel(&mut self) {
        self.state = EditorState::Closed;
    }

    pub fn can_submit(&self, in_flight: bool) -> bool {
        !in_flight && self.session().is_some_and(EditSession::has_feedback)
    }

    /// Builds the regenerate request for the open session. The session stays
    /// open until [`CardEditor::complete_submit`] so a failed call can be
    /// retried without losing feedback.
    pub fn prepare_submit(
        &self,
        ctx: &RegenerateContext,
        in_flight: bool,
    ) -> Result<RegenerateRequest, SubmitError> {
        let session = self.session().ok_or(SubmitError::NotOpen)?;
        if in_flight {
            return Err(SubmitError::RequestInFlight);
        }
        if !session.has_feedback() {
            return Err(SubmitError::NothingToSubmit);
        }
        payload::build_regenerate_request(session, ctx)
    }

    /// Closes the session after its regenerate request succeeded.
    pub fn complete_submit(&mut self) {
        self.state = EditorState::Closed;
    }
}
