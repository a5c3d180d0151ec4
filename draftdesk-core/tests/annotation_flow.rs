//! End-to-end: render a card, select text through the virtual tree, commit
//! suggestions, and build the regenerate request.

use draftdesk_core::payload::{build_suggestions, RegenerateContext};
use draftdesk_core::resolver::{self, Bounds, RenderTree, Unresolvable};
use draftdesk_core::segment::segment;
use draftdesk_core::session::{CardEditor, EditMode};
use draftdesk_core::types::{ContentType, ProposalContent};

const TEXT: &str = "I love cats and dogs";

/// Re-renders the open card and selects `[from, to)` the way the host does.
fn select_and_commit(editor: &mut CardEditor, from: usize, to: usize, suggestion: &str) {
    let session = editor.session_mut().unwrap();
    let original = session.draft.original(0).unwrap().to_owned();
    let existing = session.draft.annotations(0).cloned().unwrap_or_default();

    let tree = RenderTree::from_segments(segment(&original, existing.as_slice()));
    let anchor = tree.boundary_at(from).unwrap();
    let focus = tree.boundary_at(to).unwrap();
    let selection = tree.select(anchor, focus, Bounds::new(3, 2, to as u16 - from as u16, 1));
    let resolved = resolver::resolve(
        &tree,
        RenderTree::ROOT,
        &selection,
        Bounds::new(1, 1, 40, 5),
        &existing,
    )
    .unwrap();
    assert_eq!((resolved.start, resolved.end), (from, to));

    session.set_pending(0, resolved);
    for ch in suggestion.chars() {
        session.push_suggestion_char(ch);
    }
    session.commit_pending().unwrap();
}

#[test]
fn annotate_two_ranges_and_build_payload() {
    let mut editor = CardEditor::new();
    editor.open(&ProposalContent::Text(TEXT.into()), EditMode::Annotate);
    assert!(!editor.can_submit(false));

    select_and_commit(&mut editor, 2, 6, "stronger verb");
    // The second selection is made against a tree now fragmented by the
    // first highlight.
    select_and_commit(&mut editor, 16, 20, "remove");

    let session = editor.session().unwrap();
    assert_eq!(
        build_suggestions(session),
        "For \"love\": stronger verb\nFor \"dogs\": remove"
    );

    let ctx = RegenerateContext {
        research_id: Some("r-42".into()),
        content_type: ContentType::Tweet,
        vibe: "playful".into(),
        context: String::new(),
        thread_count: 5,
    };
    let request = editor.prepare_submit(&ctx, false).unwrap();
    assert_eq!(request.research_id, "r-42");
    assert_eq!(request.vibe.as_deref(), Some("playful"));
    assert!(request.context.is_none());
    assert_eq!(
        request.suggestions.as_deref(),
        Some("For \"love\": stronger verb\nFor \"dogs\": remove")
    );

    editor.complete_submit();
    assert!(editor.session().is_none());
}

#[test]
fn selection_over_a_highlight_is_rejected_silently() {
    let mut editor = CardEditor::new();
    editor.open(&ProposalContent::Text(TEXT.into()), EditMode::Annotate);
    select_and_commit(&mut editor, 2, 6, "stronger verb");

    let session = editor.session().unwrap();
    let existing = session.draft.annotations(0).unwrap();
    let tree = RenderTree::from_segments(segment(TEXT, existing.as_slice()));
    let selection = tree.select(
        tree.boundary_at(0).unwrap(),
        tree.boundary_at(4).unwrap(),
        Bounds::default(),
    );
    assert_eq!(selection.text, "I lo");
    assert_eq!(
        resolver::resolve(&tree, RenderTree::ROOT, &selection, Bounds::default(), existing),
        Err(Unresolvable::Overlap)
    );
    assert_eq!(session.draft.annotation_count(), 1);
}

#[test]
fn thread_items_resolve_against_their_own_text() {
    let content = ProposalContent::Thread(vec!["first post".into(), "second post".into()]);
    let mut editor = CardEditor::new();
    editor.open(&content, EditMode::Annotate);

    let session = editor.session_mut().unwrap();
    let item = session.draft.original(1).unwrap().to_owned();
    let tree = RenderTree::from_segments(segment(&item, &[]));
    let selection = tree.select(
        tree.boundary_at(7).unwrap(),
        tree.last_boundary().unwrap(),
        Bounds::default(),
    );
    let resolved = resolver::resolve(
        &tree,
        RenderTree::ROOT,
        &selection,
        Bounds::default(),
        &Default::default(),
    )
    .unwrap();
    session.set_pending(1, resolved);
    session.suggestion_draft.push_str("reply");
    session.commit_pending().unwrap();

    assert_eq!(
        build_suggestions(editor.session().unwrap()),
        "Tweet 2:\n  - For \"post\": reply"
    );
}
