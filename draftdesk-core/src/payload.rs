//! Serialises a card's feedback into the regenerate instruction string.

use crate::api::types::RegenerateRequest;
use crate::error::SubmitError;
use crate::session::{Draft, EditMode, EditSession};
use crate::store::AnnotationSet;
use crate::types::ContentType;

const THREAD_EDIT_PREFIX: &str = "Improve the thread based on this edited version:";

/// Page-level fields forwarded alongside the instruction string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerateContext {
    pub research_id: Option<String>,
    pub content_type: ContentType,
    pub vibe: String,
    pub context: String,
    pub thread_count: u8,
}

fn annotation_line(text: &str, suggestion: &str) -> String {
    format!("For \"{text}\": {suggestion}")
}

fn single_annotations(set: &AnnotationSet) -> String {
    set.iter()
        .map(|a| annotation_line(&a.text, &a.suggestion))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the `suggestions` instruction for `session`'s current substate.
///
/// Annotations appear in the order they were added; thread annotations are
/// grouped under a `Tweet N:` header per item, items in index order.
pub fn build_suggestions(session: &EditSession) -> String {
    match (session.mode, &session.draft) {
        (EditMode::Annotate, Draft::Single { annotations, .. }) => {
            single_annotations(annotations)
        }
        (EditMode::Annotate, Draft::Thread { annotations, .. }) => {
            let mut lines = Vec::new();
            for (index, set) in annotations.iter() {
                lines.push(format!("Tweet {}:", index + 1));
                for a in set {
                    lines.push(format!("  - {}", annotation_line(&a.text, &a.suggestion)));
                }
            }
            lines.join("\n")
        }
        (EditMode::Edit, Draft::Single { edited, .. }) => {
            format!("Improve based on this edited version: \"{edited}\"")
        }
        (EditMode::Edit, Draft::Thread { edited, .. }) => {
            let items = edited
                .iter()
                .enumerate()
                .map(|(i, text)| format!("Tweet {}: {text}", i + 1))
                .collect::<Vec<_>>()
                .join("\n\n");
            format!("{THREAD_EDIT_PREFIX}\n\n{items}")
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Assembles the full regenerate request. Blank `vibe`/`context` are omitted.
pub fn build_regenerate_request(
    session: &EditSession,
    ctx: &RegenerateContext,
) -> Result<RegenerateRequest, SubmitError> {
    let research_id = ctx
        .research_id
        .clone()
        .ok_or(SubmitError::MissingResearchId)?;
    Ok(RegenerateRequest {
        research_id,
        content_type: ctx.content_type,
        thread_count: ctx.thread_count,
        vibe: non_empty(&ctx.vibe),
        context: non_empty(&ctx.context),
        suggestions: Some(build_suggestions(session)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, ProposalContent};

    fn thread_session(items: &[&str], mode: EditMode) -> EditSession {
        let content = ProposalContent::Thread(items.iter().map(|s| s.to_string()).collect());
        EditSession::new(&content, mode)
    }

    #[test]
    fn annotate_single_uses_add_order() {
        let content = ProposalContent::Text("I love cats and dogs".into());
        let mut session = EditSession::new(&content, EditMode::Annotate);
        session
            .draft
            .add_annotation(0, Annotation::new(16, 20, "dogs", "remove"))
            .unwrap();
        session
            .draft
            .add_annotation(0, Annotation::new(2, 6, "love", "stronger verb"))
            .unwrap();
        assert_eq!(
            build_suggestions(&session),
            "For \"dogs\": remove\nFor \"love\": stronger verb"
        );
    }

    #[test]
    fn annotate_thread_groups_by_index() {
        let mut session = thread_session(&["first post", "second", "third one"], EditMode::Annotate);
        session
            .draft
            .add_annotation(2, Annotation::new(0, 5, "third", "fourth"))
            .unwrap();
        session
            .draft
            .add_annotation(0, Annotation::new(6, 10, "post", "tweet"))
            .unwrap();
        session
            .draft
            .add_annotation(0, Annotation::new(0, 5, "first", "opening"))
            .unwrap();
        assert_eq!(
            build_suggestions(&session),
            "Tweet 1:\n  - For \"post\": tweet\n  - For \"first\": opening\n\
             Tweet 3:\n  - For \"third\": fourth"
        );
    }

    #[test]
    fn edit_thread_lists_every_item() {
        let mut session = thread_session(&["a", "b"], EditMode::Edit);
        session.draft.edited_mut(1).unwrap().push_str("ee");
        assert_eq!(
            build_suggestions(&session),
            "Improve the thread based on this edited version:\n\nTweet 1: a\n\nTweet 2: bee"
        );
    }

    #[test]
    fn request_omits_blank_vibe_and_context() {
        let content = ProposalContent::Text("x".into());
        let session = EditSession::new(&content, EditMode::Edit);
        let ctx = RegenerateContext {
            research_id: Some("abc".into()),
            content_type: ContentType::Quote,
            vibe: "  ".into(),
            context: "launch week".into(),
            thread_count: 7,
        };
        let req = build_regenerate_request(&session, &ctx).unwrap();
        assert_eq!(req.research_id, "abc");
        assert_eq!(req.content_type, ContentType::Quote);
        assert_eq!(req.thread_count, 7);
        assert_eq!(req.vibe, None);
        assert_eq!(req.context.as_deref(), Some("launch week"));
    }
}
