//! Selection-to-offset resolution over a fragmented inline-text tree.
//!
//! Rendered text is split into many leaves: plain runs interleaved with
//! highlight elements for existing annotations. A selection only knows the
//! leaf it starts in and a local offset inside that leaf, so the absolute
//! offset into the original string has to be rebuilt by walking every leaf
//! under the container in document order and summing their lengths.
//!
//! [`RenderTree`] is the virtual stand-in for a live document. Besides the
//! traversal the resolver needs, it offers the caret primitives a host uses to
//! build a [`TextSelection`] (`boundary_at`, `step_forward`, `select`, ...).

use std::cmp::Ordering;

use crate::store::AnnotationSet;
use crate::text::{char_len, char_slice};
use crate::types::{AnnotationId, TextSegment};

/// Index of a node inside a [`RenderTree`].
pub type NodeId = usize;

/// One node of the inline-text tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    /// Structural grouping with no styling of its own.
    Container { children: Vec<NodeId> },
    /// Highlighted run for an existing annotation.
    Highlight {
        annotation_id: AnnotationId,
        children: Vec<NodeId>,
    },
    /// Text-bearing leaf.
    Text(String),
}

/// Screen-space rectangle in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// This rectangle with `origin`'s top-left corner as (0, 0).
    pub fn relative_to(self, origin: Bounds) -> Bounds {
        Bounds {
            x: self.x.saturating_sub(origin.x),
            y: self.y.saturating_sub(origin.y),
            width: self.width,
            height: self.height,
        }
    }
}

/// A caret position local to one text leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

/// A live selection as the host reports it: start/end boundaries in
/// document order, the selected text, and its on-screen rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSelection {
    pub start: Boundary,
    pub end: Boundary,
    pub text: String,
    pub bounds: Bounds,
}

impl TextSelection {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end || self.text.is_empty()
    }
}

/// A selection mapped back onto the original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Selection rectangle relative to the container, for placing the
    /// suggestion popover.
    pub popover: Bounds,
}

/// Why a selection produced no candidate range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unresolvable {
    #[error("selection is empty")]
    Collapsed,
    #[error("selection does not start inside the container")]
    OutsideContainer,
    #[error("selection overlaps an existing annotation")]
    Overlap,
}

/// Arena-backed inline-text tree. Node 0 is the root container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTree {
    nodes: Vec<RenderNode>,
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![RenderNode::Container { children: Vec::new() }],
        }
    }

    /// Renders segments the way the card view does: plain runs become text
    /// leaves of the root, annotated runs become a highlight wrapping a leaf.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = TextSegment<'a>>) -> Self {
        let mut tree = Self::new();
        for seg in segments {
            match seg.annotation {
                Some(ann) => {
                    let hl = tree.push_highlight(Self::ROOT, ann.id.clone());
                    tree.push_text(hl, seg.text);
                }
                None => {
                    tree.push_text(Self::ROOT, seg.text);
                }
            }
        }
        tree
    }

    fn push(&mut self, parent: NodeId, node: RenderNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        match self.nodes.get_mut(parent) {
            Some(RenderNode::Container { children })
            | Some(RenderNode::Highlight { children, .. }) => children.push(id),
            _ => {}
        }
        id
    }

    /// Appends a text leaf under `parent`.
    pub fn push_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push(parent, RenderNode::Text(text.into()))
    }

    /// Appends a highlight element under `parent`.
    pub fn push_highlight(&mut self, parent: NodeId, annotation_id: AnnotationId) -> NodeId {
        self.push(
            parent,
            RenderNode::Highlight {
                annotation_id,
                children: Vec::new(),
            },
        )
    }

    /// Appends an unstyled grouping element under `parent`.
    pub fn push_group(&mut self, parent: NodeId) -> NodeId {
        self.push(parent, RenderNode::Container { children: Vec::new() })
    }

    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(id)
    }

    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id)? {
            RenderNode::Text(text) => Some(text),
            _ => None,
        }
    }

    fn leaf_len(&self, id: NodeId) -> usize {
        self.leaf_text(id).map(char_len).unwrap_or(0)
    }

    /// Text leaves under `container`, in document order.
    pub fn leaves_under(&self, container: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![container];
        while let Some(id) = stack.pop() {
            match self.nodes.get(id) {
                Some(RenderNode::Text(_)) => out.push(id),
                Some(RenderNode::Container { children })
                | Some(RenderNode::Highlight { children, .. }) => {
                    stack.extend(children.iter().rev());
                }
                None => {}
            }
        }
        out
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.leaves_under(Self::ROOT)
    }

    /// Concatenated text of every leaf.
    pub fn text(&self) -> String {
        self.leaves()
            .into_iter()
            .filter_map(|id| self.leaf_text(id))
            .collect()
    }

    /// Absolute char offset of `boundary` under `container`: the running sum
    /// of every preceding leaf plus the local offset. `None` when the boundary
    /// leaf is not reached during the walk.
    pub fn offset_within(&self, container: NodeId, boundary: Boundary) -> Option<usize> {
        let mut running = 0;
        for leaf in self.leaves_under(container) {
            if leaf == boundary.node {
                return Some(running + boundary.offset);
            }
            running += self.leaf_len(leaf);
        }
        None
    }

    /// Caret before the first character.
    pub fn first_boundary(&self) -> Option<Boundary> {
        let first = *self.leaves().first()?;
        Some(self.normalize(Boundary { node: first, offset: 0 }))
    }

    /// Caret after the last character.
    pub fn last_boundary(&self) -> Option<Boundary> {
        let last = *self.leaves().last()?;
        Some(Boundary {
            node: last,
            offset: self.leaf_len(last),
        })
    }

    /// Caret at absolute `offset` (clamped to the text length).
    pub fn boundary_at(&self, offset: usize) -> Option<Boundary> {
        let mut running = 0;
        for leaf in self.leaves() {
            let len = self.leaf_len(leaf);
            if offset < running + len {
                return Some(Boundary {
                    node: leaf,
                    offset: offset - running,
                });
            }
            running += len;
        }
        self.last_boundary()
    }

    /// A caret sitting at the end of a leaf is shown at the start of the next
    /// non-empty leaf, the way a document caret does.
    fn normalize(&self, boundary: Boundary) -> Boundary {
        if boundary.offset < self.leaf_len(boundary.node) {
            return boundary;
        }
        let leaves = self.leaves();
        let Some(pos) = leaves.iter().position(|l| *l == boundary.node) else {
            return boundary;
        };
        leaves[pos + 1..]
            .iter()
            .find(|l| self.leaf_len(**l) > 0)
            .map(|l| Boundary { node: *l, offset: 0 })
            .unwrap_or(boundary)
    }

    /// Moves the caret one character right; stays put at the end.
    pub fn step_forward(&self, boundary: Boundary) -> Boundary {
        let b = self.normalize(boundary);
        if b.offset < self.leaf_len(b.node) {
            self.normalize(Boundary {
                node: b.node,
                offset: b.offset + 1,
            })
        } else {
            b
        }
    }

    /// Moves the caret one character left; stays put at the start.
    pub fn step_backward(&self, boundary: Boundary) -> Boundary {
        if boundary.offset > 0 {
            return Boundary {
                node: boundary.node,
                offset: boundary.offset - 1,
            };
        }
        let leaves = self.leaves();
        let Some(pos) = leaves.iter().position(|l| *l == boundary.node) else {
            return boundary;
        };
        leaves[..pos]
            .iter()
            .rev()
            .find(|l| self.leaf_len(**l) > 0)
            .map(|l| Boundary {
                node: *l,
                offset: self.leaf_len(*l) - 1,
            })
            .unwrap_or(boundary)
    }

    fn compare(&self, leaves: &[NodeId], a: Boundary, b: Boundary) -> Ordering {
        let pa = leaves.iter().position(|l| *l == a.node);
        let pb = leaves.iter().position(|l| *l == b.node);
        pa.cmp(&pb).then(a.offset.cmp(&b.offset))
    }

    /// Text between two boundaries given in document order.
    pub fn text_between(&self, start: Boundary, end: Boundary) -> String {
        let leaves = self.leaves();
        let mut out = String::new();
        let mut inside = false;
        for leaf in leaves {
            let Some(text) = self.leaf_text(leaf) else {
                continue;
            };
            let len = char_len(text);
            let from = if leaf == start.node {
                inside = true;
                start.offset
            } else {
                0
            };
            if !inside {
                continue;
            }
            if leaf == end.node {
                out.push_str(char_slice(text, from, end.offset));
                break;
            }
            out.push_str(char_slice(text, from, len));
        }
        out
    }

    /// Builds the selection a host would report for a drag from `anchor` to
    /// `focus`, in either direction.
    pub fn select(&self, anchor: Boundary, focus: Boundary, bounds: Bounds) -> TextSelection {
        let leaves = self.leaves();
        let (start, end) = match self.compare(&leaves, anchor, focus) {
            Ordering::Greater => (focus, anchor),
            _ => (anchor, focus),
        };
        TextSelection {
            start,
            end,
            text: self.text_between(start, end),
            bounds,
        }
    }
}

/// Maps `selection` onto `[start, end)` of the original string rendered under
/// `container`.
///
/// `start` is the running offset of the selection's start leaf plus its local
/// offset; `end` is `start` plus the selected text's length. Rejects collapsed
/// selections, selections whose start leaf is not under `container`, and
/// ranges overlapping an annotation in `existing`.
pub fn resolve(
    tree: &RenderTree,
    container: NodeId,
    selection: &TextSelection,
    container_bounds: Bounds,
    existing: &AnnotationSet,
) -> Result<ResolvedSelection, Unresolvable> {
    if selection.is_collapsed() {
        return Err(Unresolvable::Collapsed);
    }
    let start = tree
        .offset_within(container, selection.start)
        .ok_or(Unresolvable::OutsideContainer)?;
    let end = start + char_len(&selection.text);

    if existing.overlaps(start, end) {
        tracing::debug!(start, end, "selection overlaps an existing annotation; ignored");
        return Err(Unresolvable::Overlap);
    }

    Ok(ResolvedSelection {
        start,
        end,
        text: selection.text.clone(),
        popover: selection.bounds.relative_to(container_bounds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;
    use crate::types::Annotation;

    /// "abc" + highlighted "XYZ" + "def" as three sibling nodes.
    fn fragmented() -> (RenderTree, NodeId, NodeId, NodeId) {
        let mut tree = RenderTree::new();
        let abc = tree.push_text(RenderTree::ROOT, "abc");
        let hl = tree.push_highlight(RenderTree::ROOT, "ann-1".into());
        let xyz = tree.push_text(hl, "XYZ");
        let def = tree.push_text(RenderTree::ROOT, "def");
        (tree, abc, xyz, def)
    }

    #[test]
    fn resolves_offsets_across_fragmented_siblings() {
        let (tree, _, _, def) = fragmented();
        let sel = tree.select(
            Boundary { node: def, offset: 0 },
            Boundary { node: def, offset: 2 },
            Bounds::default(),
        );
        assert_eq!(sel.text, "de");
        let got = resolve(&tree, RenderTree::ROOT, &sel, Bounds::default(), &AnnotationSet::new())
            .unwrap();
        assert_eq!((got.start, got.end), (6, 8));
        assert_eq!(got.text, "de");
    }

    #[test]
    fn backwards_drag_resolves_like_forwards() {
        let (tree, abc, _, def) = fragmented();
        let sel = tree.select(
            Boundary { node: def, offset: 1 },
            Boundary { node: abc, offset: 1 },
            Bounds::default(),
        );
        assert_eq!(sel.text, "bcXYZd");
        let got = resolve(&tree, RenderTree::ROOT, &sel, Bounds::default(), &AnnotationSet::new())
            .unwrap();
        assert_eq!((got.start, got.end), (1, 7));
    }

    #[test]
    fn nested_groups_do_not_change_offsets() {
        let mut tree = RenderTree::new();
        let para = tree.push_group(RenderTree::ROOT);
        tree.push_text(para, "one ");
        let hl = tree.push_highlight(para, "a".into());
        let inner = tree.push_group(hl);
        tree.push_text(inner, "two");
        let tail = tree.push_text(RenderTree::ROOT, " three");
        assert_eq!(tree.text(), "one two three");

        let sel = tree.select(
            Boundary { node: tail, offset: 1 },
            Boundary { node: tail, offset: 6 },
            Bounds::default(),
        );
        let got = resolve(&tree, RenderTree::ROOT, &sel, Bounds::default(), &AnnotationSet::new())
            .unwrap();
        assert_eq!((got.start, got.end), (8, 13));
        assert_eq!(got.text, "three");
    }

    #[test]
    fn collapsed_selection_is_rejected() {
        let (tree, abc, _, _) = fragmented();
        let at = Boundary { node: abc, offset: 1 };
        let sel = tree.select(at, at, Bounds::default());
        assert_eq!(
            resolve(&tree, RenderTree::ROOT, &sel, Bounds::default(), &AnnotationSet::new()),
            Err(Unresolvable::Collapsed)
        );
    }

    #[test]
    fn selection_outside_container_is_rejected() {
        let mut tree = RenderTree::new();
        let left = tree.push_group(RenderTree::ROOT);
        tree.push_text(left, "inside");
        let right = tree.push_group(RenderTree::ROOT);
        let other = tree.push_text(right, "elsewhere");
        let sel = tree.select(
            Boundary { node: other, offset: 0 },
            Boundary { node: other, offset: 4 },
            Bounds::default(),
        );
        assert_eq!(
            resolve(&tree, left, &sel, Bounds::default(), &AnnotationSet::new()),
            Err(Unresolvable::OutsideContainer)
        );
    }

    #[test]
    fn overlap_with_existing_annotation_is_rejected() {
        let text = "I love cats and dogs";
        let mut existing = AnnotationSet::new();
        existing
            .add(Annotation::new(2, 6, "love", "stronger verb"))
            .unwrap();
        let tree = RenderTree::from_segments(segment(text, existing.as_slice()));

        let from = tree.boundary_at(4).unwrap();
        let to = tree.boundary_at(9).unwrap();
        let sel = tree.select(from, to, Bounds::default());
        assert_eq!(sel.text, "ve ca");
        assert_eq!(
            resolve(&tree, RenderTree::ROOT, &sel, Bounds::default(), &existing),
            Err(Unresolvable::Overlap)
        );
    }

    #[test]
    fn popover_bounds_are_relative_to_container() {
        let (tree, abc, _, _) = fragmented();
        let sel = tree.select(
            Boundary { node: abc, offset: 0 },
            Boundary { node: abc, offset: 2 },
            Bounds::new(14, 9, 2, 1),
        );
        let got = resolve(
            &tree,
            RenderTree::ROOT,
            &sel,
            Bounds::new(10, 5, 40, 6),
            &AnnotationSet::new(),
        )
        .unwrap();
        assert_eq!(got.popover, Bounds::new(4, 4, 2, 1));
    }

    #[test]
    fn caret_steps_across_leaf_edges() {
        let (tree, abc, xyz, def) = fragmented();
        let mut caret = tree.first_boundary().unwrap();
        assert_eq!(caret, Boundary { node: abc, offset: 0 });
        for _ in 0..3 {
            caret = tree.step_forward(caret);
        }
        assert_eq!(caret, Boundary { node: xyz, offset: 0 });
        caret = tree.step_backward(caret);
        assert_eq!(caret, Boundary { node: abc, offset: 2 });

        let end = tree.last_boundary().unwrap();
        assert_eq!(end, Boundary { node: def, offset: 3 });
        assert_eq!(tree.step_forward(end), end);
        assert_eq!(tree.boundary_at(100), Some(end));
    }

    #[test]
    fn boundary_at_round_trips_through_offset_within() {
        let (tree, ..) = fragmented();
        for offset in 0..=9 {
            let b = tree.boundary_at(offset).unwrap();
            assert_eq!(tree.offset_within(RenderTree::ROOT, b), Some(offset));
        }
    }
}
