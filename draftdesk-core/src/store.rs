//! Annotation store: add-ordered, non-overlapping annotation collections.
//!
//! A single-text card owns one [`AnnotationSet`]. A thread card owns a
//! [`ThreadAnnotations`] map with an independent set per sub-post index.

use std::collections::BTreeMap;

use crate::error::AnnotationError;
use crate::types::Annotation;

/// Annotations over one fixed string, kept in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    items: Vec<Annotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `candidate` unless its suggestion is blank, its range is empty,
    /// or it overlaps an existing member. A rejected add leaves the set as-is.
    pub fn add(&mut self, candidate: Annotation) -> Result<&Annotation, AnnotationError> {
        self.check(&candidate)?;
        self.items.push(candidate);
        Ok(&self.items[self.items.len() - 1])
    }

    /// Runs the insertion rules without inserting.
    pub fn check(&self, candidate: &Annotation) -> Result<(), AnnotationError> {
        if candidate.suggestion.trim().is_empty() {
            return Err(AnnotationError::EmptySuggestion);
        }
        if candidate.start >= candidate.end {
            return Err(AnnotationError::EmptyRange);
        }
        match self.overlapping(candidate.start, candidate.end) {
            Some(existing) => Err(AnnotationError::Overlap(existing.id.clone())),
            None => Ok(()),
        }
    }

    /// Removes the annotation with `id`. Absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<Annotation> {
        let idx = self.items.iter().position(|a| a.id == id)?;
        Some(self.items.remove(idx))
    }

    /// First member intersecting `[start, end)`, if any.
    pub fn overlapping(&self, start: usize, end: usize) -> Option<&Annotation> {
        self.items.iter().find(|a| a.overlaps(start, end))
    }

    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.overlapping(start, end).is_some()
    }

    /// The annotation covering the char at `offset`.
    pub fn at(&self, offset: usize) -> Option<&Annotation> {
        self.items.iter().find(|a| a.covers(offset))
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Per-sub-post annotation sets for a thread, keyed by item index.
///
/// A set is created on the first successful add for its index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadAnnotations {
    by_index: BTreeMap<usize, AnnotationSet>,
}

impl ThreadAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        index: usize,
        candidate: Annotation,
    ) -> Result<&Annotation, AnnotationError> {
        match self.by_index.get(&index) {
            Some(set) => set.check(&candidate)?,
            None => AnnotationSet::new().check(&candidate)?,
        }
        self.by_index.entry(index).or_default().add(candidate)
    }

    pub fn remove(&mut self, index: usize, id: &str) -> Option<Annotation> {
        self.by_index.get_mut(&index)?.remove(id)
    }

    pub fn get(&self, index: usize) -> Option<&AnnotationSet> {
        self.by_index.get(&index)
    }

    /// Sum of annotations across every index.
    pub fn total(&self) -> usize {
        self.by_index.values().map(AnnotationSet::len).sum()
    }

    /// Non-empty sets in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &AnnotationSet)> {
        self.by_index
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(idx, set)| (*idx, set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(start: usize, end: usize, suggestion: &str) -> Annotation {
        Annotation::new(start, end, "x", suggestion)
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut set = AnnotationSet::new();
        set.add(ann(10, 12, "later")).unwrap();
        set.add(ann(0, 2, "earlier")).unwrap();
        let order: Vec<&str> = set.iter().map(|a| a.suggestion.as_str()).collect();
        assert_eq!(order, vec!["later", "earlier"]);
    }

    #[test]
    fn overlapping_candidate_is_rejected_and_set_unchanged() {
        let mut set = AnnotationSet::new();
        let first_id = set.add(ann(2, 6, "a")).unwrap().id.clone();
        let before = set.clone();

        for (start, end) in [(0, 3), (5, 9), (3, 4), (1, 8), (2, 6)] {
            let err = set.add(ann(start, end, "b")).unwrap_err();
            assert_eq!(err, AnnotationError::Overlap(first_id.clone()));
            assert_eq!(set, before);
        }

        // Touching ranges share no character.
        set.add(ann(6, 8, "c")).unwrap();
        set.add(ann(0, 2, "d")).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn blank_suggestion_and_empty_range_are_rejected() {
        let mut set = AnnotationSet::new();
        assert_eq!(set.add(ann(0, 3, "   ")), Err(AnnotationError::EmptySuggestion));
        assert_eq!(set.add(ann(3, 3, "ok")), Err(AnnotationError::EmptyRange));
        assert!(set.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut set = AnnotationSet::new();
        let id = set.add(ann(0, 1, "a")).unwrap().id.clone();
        let before = set.clone();
        assert!(set.remove("no-such-id").is_none());
        assert_eq!(set, before);
        assert!(set.remove(&id).is_some());
        assert!(set.remove(&id).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn at_finds_covering_annotation() {
        let mut set = AnnotationSet::new();
        set.add(ann(4, 7, "a")).unwrap();
        assert!(set.at(3).is_none());
        assert_eq!(set.at(4).map(|a| a.start), Some(4));
        assert_eq!(set.at(6).map(|a| a.start), Some(4));
        assert!(set.at(7).is_none());
    }

    #[test]
    fn thread_sets_are_independent_per_index() {
        let mut thread = ThreadAnnotations::new();
        thread.add(0, ann(0, 4, "a")).unwrap();
        // Same range on another index does not collide.
        thread.add(2, ann(0, 4, "b")).unwrap();
        assert_eq!(thread.total(), 2);
        assert!(thread.get(1).is_none());

        let err = thread.add(0, ann(2, 5, "c")).unwrap_err();
        assert!(matches!(err, AnnotationError::Overlap(_)));
        assert_eq!(thread.total(), 2);

        let indices: Vec<usize> = thread.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn failed_first_add_does_not_create_a_set() {
        let mut thread = ThreadAnnotations::new();
        assert!(thread.add(3, ann(0, 1, "")).is_err());
        assert!(thread.get(3).is_none());
        assert_eq!(thread.iter().count(), 0);
    }
}
