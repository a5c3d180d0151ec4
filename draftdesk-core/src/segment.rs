//! Segment model: splits a string into plain and annotated runs for rendering.
//!
//! Segments are never stored. Callers re-run [`segment`] whenever the text or
//! its annotation set changes; the iterator holds no state beyond one pass.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::text::{byte_offset, char_len};
use crate::types::{Annotation, TextSegment};

/// Returns the ordered, gap-free segments covering `text`.
///
/// Annotations are visited by ascending `start` (stable for ties). Concatenating
/// the yielded `text` fields reproduces `text` exactly. An annotation that starts
/// before the cursor or past the end of `text` is skipped; one that runs past
/// the end is clamped. Empty `text` yields a single empty plain segment.
pub fn segment<'a>(text: &'a str, annotations: &'a [Annotation]) -> Segments<'a> {
    let mut ordered: Vec<&'a Annotation> = annotations.iter().collect();
    ordered.sort_by_key(|a| a.start);
    Segments {
        text,
        total: char_len(text),
        upcoming: ordered.into_iter().peekable(),
        cursor: 0,
        cursor_byte: 0,
        emitted: false,
    }
}

/// Lazy iterator returned by [`segment`].
pub struct Segments<'a> {
    text: &'a str,
    total: usize,
    upcoming: Peekable<IntoIter<&'a Annotation>>,
    cursor: usize,
    cursor_byte: usize,
    emitted: bool,
}

impl<'a> Segments<'a> {
    /// Emits `[cursor, end)` and advances the cursor past it.
    fn take(&mut self, end: usize, annotation: Option<&'a Annotation>) -> TextSegment<'a> {
        let rest = &self.text[self.cursor_byte..];
        let len = byte_offset(rest, end - self.cursor);
        let seg = TextSegment {
            start: self.cursor,
            end,
            text: &rest[..len],
            annotation,
        };
        self.cursor = end;
        self.cursor_byte += len;
        self.emitted = true;
        seg
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = TextSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&ann) = self.upcoming.peek() {
            let end = ann.end.min(self.total);
            if ann.start < self.cursor || ann.start >= end {
                self.upcoming.next();
                continue;
            }
            if ann.start > self.cursor {
                return Some(self.take(ann.start, None));
            }
            self.upcoming.next();
            return Some(self.take(end, Some(ann)));
        }

        if self.cursor < self.total || !self.emitted {
            let total = self.total;
            return Some(self.take(total, None));
        }
        None
    }
}
