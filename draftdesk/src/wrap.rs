//! Display-width wrapping for proposal text.
//!
//! Cards wrap at exactly `width` terminal columns (no word wrapping). Wide
//! glyphs such as emoji and CJK take two columns, so a char offset maps to a
//! column span rather than a single cell. The renderer draws rows from
//! [`layout_rows`]; selection bounds and mouse hit-testing go through the same
//! [`Wrapped`] layout so both agree with what is on screen.

use std::ops::Range;

use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;

/// Columns a char occupies when ratatui draws it.
fn char_width(ch: char) -> u16 {
    UnicodeWidthChar::width(ch).unwrap_or(0) as u16
}

/// Row layout of one text at a fixed width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapped {
    /// Half-open char ranges, one per screen row. A `'\n'` ends its row and is
    /// not part of any range. Never empty.
    rows: Vec<Range<usize>>,
    /// Starting column of each char within its row.
    cols: Vec<u16>,
    widths: Vec<u16>,
    width: u16,
}

impl Wrapped {
    pub fn new(text: &str, width: u16) -> Self {
        let width = width.max(1);
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut widths = Vec::new();
        let mut start = 0;
        let mut col: u16 = 0;

        for (idx, ch) in text.chars().enumerate() {
            if ch == '\n' {
                rows.push(start..idx);
                cols.push(col);
                widths.push(0);
                start = idx + 1;
                col = 0;
                continue;
            }
            let w = char_width(ch);
            // A glyph that does not fit moves to the next row whole; a row
            // always takes at least one char.
            if col > 0 && col + w > width {
                rows.push(start..idx);
                start = idx;
                col = 0;
            }
            cols.push(col);
            widths.push(w);
            col += w;
        }
        rows.push(start..cols.len());

        Self {
            rows,
            cols,
            widths,
            width,
        }
    }

    pub fn rows(&self) -> &[Range<usize>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Range<usize>> {
        self.rows
    }

    /// Column just past the last char of `row`.
    fn row_end_col(&self, row: &Range<usize>) -> u16 {
        if row.is_empty() {
            0
        } else {
            self.cols[row.end - 1] + self.widths[row.end - 1]
        }
    }

    /// `(column, row)` of the first cell showing char `offset`.
    ///
    /// Offsets past a row's last char land just after it; a full row pushes
    /// that position to the start of the next row.
    pub fn cell(&self, offset: usize) -> (u16, u16) {
        let row = self
            .rows
            .iter()
            .rposition(|r| r.start <= offset)
            .unwrap_or(0);
        let range = &self.rows[row];
        if offset < range.end {
            return (self.cols[offset], row as u16);
        }
        let col = self.row_end_col(range);
        if col >= self.width {
            (0, (row + 1) as u16)
        } else {
            (col, row as u16)
        }
    }

    /// Char drawn at (`col`, `row`) relative to the text's top-left corner.
    ///
    /// Either half of a wide glyph maps to that glyph. Columns past the end of
    /// a row map to its last char.
    pub fn offset_at(&self, col: u16, row: u16) -> Option<usize> {
        let range = self.rows.get(row as usize)?;
        let hit = range
            .clone()
            .find(|&idx| col < self.cols[idx] + self.widths[idx] && self.widths[idx] > 0);
        Some(hit.unwrap_or_else(|| {
            if range.is_empty() {
                range.start
            } else {
                range.end - 1
            }
        }))
    }

    /// Screen rectangle covering chars `[lo, hi)` inside `area`.
    ///
    /// Single-row selections are exact; multi-row selections span the full width.
    pub fn selection_rect(&self, lo: usize, hi: usize, area: Rect) -> Rect {
        let last = hi.saturating_sub(1).max(lo);
        let (c0, r0) = self.cell(lo);
        let (c1, r1) = self.cell(last);
        if r0 == r1 {
            let last_width = self.widths.get(last).copied().unwrap_or(1).max(1);
            Rect::new(area.x + c0, area.y + r0, (c1 + last_width).saturating_sub(c0), 1)
        } else {
            Rect::new(area.x, area.y + r0, area.width, r1 - r0 + 1)
        }
    }
}

/// Splits `text` into display rows no wider than `width` columns.
///
/// Each row is a half-open char range. There is always at least one row.
pub fn layout_rows(text: &str, width: u16) -> Vec<Range<usize>> {
    Wrapped::new(text, width).into_rows()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_width_and_newlines() {
        let rows = layout_rows("abcdefg\nhi", 3);
        assert_eq!(rows, vec![0..3, 3..6, 6..7, 8..10]);
        assert_eq!(layout_rows("", 5), vec![0..0]);
    }

    #[test]
    fn cells_follow_rows() {
        let wrapped = Wrapped::new("abcdefg\nhi", 3);
        assert_eq!(wrapped.cell(0), (0, 0));
        assert_eq!(wrapped.cell(4), (1, 1));
        assert_eq!(wrapped.cell(7), (1, 2));
        assert_eq!(wrapped.cell(9), (1, 3));
        // End of a full row moves to the next row.
        assert_eq!(Wrapped::new("abc", 3).cell(3), (0, 1));
    }

    #[test]
    fn selection_rect_single_and_multi_row() {
        let area = Rect::new(10, 5, 4, 3);
        let wrapped = Wrapped::new("abcdefgh", 4);
        assert_eq!(wrapped.selection_rect(1, 3, area), Rect::new(11, 5, 2, 1));
        assert_eq!(wrapped.selection_rect(2, 6, area), Rect::new(10, 5, 4, 2));
    }

    #[test]
    fn wide_glyphs_take_two_columns() {
        // 🐱 fills columns 0-1, so `l` (char 2) is drawn at column 3.
        let wrapped = Wrapped::new("🐱 love", 40);
        assert_eq!(wrapped.cell(2), (3, 0));
        assert_eq!(wrapped.offset_at(3, 0), Some(2));
        assert_eq!(wrapped.offset_at(0, 0), Some(0));
        assert_eq!(wrapped.offset_at(1, 0), Some(0));
        assert_eq!(wrapped.offset_at(30, 0), Some(5));
        assert_eq!(
            wrapped.selection_rect(2, 6, Rect::new(10, 5, 40, 3)),
            Rect::new(13, 5, 4, 1)
        );
        assert_eq!(
            wrapped.selection_rect(0, 1, Rect::new(10, 5, 40, 3)),
            Rect::new(10, 5, 2, 1)
        );
    }

    #[test]
    fn wide_glyph_that_does_not_fit_starts_the_next_row() {
        let wrapped = Wrapped::new("ab🐱c", 3);
        assert_eq!(wrapped.rows(), &[0..2, 2..4]);
        assert_eq!(wrapped.cell(2), (0, 1));
        assert_eq!(wrapped.cell(3), (2, 1));
        assert_eq!(wrapped.offset_at(2, 1), Some(3));
    }
}
