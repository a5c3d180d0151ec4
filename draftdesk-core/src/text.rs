//! Character-offset helpers.
//!
//! Every offset in draftdesk counts Unicode scalar values (`char`s), not bytes,
//! so an emoji in a proposal never splits mid code point.

/// Number of `char`s in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `char_idx`-th character, or `text.len()` past the end.
pub fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Returns the substring covering the half-open char range `[start, end)`.
///
/// Out-of-range bounds are clamped to the end of the string; an inverted range
/// yields `""`.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    if end <= start {
        return "";
    }
    let from = byte_offset(text, start);
    let to = from + byte_offset(&text[from..], end - start);
    &text[from..to]
}

/// First `max` chars of `text`.
pub fn char_prefix(text: &str, max: usize) -> &str {
    &text[..byte_offset(text, max)]
}
