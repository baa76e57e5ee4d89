//! Text helpers
//!
//! Model output is mostly CJK text, so lengths are measured in chars, not
//! bytes.

/// Number of Unicode scalar values in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First `max_chars` chars of `text`, with `...` appended when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// First `max_chars` chars of `text` with no marker
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
