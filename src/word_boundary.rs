//! Word-boundary helpers used by the composer for word-wise navigation and
//! deletion.
//!
//! Words are runs of non-whitespace; both functions take and return byte
//! offsets clamped onto `char` boundaries.

/// Return the byte index of the start of the previous word.
///
/// Walks left over any whitespace run, then left over the word itself, and
/// stops at the word's first character.
pub fn beginning_of_previous_word(text: &str, cursor_pos: usize) -> usize {
    let mut pos = clamp_pos_to_char_boundary(text, cursor_pos);
    while let Some((idx, ch)) = text[..pos].char_indices().next_back() {
        if !ch.is_whitespace() {
            break;
        }
        pos = idx;
    }
    while let Some((idx, ch)) = text[..pos].char_indices().next_back() {
        if ch.is_whitespace() {
            break;
        }
        pos = idx;
    }
    pos
}

/// Return the byte index just past the current word, skipping any whitespace
/// run that follows it.
pub fn end_of_next_word(text: &str, cursor_pos: usize) -> usize {
    let mut pos = clamp_pos_to_char_boundary(text, cursor_pos);
    for ch in text[pos..].chars() {
        if ch.is_whitespace() {
            break;
        }
        pos += ch.len_utf8();
    }
    for ch in text[pos..].chars() {
        if !ch.is_whitespace() {
            break;
        }
        pos += ch.len_utf8();
    }
    pos
}

fn clamp_pos_to_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}
