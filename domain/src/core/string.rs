//! String helpers for displaying message content.

/// Collapse a message into a single line and cap it at `max_len` bytes.
///
/// Whitespace runs (including newlines) become a single space. Truncation
/// lands on a UTF-8 character boundary and appends `...`.
pub fn preview(s: &str, max_len: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= max_len {
        return flat;
    }
    let mut end = max_len.saturating_sub(3);
    while end > 0 && !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &flat[..end])
}
