//! Utility functions for string manipulation.

/// Find the nearest valid UTF-8 char boundary at or before the given byte index.
#[inline]
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Truncate a string to approximately `max_len` bytes, ensuring valid UTF-8 boundaries.
/// Returns a slice of the original string.
#[inline]
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let boundary = floor_char_boundary(s, max_len);
        &s[..boundary]
    }
}
