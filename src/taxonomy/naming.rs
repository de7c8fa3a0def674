//! Mapping between camel-case entity identifiers and natural names.
//!
//! Taxonomy entities are stored under camel-case identifiers
//! (`IntegerMultiplication`); the oracle reads and writes natural names
//! (`Integer Multiplication`). The mapping is lossless in both directions
//! for well-formed identifiers.

/// Convert a camel-case identifier into a space-separated natural name.
///
/// A word boundary falls between a lowercase letter and an uppercase
/// letter, and between an acronym run and a following capitalized word
/// (`"HTTPServer"` becomes `"HTTP Server"`). Digits attach to the word
/// they follow. Single-word identifiers map to themselves.
pub fn natural_name(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut out = String::with_capacity(identifier.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && is_word_boundary(&chars, i) {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Convert a natural name back into its camel-case identifier by removing
/// the spaces. Inverse of [`natural_name`]:
/// `identifier(&natural_name(x)) == x` for well-formed identifiers.
pub fn identifier(natural_name: &str) -> String {
    natural_name.chars().filter(|c| *c != ' ').collect()
}

// A boundary before `chars[i]` mirrors the classic camel-case split:
// lower→Upper, or Upper→Upper with a lowercase following (acronym end).
fn is_word_boundary(chars: &[char], i: usize) -> bool {
    let prev = chars[i - 1];
    let cur = chars[i];
    if prev.is_lowercase() && cur.is_uppercase() {
        return true;
    }
    if prev.is_uppercase() && cur.is_uppercase() {
        if let Some(next) = chars.get(i + 1) {
            return next.is_lowercase();
        }
    }
    false
}
