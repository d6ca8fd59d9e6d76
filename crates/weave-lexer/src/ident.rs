// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Identifier grammar and the reserved-word set.

/// Every reserved word, including the ones the grammar does not use yet.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// `[A-Za-z_][A-Za-z0-9_]*`. Reserved words are identifiers lexically; check
/// [`is_keyword`] separately.
pub fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("x1"));
        assert!(is_identifier("_"));
        assert!(is_identifier("Point0"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("9abc"));
        assert!(!is_identifier("abc%"));
        assert!(!is_identifier("g%hi"));
        assert!(!is_identifier("caf\u{e9}"));
    }

    #[test]
    fn keywords() {
        assert!(is_keyword("class"));
        assert!(is_keyword("lambda"));
        assert!(!is_keyword("Class"));
        assert!(!is_keyword("x"));
    }
}
