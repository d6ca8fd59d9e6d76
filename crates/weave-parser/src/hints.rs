// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.
//!
//! Kept separate from the main parser to avoid clutter.

use weave_ast::token::TokenKind;

/// Get a hint for an "expected X" error based on context.
pub fn for_expected(expected: &str, found: &TokenKind) -> Option<&'static str> {
    match (expected, found) {
        ("':'", TokenKind::Newline) => Some("block headers end with ':'"),
        ("':'", TokenKind::Eq) => Some("use '==' to compare"),
        ("':'", _) => Some("block headers end with ':'"),

        ("indented block", _) => Some("indent the body under the header, or write 'pass'"),

        ("')'", TokenKind::Eof) => Some("add ')' to close the parenthesis"),
        ("']'", TokenKind::Eof) => Some("add ']' to close the bracket"),
        ("'}'", TokenKind::Eof) => Some("add '}' to close the dict"),

        ("'in'", TokenKind::Eq) => Some("loops are written 'for name in items:'"),

        ("expression", TokenKind::Newline) => Some("statement is incomplete"),
        ("expression", TokenKind::Reserved(_)) => Some("this word is reserved"),
        ("expression", _) => Some("try a value, a name, or a call"),

        ("a name", TokenKind::Int(_)) => Some("names can't start with a number"),
        ("a name", TokenKind::Reserved(_)) => Some("reserved words can't be used as names"),
        ("a name", _) => Some("names start with a letter or '_'"),

        ("end of line", TokenKind::Eq) => Some("chained assignment is 'a = b = value'"),
        ("end of line", _) => Some("put each statement on its own line or separate with ';'"),

        _ => None,
    }
}
