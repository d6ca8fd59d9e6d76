// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Layout pass: turns leading whitespace into `Indent`/`Dedent` tokens.
//!
//! Newlines inside brackets are dropped, blank lines collapse, and the
//! stream always ends with `Newline`, the pending dedents, then `Eof`.

use weave_ast::token::{Token, TokenKind};
use weave_ast::Span;

use crate::lexer::LexError;

const TAB_STOP: usize = 8;

pub(crate) fn resolve(source: &str, raw: Vec<Token>, errors: &mut Vec<LexError>) -> Vec<Token> {
    let mut out = Vec::with_capacity(raw.len() + 8);
    let mut indents = vec![0usize];
    let mut brackets: Vec<char> = Vec::new();
    let mut at_line_start = true;

    for token in raw {
        if token.kind == TokenKind::Newline {
            if brackets.is_empty() && !at_line_start {
                out.push(token);
                at_line_start = true;
            }
            continue;
        }

        if at_line_start && brackets.is_empty() {
            let width = indent_width(source, token.span.start);
            let top = indents.last().copied().unwrap_or(0);
            if width > top {
                indents.push(width);
                out.push(layout_token(TokenKind::Indent, token.span.start));
            } else {
                while width < indents.last().copied().unwrap_or(0) {
                    indents.pop();
                    out.push(layout_token(TokenKind::Dedent, token.span.start));
                }
                if width != indents.last().copied().unwrap_or(0) {
                    errors.push(LexError::bad_dedent(token.span.start));
                }
            }
            at_line_start = false;
        }

        match token.kind {
            TokenKind::LParen => brackets.push('('),
            TokenKind::LBracket => brackets.push('['),
            TokenKind::LBrace => brackets.push('{'),
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                if brackets.pop().is_none() {
                    let ch = source[token.span.start..].chars().next().unwrap_or(')');
                    errors.push(LexError::unbalanced(token.span.start, ch));
                }
            }
            _ => {}
        }
        out.push(token);
    }

    let end = source.len();
    if !at_line_start {
        out.push(layout_token(TokenKind::Newline, end));
    }
    while indents.len() > 1 {
        indents.pop();
        out.push(layout_token(TokenKind::Dedent, end));
    }
    out.push(layout_token(TokenKind::Eof, end));
    out
}

fn layout_token(kind: TokenKind, pos: usize) -> Token {
    Token { kind, span: Span::new(pos, pos) }
}

/// Column of the first token on a line, with tabs advancing to the next
/// multiple of eight.
fn indent_width(source: &str, token_start: usize) -> usize {
    let line_start = source[..token_start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let mut width = 0;
    for c in source[line_start..token_start].chars() {
        match c {
            '\t' => width = (width / TAB_STOP + 1) * TAB_STOP,
            _ => width += 1,
        }
    }
    width
}
