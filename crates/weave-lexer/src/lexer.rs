//! The lexer implementation using logos.

use logos::Logos;
use weave_ast::token::{Token, TokenKind};
use weave_ast::Span;

use crate::ident::is_keyword;
use crate::layout;

/// Raw token type for logos - values are parsed in a second pass.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f]+")]
enum RawToken {
    // === Keywords used by the grammar ===
    #[token("def")]
    Def,
    #[token("class")]
    Class,
    #[token("return")]
    Return,
    #[token("pass")]
    Pass,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("is")]
    Is,
    #[token("None")]
    None,
    #[token("True")]
    True,
    #[token("False")]
    False,

    // === Operators (longer first) ===
    #[token("//=")]
    SlashSlashEq,
    #[token("**")]
    StarStar,
    #[token("//")]
    SlashSlash,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("@")]
    At,
    #[token(".")]
    Dot,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,

    #[token("\n")]
    #[token("\r\n")]
    Newline,

    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    // Backslash joins the next physical line
    #[regex(r"\\\r?\n", logos::skip)]
    Continuation,

    // === Literals ===
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    HexInt,
    #[regex(r"0[oO][0-7_]+")]
    OctInt,
    #[regex(r"0[bB][01_]+")]
    BinInt,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+")]
    Float,
    #[regex(r"[0-9][0-9_]*")]
    DecInt,

    #[regex(r#""""([^"\\]|\\.|"[^"]|""[^"])*""""#)]
    #[regex(r"'''([^'\\]|\\.|'[^']|''[^'])*'''")]
    TripleString,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    String,

    // === Identifier (after keywords) ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Lexer for weave source.
pub struct Lexer<'a> {
    source: &'a str,
    errors: Vec<LexError>,
}

/// Maximum number of errors before stopping.
const MAX_ERRORS: usize = 20;

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, errors: Vec::new() }
    }

    /// Tokenize the entire source, collecting multiple errors.
    pub fn tokenize(&mut self) -> LexResult {
        let raw = self.scan();
        let tokens = layout::resolve(self.source, raw, &mut self.errors);
        LexResult {
            tokens,
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Flat token stream without layout tokens, newlines included.
    fn scan(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut logos_lexer = RawToken::lexer(self.source);

        while let Some(result) = logos_lexer.next() {
            if self.errors.len() >= MAX_ERRORS {
                break;
            }

            let span = logos_lexer.span();
            let slice = logos_lexer.slice();

            let kind = match result {
                Ok(raw) => match convert_token(raw, slice, span.start) {
                    Ok(kind) => kind,
                    Err(e) => {
                        self.errors.push(e);
                        continue;
                    }
                },
                Err(()) => {
                    let ch = self.source[span.start..].chars().next().unwrap_or('?');
                    let error = if ch == '"' || ch == '\'' {
                        LexError::unterminated_string(span.start, ch)
                    } else {
                        LexError::unexpected_char(ch, span.start)
                    };
                    self.errors.push(error);
                    continue;
                }
            };

            tokens.push(Token {
                kind,
                span: Span::new(span.start, span.end),
            });
        }
        tokens
    }
}

/// Convert a raw logos token to a `TokenKind`, parsing literals.
fn convert_token(raw: RawToken, slice: &str, start: usize) -> Result<TokenKind, LexError> {
    let end = start + slice.len();
    Ok(match raw {
        RawToken::Def => TokenKind::Def,
        RawToken::Class => TokenKind::Class,
        RawToken::Return => TokenKind::Return,
        RawToken::Pass => TokenKind::Pass,
        RawToken::If => TokenKind::If,
        RawToken::Elif => TokenKind::Elif,
        RawToken::Else => TokenKind::Else,
        RawToken::For => TokenKind::For,
        RawToken::In => TokenKind::In,
        RawToken::While => TokenKind::While,
        RawToken::Break => TokenKind::Break,
        RawToken::Continue => TokenKind::Continue,
        RawToken::And => TokenKind::And,
        RawToken::Or => TokenKind::Or,
        RawToken::Not => TokenKind::Not,
        RawToken::Is => TokenKind::Is,
        RawToken::None => TokenKind::None,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,

        RawToken::SlashSlashEq => TokenKind::SlashSlashEq,
        RawToken::StarStar => TokenKind::StarStar,
        RawToken::SlashSlash => TokenKind::SlashSlash,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::BangEq => TokenKind::BangEq,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::LtLt => TokenKind::LtLt,
        RawToken::GtGt => TokenKind::GtGt,
        RawToken::PlusEq => TokenKind::PlusEq,
        RawToken::MinusEq => TokenKind::MinusEq,
        RawToken::StarEq => TokenKind::StarEq,
        RawToken::SlashEq => TokenKind::SlashEq,
        RawToken::PercentEq => TokenKind::PercentEq,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Eq => TokenKind::Eq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Gt => TokenKind::Gt,
        RawToken::Amp => TokenKind::Amp,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::Caret => TokenKind::Caret,
        RawToken::Tilde => TokenKind::Tilde,
        RawToken::At => TokenKind::At,
        RawToken::Dot => TokenKind::Dot,

        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Semi => TokenKind::Semi,
        RawToken::Newline => TokenKind::Newline,

        RawToken::HexInt => TokenKind::Int(parse_radix(&slice[2..], 16, start, end)?),
        RawToken::OctInt => TokenKind::Int(parse_radix(&slice[2..], 8, start, end)?),
        RawToken::BinInt => TokenKind::Int(parse_radix(&slice[2..], 2, start, end)?),
        RawToken::DecInt => TokenKind::Int(parse_radix(slice, 10, start, end)?),
        RawToken::Float => {
            let clean: String = slice.chars().filter(|c| *c != '_').collect();
            TokenKind::Float(clean.parse().map_err(|_| LexError::invalid_number(start, end))?)
        }
        RawToken::TripleString => TokenKind::String(parse_string(&slice[3..slice.len() - 3])),
        RawToken::String => TokenKind::String(parse_string(&slice[1..slice.len() - 1])),

        RawToken::Ident if is_keyword(slice) => TokenKind::Reserved(slice.to_string()),
        RawToken::Ident => TokenKind::Ident(slice.to_string()),

        RawToken::Comment | RawToken::Continuation => {
            unreachable!("skipped by logos")
        }
    })
}

fn parse_radix(digits: &str, radix: u32, start: usize, end: usize) -> Result<i64, LexError> {
    let clean: String = digits.chars().filter(|c| *c != '_').collect();
    if clean.is_empty() {
        return Err(LexError::invalid_number(start, end));
    }
    i64::from_str_radix(&clean, radix).map_err(|_| LexError::invalid_number(start, end))
}

/// Decode escapes. Unknown escapes are kept verbatim, backslash included.
fn parse_string(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('\'') => result.push('\''),
            Some('"') => result.push('"'),
            // escaped newline inside a string joins lines
            Some('\n') => {}
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Result of lexing: tokens plus any errors found.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A lexer error with location and friendly message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl LexError {
    fn unexpected_char(ch: char, pos: usize) -> Self {
        Self {
            span: Span::new(pos, pos + ch.len_utf8()),
            message: format!("unexpected character '{}'", ch),
            hint: None,
        }
    }

    fn unterminated_string(pos: usize, quote: char) -> Self {
        Self {
            span: Span::new(pos, pos + 1),
            message: "unterminated string".to_string(),
            hint: Some(format!("add a closing {}", quote)),
        }
    }

    fn invalid_number(start: usize, end: usize) -> Self {
        Self {
            span: Span::new(start, end),
            message: "invalid number".to_string(),
            hint: Some("integers must fit in 64 bits".to_string()),
        }
    }

    pub(crate) fn bad_dedent(pos: usize) -> Self {
        Self {
            span: Span::new(pos, pos + 1),
            message: "unindent does not match any outer indentation level".to_string(),
            hint: None,
        }
    }

    pub(crate) fn unbalanced(pos: usize, ch: char) -> Self {
        Self {
            span: Span::new(pos, pos + 1),
            message: format!("unmatched '{}'", ch),
            hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let result = Lexer::new(src).tokenize();
        assert!(result.is_ok(), "lex errors: {:?}", result.errors);
        result.tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_assignment() {
        assert_eq!(
            kinds("a = 1"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Eq,
                TokenKind::Int(1),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("0x1f")[0], TokenKind::Int(31));
        assert_eq!(kinds("1_000")[0], TokenKind::Int(1000));
        assert_eq!(kinds("0b101")[0], TokenKind::Int(5));
        assert_eq!(kinds("2.5")[0], TokenKind::Float(2.5));
        assert_eq!(kinds("1e3")[0], TokenKind::Float(1000.0));
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(kinds(r#""a\nb""#)[0], TokenKind::String("a\nb".into()));
        assert_eq!(kinds("'it''s'")[0], TokenKind::String("it".into()));
        assert_eq!(kinds(r"'\d'")[0], TokenKind::String("\\d".into()));
        assert_eq!(
            kinds("\"\"\"two\nlines\"\"\"")[0],
            TokenKind::String("two\nlines".into())
        );
    }

    #[test]
    fn operators_prefer_longest() {
        assert_eq!(
            &kinds("a //= b ** c")[..5],
            &[
                TokenKind::Ident("a".into()),
                TokenKind::SlashSlashEq,
                TokenKind::Ident("b".into()),
                TokenKind::StarStar,
                TokenKind::Ident("c".into()),
            ]
        );
    }

    #[test]
    fn reserved_words() {
        assert_eq!(kinds("lambda")[0], TokenKind::Reserved("lambda".into()));
        assert_eq!(kinds("define")[0], TokenKind::Ident("define".into()));
        assert_eq!(kinds("class")[0], TokenKind::Class);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("x # note\n"),
            vec![TokenKind::Ident("x".into()), TokenKind::Newline, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_reports() {
        let result = Lexer::new("x = 'abc").tokenize();
        assert!(!result.is_ok());
        assert!(result.errors[0].message.contains("unterminated"));
    }

    #[test]
    fn integer_overflow_is_an_error() {
        let result = Lexer::new("99999999999999999999").tokenize();
        assert_eq!(result.errors[0].message, "invalid number");
    }
}
