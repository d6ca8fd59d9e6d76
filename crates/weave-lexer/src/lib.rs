// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for weave script.
//!
//! Tokenizes source into a stream the parser consumes, with indentation
//! turned into explicit `Indent`/`Dedent` tokens.

mod lexer;
mod layout;
pub mod ident;

pub use ident::{is_identifier, is_keyword, KEYWORDS};
pub use lexer::{LexError, LexResult, Lexer};
