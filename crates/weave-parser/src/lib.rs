//! Parser for weave script.
//!
//! Transforms a token stream into statement trees.

mod hints;
mod parser;

pub use parser::{ParseError, ParseResult, Parser};
