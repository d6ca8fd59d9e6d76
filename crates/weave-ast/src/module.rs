// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! A parsed unit: statements plus the text they came from.

use std::fmt;
use std::sync::Arc;

use crate::stmt::Stmt;
use crate::{SourceFile, Span};

/// Top-level statements of one compiled unit.
///
/// `line_offset` is added to every line number reported for this tree, so a
/// tree parsed from synthesized text can still point at the lines of the
/// file its pieces were copied from.
#[derive(Debug, Clone)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub source: Arc<SourceFile>,
    pub line_offset: i64,
}

impl Module {
    pub fn new(body: Vec<Stmt>, source: Arc<SourceFile>) -> Self {
        Self { body, source, line_offset: 0 }
    }

    /// Shift all reported line numbers by `n`.
    pub fn increment_lineno(&mut self, n: i64) {
        self.line_offset += n;
    }

    pub fn location(&self, span: Span) -> Location {
        Location::resolve(&self.source, self.line_offset, span)
    }
}

/// A resolved `label:line:col` position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub label: String,
    pub line: i64,
    pub column: u32,
}

impl Location {
    pub fn resolve(source: &SourceFile, line_offset: i64, span: Span) -> Self {
        let (line, column) = source.lines.offset_to_line_col(span.start);
        Self {
            label: source.label.clone(),
            line: line as i64 + line_offset,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.label, self.line, self.column)
    }
}
