// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree types for weave script.
//!
//! Shared between the lexer, parser, interpreter and the tree-rewrite
//! passes. A [`Module`] carries the source text it was parsed from, so
//! functions can recover their own definition text later.

pub mod span;
pub mod token;
pub mod expr;
pub mod stmt;
pub mod module;
pub mod names;

pub use span::{LineMap, SourceFile, Span};
pub use module::Module;

/// Unique identifier for tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const DUMMY: NodeId = NodeId(u32::MAX);
}
