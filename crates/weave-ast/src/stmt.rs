//! Statement tree nodes.

use crate::expr::Expr;
use crate::{NodeId, Span};

/// A statement in the tree.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

/// The kind of statement.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Expression statement
    Expr(Expr),
    /// `t1 = t2 = value`; targets are assigned left to right
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    Pass,
    Return(Option<Expr>),
    Break,
    Continue,
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        /// `elif` chains nest as a single `If` here
        else_branch: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        /// Runs when the loop finishes without `break`
        orelse: Vec<Stmt>,
    },
    FunctionDef(FnDef),
    ClassDef(ClassDef),
}

/// A `def`, with any decorators written above it.
#[derive(Debug, Clone)]
pub struct FnDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    /// Outermost first, as written
    pub decorators: Vec<Expr>,
}

impl FnDef {
    /// First-statement string literal, if any.
    pub fn docstring(&self) -> Option<&str> {
        docstring(&self.body)
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Normal,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub base: Option<Expr>,
    pub body: Vec<Stmt>,
}

impl ClassDef {
    pub fn docstring(&self) -> Option<&str> {
        docstring(&self.body)
    }
}

fn docstring(body: &[Stmt]) -> Option<&str> {
    match body.first().map(|s| &s.kind) {
        Some(StmtKind::Expr(Expr { kind: crate::expr::ExprKind::String(s), .. })) => Some(s),
        _ => None,
    }
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind, span: Span) -> Self {
        Self { id, kind, span }
    }
}
