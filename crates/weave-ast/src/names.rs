// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Name analysis: which names a function binds and which it reads from
//! outside.
//!
//! Binding is flow-insensitive, as in any function-scoped language: a name
//! assigned anywhere in a body is local to the whole body.

use std::collections::HashSet;

use crate::expr::{Arg, Expr, ExprKind};
use crate::stmt::{FnDef, Stmt, StmtKind};

/// Names read by `def` that are neither parameters nor bound in its body,
/// in order of first use. Reads inside nested definitions count when the
/// nested definition does not bind them either.
pub fn free_names(def: &FnDef) -> Vec<String> {
    let mut collector = Collector::default();
    collector.function_body(def, &HashSet::new());
    collector.free
}

/// Names bound directly by `body`: assignment and loop targets, `def` and
/// `class` names. Nested bodies are not entered.
pub fn bound_names(body: &[Stmt]) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for stmt in body {
        bind_stmt(stmt, &mut out, &mut seen);
    }
    out
}

fn push_unique(name: &str, out: &mut Vec<String>, seen: &mut HashSet<String>) {
    if seen.insert(name.to_string()) {
        out.push(name.to_string());
    }
}

fn bind_stmt(stmt: &Stmt, out: &mut Vec<String>, seen: &mut HashSet<String>) {
    match &stmt.kind {
        StmtKind::Assign { targets, .. } => {
            let mut names = Vec::new();
            for target in targets {
                target_names(target, &mut names);
            }
            for name in names {
                push_unique(&name, out, seen);
            }
        }
        StmtKind::For { target, body, orelse, .. } => {
            let mut names = Vec::new();
            target_names(target, &mut names);
            for name in names {
                push_unique(&name, out, seen);
            }
            for s in body.iter().chain(orelse) {
                bind_stmt(s, out, seen);
            }
        }
        StmtKind::If { then_branch, else_branch, .. } => {
            for s in then_branch.iter().chain(else_branch) {
                bind_stmt(s, out, seen);
            }
        }
        StmtKind::While { body, .. } => {
            for s in body {
                bind_stmt(s, out, seen);
            }
        }
        StmtKind::FunctionDef(def) => push_unique(&def.name, out, seen),
        StmtKind::ClassDef(class) => push_unique(&class.name, out, seen),
        StmtKind::Expr(_)
        | StmtKind::Pass
        | StmtKind::Return(_)
        | StmtKind::Break
        | StmtKind::Continue => {}
    }
}

/// Names stored to by an assignment target.
pub fn target_names(target: &Expr, out: &mut Vec<String>) {
    match &target.kind {
        ExprKind::Name(name) => out.push(name.clone()),
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            for item in items {
                target_names(item, out);
            }
        }
        _ => {}
    }
}

#[derive(Default)]
struct Collector {
    free: Vec<String>,
    seen: HashSet<String>,
}

impl Collector {
    fn read(&mut self, name: &str, bound: &HashSet<String>) {
        if !bound.contains(name) && self.seen.insert(name.to_string()) {
            self.free.push(name.to_string());
        }
    }

    fn function_body(&mut self, def: &FnDef, outer: &HashSet<String>) {
        let mut bound = outer.clone();
        for param in &def.params {
            bound.insert(param.name.clone());
        }
        bound.extend(bound_names(&def.body));
        self.stmts(&def.body, &bound);
    }

    fn stmts(&mut self, body: &[Stmt], bound: &HashSet<String>) {
        for stmt in body {
            self.stmt(stmt, bound);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, bound: &HashSet<String>) {
        match &stmt.kind {
            StmtKind::Expr(e) => self.expr(e, bound),
            StmtKind::Assign { targets, value } => {
                self.expr(value, bound);
                for target in targets {
                    self.store(target, bound);
                }
            }
            StmtKind::Return(value) => {
                if let Some(e) = value {
                    self.expr(e, bound);
                }
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                self.expr(cond, bound);
                self.stmts(then_branch, bound);
                self.stmts(else_branch, bound);
            }
            StmtKind::While { cond, body } => {
                self.expr(cond, bound);
                self.stmts(body, bound);
            }
            StmtKind::For { target, iter, body, orelse } => {
                self.expr(iter, bound);
                self.store(target, bound);
                self.stmts(body, bound);
                self.stmts(orelse, bound);
            }
            StmtKind::FunctionDef(def) => {
                for decorator in &def.decorators {
                    self.expr(decorator, bound);
                }
                for param in &def.params {
                    if let Some(default) = &param.default {
                        self.expr(default, bound);
                    }
                }
                self.function_body(def, bound);
            }
            StmtKind::ClassDef(class) => {
                if let Some(base) = &class.base {
                    self.expr(base, bound);
                }
                let mut inner = bound.clone();
                inner.extend(bound_names(&class.body));
                self.stmts(&class.body, &inner);
            }
            StmtKind::Pass | StmtKind::Break | StmtKind::Continue => {}
        }
    }

    /// Subexpressions of a store target that are read.
    fn store(&mut self, target: &Expr, bound: &HashSet<String>) {
        match &target.kind {
            ExprKind::Name(_) => {}
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                for item in items {
                    self.store(item, bound);
                }
            }
            ExprKind::Attribute { object, .. } => self.expr(object, bound),
            ExprKind::Subscript { object, index } => {
                self.expr(object, bound);
                self.expr(index, bound);
            }
            _ => self.expr(target, bound),
        }
    }

    fn expr(&mut self, expr: &Expr, bound: &HashSet<String>) {
        match &expr.kind {
            ExprKind::Name(name) => self.read(name, bound),
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::None => {}
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                for item in items {
                    self.expr(item, bound);
                }
            }
            ExprKind::Dict(entries) => {
                for (k, v) in entries {
                    self.expr(k, bound);
                    self.expr(v, bound);
                }
            }
            ExprKind::Binary { left, right, .. }
            | ExprKind::Logical { left, right, .. }
            | ExprKind::Compare { left, right, .. } => {
                self.expr(left, bound);
                self.expr(right, bound);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand, bound),
            ExprKind::Call { func, args } => {
                self.expr(func, bound);
                for arg in args {
                    self.expr(Arg::value(arg), bound);
                }
            }
            ExprKind::Attribute { object, .. } => self.expr(object, bound),
            ExprKind::Subscript { object, index } => {
                self.expr(object, bound);
                self.expr(index, bound);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::{Param, ParamKind};
    use crate::{NodeId, Span};

    fn name(n: &str) -> Expr {
        Expr::new(NodeId(0), ExprKind::Name(n.to_string()), Span::default())
    }

    fn stmt(kind: StmtKind) -> Stmt {
        Stmt::new(NodeId(0), kind, Span::default())
    }

    fn def(name: &str, params: &[&str], body: Vec<Stmt>) -> FnDef {
        FnDef {
            name: name.to_string(),
            params: params
                .iter()
                .map(|p| Param { name: p.to_string(), kind: ParamKind::Normal, default: None })
                .collect(),
            body,
            decorators: Vec::new(),
        }
    }

    #[test]
    fn params_and_locals_are_not_free() {
        // def f(a):
        //     b = a + c
        //     return b
        let body = vec![
            stmt(StmtKind::Assign {
                targets: vec![name("b")],
                value: Expr::new(
                    NodeId(0),
                    ExprKind::Binary {
                        op: crate::expr::BinOp::Add,
                        left: Box::new(name("a")),
                        right: Box::new(name("c")),
                    },
                    Span::default(),
                ),
            }),
            stmt(StmtKind::Return(Some(name("b")))),
        ];
        assert_eq!(free_names(&def("f", &["a"], body)), vec!["c"]);
    }

    #[test]
    fn nested_def_reads_propagate() {
        // def outer():
        //     def inner(x):
        //         return x + k
        //     return inner
        let inner = def(
            "inner",
            &["x"],
            vec![stmt(StmtKind::Return(Some(Expr::new(
                NodeId(0),
                ExprKind::Binary {
                    op: crate::expr::BinOp::Add,
                    left: Box::new(name("x")),
                    right: Box::new(name("k")),
                },
                Span::default(),
            ))))],
        );
        let outer = def(
            "outer",
            &[],
            vec![
                stmt(StmtKind::FunctionDef(inner)),
                stmt(StmtKind::Return(Some(name("inner")))),
            ],
        );
        assert_eq!(free_names(&outer), vec!["k"]);
    }

    #[test]
    fn loop_targets_bind() {
        let body = vec![stmt(StmtKind::For {
            target: Expr::new(
                NodeId(0),
                ExprKind::Tuple(vec![name("k"), name("v")]),
                Span::default(),
            ),
            iter: name("items"),
            body: vec![stmt(StmtKind::Expr(name("v")))],
            orelse: Vec::new(),
        })];
        assert_eq!(bound_names(&body), vec!["k", "v"]);
        assert_eq!(free_names(&def("f", &[], body)), vec!["items"]);
    }
}
