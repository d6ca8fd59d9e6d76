// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Loop unrolling over tuples and strings whose values are known up front.
//!
//! `for v in xs:` where `xs` is known to be a 3-tuple becomes
//!
//! ```text
//! v = xs[0]
//! <body>
//! v = xs[1]
//! <body>
//! v = xs[2]
//! <body>
//! ```

use indexmap::IndexMap;
use tracing::debug;
use weave_ast::expr::{Expr, ExprKind};
use weave_ast::stmt::{Stmt, StmtKind};
use weave_ast::{Module, NodeId, Span};
use weave_interp::Value;

use crate::error::TransformError;

/// A rewrite applied to a specialized tree before it is compiled.
pub trait Transform {
    fn apply(&mut self, module: &mut Module) -> Result<(), TransformError>;
}

/// Expands `for` loops over the names in `known`.
pub struct Unroller {
    known: IndexMap<String, Value>,
    next_id: u32,
}

impl Unroller {
    pub fn new(known: IndexMap<String, Value>) -> Self {
        // Start high to stay clear of parser-assigned ids
        Self { known, next_id: 1_000_000 }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn visit_block(&mut self, module: &Module, stmts: Vec<Stmt>) -> Result<Vec<Stmt>, TransformError> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.visit_stmt(module, stmt, &mut out)?;
        }
        Ok(out)
    }

    fn visit_stmt(&mut self, module: &Module, stmt: Stmt, out: &mut Vec<Stmt>) -> Result<(), TransformError> {
        let Stmt { id, kind, span } = stmt;
        let kind = match kind {
            StmtKind::For { target, iter, body, orelse } => {
                if let Some(name) = iter.as_name().filter(|n| self.known.contains_key(*n)) {
                    let name = name.to_string();
                    return self.unroll(module, span, &target, &name, body, orelse, out);
                }
                StmtKind::For {
                    target,
                    iter,
                    body: self.visit_block(module, body)?,
                    orelse: self.visit_block(module, orelse)?,
                }
            }
            StmtKind::While { cond, body } => StmtKind::While {
                cond,
                body: self.visit_block(module, body)?,
            },
            StmtKind::If { cond, then_branch, else_branch } => StmtKind::If {
                cond,
                then_branch: self.visit_block(module, then_branch)?,
                else_branch: self.visit_block(module, else_branch)?,
            },
            StmtKind::FunctionDef(mut def) => {
                def.body = self.visit_block(module, def.body)?;
                StmtKind::FunctionDef(def)
            }
            StmtKind::ClassDef(mut class) => {
                class.body = self.visit_block(module, class.body)?;
                StmtKind::ClassDef(class)
            }
            other => other,
        };
        out.push(Stmt::new(id, kind, span));
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn unroll(
        &mut self,
        module: &Module,
        span: Span,
        target: &Expr,
        name: &str,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        out: &mut Vec<Stmt>,
    ) -> Result<(), TransformError> {
        if !orelse.is_empty() {
            return Err(TransformError::ForElse { location: module.location(span) });
        }
        let len = match self.known.get(name) {
            Some(value @ (Value::Tuple(_) | Value::Str(_))) => value.len().unwrap_or_default(),
            other => {
                return Err(TransformError::Unsized {
                    name: name.to_string(),
                    ty: other.map_or_else(|| "NoneType".to_string(), Value::type_name),
                    location: module.location(span),
                })
            }
        };
        if let Some((keyword, at)) = loop_control(&body) {
            return Err(TransformError::LoopControl {
                keyword,
                name: name.to_string(),
                location: module.location(at),
            });
        }

        debug!(name, len, "unrolling loop");
        for i in 0..len {
            let item = self.subscript(name, i, span);
            out.push(Stmt::new(
                self.fresh_id(),
                StmtKind::Assign { targets: vec![target.clone()], value: item },
                span,
            ));
            out.extend(self.visit_block(module, body.clone())?);
        }
        Ok(())
    }

    /// `name[i]`
    fn subscript(&mut self, name: &str, i: usize, span: Span) -> Expr {
        let object = Expr::new(self.fresh_id(), ExprKind::Name(name.to_string()), span);
        let index = Expr::new(self.fresh_id(), ExprKind::Int(i as i64), span);
        Expr::new(
            self.fresh_id(),
            ExprKind::Subscript { object: Box::new(object), index: Box::new(index) },
            span,
        )
    }
}

impl Transform for Unroller {
    fn apply(&mut self, module: &mut Module) -> Result<(), TransformError> {
        let body = std::mem::take(&mut module.body);
        module.body = self.visit_block(module, body)?;
        Ok(())
    }
}

/// First `break`/`continue` in `body` that binds to the enclosing loop.
fn loop_control(body: &[Stmt]) -> Option<(&'static str, Span)> {
    body.iter().find_map(|stmt| match &stmt.kind {
        StmtKind::Break => Some(("break", stmt.span)),
        StmtKind::Continue => Some(("continue", stmt.span)),
        StmtKind::If { then_branch, else_branch, .. } => {
            loop_control(then_branch).or_else(|| loop_control(else_branch))
        }
        // `else` of a nested loop runs outside it
        StmtKind::For { orelse, .. } => loop_control(orelse),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_interp::parse_module;

    fn known(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn ints(n: i64) -> Value {
        Value::tuple((0..n).map(Value::Int))
    }

    fn unrolled(src: &str, names: &[(&str, Value)]) -> Result<Module, TransformError> {
        let mut module = parse_module(src, "<unroll>").unwrap();
        Unroller::new(known(names)).apply(&mut module)?;
        Ok(module)
    }

    fn kinds(body: &[Stmt]) -> Vec<&'static str> {
        body.iter()
            .map(|s| match &s.kind {
                StmtKind::Assign { .. } => "assign",
                StmtKind::Expr(_) => "expr",
                StmtKind::For { .. } => "for",
                StmtKind::If { .. } => "if",
                StmtKind::While { .. } => "while",
                StmtKind::FunctionDef(_) => "def",
                _ => "other",
            })
            .collect()
    }

    #[test]
    fn known_loop_becomes_straight_line_code() {
        let module = unrolled("for v in xs:\n    f(v)\n", &[("xs", ints(3))]).unwrap();
        assert_eq!(kinds(&module.body), ["assign", "expr", "assign", "expr", "assign", "expr"]);
        let StmtKind::Assign { targets, value } = &module.body[2].kind else { panic!() };
        assert_eq!(targets[0].as_name(), Some("v"));
        let ExprKind::Subscript { object, index } = &value.kind else { panic!() };
        assert_eq!(object.as_name(), Some("xs"));
        assert!(matches!(index.kind, ExprKind::Int(1)));
    }

    #[test]
    fn unknown_loops_are_kept_but_visited() {
        let src = "for a in ys:\n    for b in xs:\n        g(a, b)\n";
        let module = unrolled(src, &[("xs", ints(2))]).unwrap();
        assert_eq!(kinds(&module.body), ["for"]);
        let StmtKind::For { body, .. } = &module.body[0].kind else { panic!() };
        assert_eq!(kinds(body), ["assign", "expr", "assign", "expr"]);
    }

    #[test]
    fn nested_definitions_and_branches_are_visited() {
        let src = "def f():\n    if c:\n        for v in xs:\n            g(v)\n";
        let module = unrolled(src, &[("xs", ints(1))]).unwrap();
        let StmtKind::FunctionDef(def) = &module.body[0].kind else { panic!() };
        let StmtKind::If { then_branch, .. } = &def.body[0].kind else { panic!() };
        assert_eq!(kinds(then_branch), ["assign", "expr"]);
    }

    #[test]
    fn empty_sequence_drops_the_loop() {
        let module = unrolled("for v in xs:\n    f(v)\nz = 1\n", &[("xs", ints(0))]).unwrap();
        assert_eq!(kinds(&module.body), ["assign"]);
    }

    #[test]
    fn for_else_is_rejected() {
        let err = unrolled("for v in xs:\n    f(v)\nelse:\n    g()\n", &[("xs", ints(2))]).unwrap_err();
        assert!(matches!(err, TransformError::ForElse { ref location } if location.line == 1));
    }

    #[test]
    fn unsized_values_are_rejected() {
        let err = unrolled("\nfor v in xs:\n    f(v)\n", &[("xs", Value::Int(3))]).unwrap_err();
        assert_eq!(err.to_string(), "<unroll>:2:1: cannot unroll over 'xs': a 'int' has no fixed length");
    }

    #[test]
    fn strings_unroll_per_character() {
        let module = unrolled("for c in s:\n    f(c)\n", &[("s", Value::str("ab"))]).unwrap();
        assert_eq!(kinds(&module.body), ["assign", "expr", "assign", "expr"]);
        let empty = unrolled("for c in s:\n    f(c)\n", &[("s", Value::str(""))]).unwrap();
        assert!(empty.body.is_empty());
    }

    #[test]
    fn loop_control_is_rejected_unless_nested() {
        let err = unrolled("for v in xs:\n    if v:\n        break\n", &[("xs", ints(2))]).unwrap_err();
        assert!(matches!(err, TransformError::LoopControl { keyword: "break", ref location, .. } if location.line == 3));

        let ok = "for v in xs:\n    while v:\n        continue\n";
        assert!(unrolled(ok, &[("xs", ints(2))]).is_ok());
    }
}
