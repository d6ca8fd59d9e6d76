// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement execution.

use std::sync::Arc;

use indexmap::IndexMap;
use weave_ast::names::free_names;
use weave_ast::stmt::{ClassDef, FnDef, Stmt, StmtKind};
use weave_ast::Span;

use crate::builtins::Builtin;
use crate::namespace::Namespace;
use crate::record::RecordType;
use crate::value::{Function, Kwargs, Value};

use super::{Frame, Interpreter, RuntimeError};

impl Interpreter {
    /// Execute statements in order, tagging the first real error with the
    /// location of the statement it escaped from.
    pub(super) fn exec_block(&mut self, frame: &Frame, body: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in body {
            self.exec_stmt(frame, stmt)
                .map_err(|e| e.traced(|| frame.location(stmt.span)))?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, frame: &Frame, stmt: &Stmt) -> Result<(), RuntimeError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(frame, expr)?;
                Ok(())
            }

            StmtKind::Assign { targets, value } => {
                let value = self.eval_expr(frame, value)?;
                for target in targets {
                    self.assign_target(frame, target, value.clone())?;
                }
                Ok(())
            }

            StmtKind::Pass => Ok(()),

            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(frame, expr)?,
                    None => Value::None,
                };
                Err(RuntimeError::Return(value))
            }

            StmtKind::Break => Err(RuntimeError::Break),
            StmtKind::Continue => Err(RuntimeError::Continue),

            StmtKind::If { cond, then_branch, else_branch } => {
                if self.eval_expr(frame, cond)?.is_truthy() {
                    self.exec_block(frame, then_branch)
                } else {
                    self.exec_block(frame, else_branch)
                }
            }

            StmtKind::While { cond, body } => {
                while self.eval_expr(frame, cond)?.is_truthy() {
                    match self.exec_block(frame, body) {
                        Ok(()) | Err(RuntimeError::Continue) => {}
                        Err(RuntimeError::Break) => break,
                        Err(e) => return Err(e),
                    }
                }
                Ok(())
            }

            StmtKind::For { target, iter, body, orelse } => {
                let items = self.eval_expr(frame, iter)?.iterate()?;
                for item in items {
                    self.assign_target(frame, target, item)?;
                    match self.exec_block(frame, body) {
                        Ok(()) | Err(RuntimeError::Continue) => {}
                        Err(RuntimeError::Break) => return Ok(()),
                        Err(e) => return Err(e),
                    }
                }
                self.exec_block(frame, orelse)
            }

            StmtKind::FunctionDef(def) => {
                let function = self.define_function(frame, def, stmt.span)?;
                frame.locals.set(def.name.clone(), function);
                Ok(())
            }

            StmtKind::ClassDef(class) => {
                let ty = self.define_class(frame, class)?;
                frame.locals.set(class.name.clone(), ty);
                Ok(())
            }
        }
    }

    /// Create a function object and run it through its decorators.
    ///
    /// Decorator expressions and defaults are evaluated first, in source
    /// order; decorators are then applied innermost first.
    fn define_function(&mut self, frame: &Frame, def: &FnDef, span: Span) -> Result<Value, RuntimeError> {
        let mut decorators = Vec::with_capacity(def.decorators.len());
        for expr in &def.decorators {
            decorators.push(self.eval_expr(frame, expr)?);
        }

        let mut defaults = Vec::with_capacity(def.params.len());
        for param in &def.params {
            defaults.push(match &param.default {
                Some(expr) => Some(self.eval_expr(frame, expr)?),
                None => None,
            });
        }

        let mut closure = IndexMap::new();
        if let Some(enclosing) = &frame.function {
            for name in free_names(def) {
                let visible = frame
                    .locals
                    .get(&name)
                    .or_else(|| enclosing.closure.get(&name).cloned());
                if let Some(value) = visible {
                    closure.insert(name, value);
                }
            }
        }

        let mut function = Value::Function(Arc::new(Function {
            name: def.name.clone(),
            def: Arc::new(def.clone()),
            defaults,
            globals: frame.globals.clone(),
            closure,
            origin: frame.origin(span),
        }));

        for decorator in decorators.iter().rev() {
            function = self.call(decorator, vec![function], Kwargs::new())?;
        }
        Ok(function)
    }

    /// Run a `class Name(_slots):` body in its own namespace and build the
    /// record type it describes.
    fn define_class(&mut self, frame: &Frame, class: &ClassDef) -> Result<Value, RuntimeError> {
        let base = match &class.base {
            Some(expr) => Some(self.eval_expr(frame, expr)?),
            None => None,
        };
        if !matches!(base, Some(Value::Builtin(Builtin::Slots))) {
            return Err(RuntimeError::TypeError(format!(
                "class {} must derive from the slot base",
                class.name
            )));
        }

        let body = Namespace::new();
        let class_frame = Frame {
            locals: body.clone(),
            globals: frame.globals.clone(),
            function: frame.function.clone(),
            source: frame.source.clone(),
            line_offset: frame.line_offset,
        };
        self.exec_block(&class_frame, &class.body)?;

        let ty = RecordType::from_class(&class.name, class.docstring(), body.snapshot())?;
        Ok(Value::RecordType(Arc::new(ty)))
    }
}
