// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression evaluation.

use indexmap::IndexMap;
use weave_ast::expr::{Arg, Expr, ExprKind, LogicalOp};

use crate::builtins::Builtin;
use crate::value::{lock, Kwargs, Value};

use super::{methods, operators, Frame, Interpreter, RuntimeError};

impl Interpreter {
    pub(super) fn eval_expr(&mut self, frame: &Frame, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::String(s) => Ok(Value::str(s.as_str())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::None => Ok(Value::None),
            ExprKind::Name(name) => lookup(frame, name),

            ExprKind::Tuple(items) => Ok(Value::tuple(self.eval_all(frame, items)?)),
            ExprKind::List(items) => Ok(Value::list(self.eval_all(frame, items)?)),
            ExprKind::Dict(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match self.eval_expr(frame, key)? {
                        Value::Str(s) => s.to_string(),
                        other => {
                            return Err(RuntimeError::TypeError(format!(
                                "dict keys must be strings, not '{}'",
                                other.type_name()
                            )))
                        }
                    };
                    let value = self.eval_expr(frame, value)?;
                    map.insert(key, value);
                }
                Ok(Value::dict(map))
            }

            ExprKind::Binary { op, left, right } => {
                let l = self.eval_expr(frame, left)?;
                let r = self.eval_expr(frame, right)?;
                operators::binary(*op, &l, &r)
            }
            ExprKind::Unary { op, operand } => {
                let v = self.eval_expr(frame, operand)?;
                operators::unary(*op, &v)
            }
            ExprKind::Logical { op, left, right } => {
                let l = self.eval_expr(frame, left)?;
                match (op, l.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(l),
                    _ => self.eval_expr(frame, right),
                }
            }
            ExprKind::Compare { op, left, right } => {
                let l = self.eval_expr(frame, left)?;
                let r = self.eval_expr(frame, right)?;
                operators::compare(*op, &l, &r).map(Value::Bool)
            }

            ExprKind::Call { func, args } => {
                let callee = self.eval_expr(frame, func)?;
                let (args, kwargs) = self.eval_args(frame, args)?;
                self.call(&callee, args, kwargs)
            }
            ExprKind::Attribute { object, name } => {
                let object = self.eval_expr(frame, object)?;
                methods::get_attr(&object, name)
            }
            ExprKind::Subscript { object, index } => {
                let object = self.eval_expr(frame, object)?;
                let index = self.eval_expr(frame, index)?;
                methods::get_item(&object, &index)
            }
        }
    }

    fn eval_all(&mut self, frame: &Frame, items: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        items.iter().map(|e| self.eval_expr(frame, e)).collect()
    }

    /// Evaluate call-site arguments, spreading `*seq` and `**map`.
    fn eval_args(&mut self, frame: &Frame, args: &[Arg]) -> Result<(Vec<Value>, Kwargs), RuntimeError> {
        let mut positional = Vec::with_capacity(args.len());
        let mut kwargs = Kwargs::new();
        for arg in args {
            match arg {
                Arg::Positional(expr) => positional.push(self.eval_expr(frame, expr)?),
                Arg::Star(expr) => positional.extend(self.eval_expr(frame, expr)?.iterate()?),
                Arg::Keyword(name, expr) => {
                    let value = self.eval_expr(frame, expr)?;
                    insert_keyword(&mut kwargs, name.clone(), value)?;
                }
                Arg::StarStar(expr) => match self.eval_expr(frame, expr)? {
                    Value::Dict(entries) => {
                        let entries = lock(&entries).clone();
                        for (name, value) in entries {
                            insert_keyword(&mut kwargs, name, value)?;
                        }
                    }
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "argument after ** must be a mapping, not {}",
                            other.type_name()
                        )))
                    }
                },
            }
        }
        Ok((positional, kwargs))
    }
}

fn insert_keyword(kwargs: &mut Kwargs, name: String, value: Value) -> Result<(), RuntimeError> {
    if kwargs.contains_key(&name) {
        return Err(RuntimeError::TypeError(format!("keyword argument repeated: {}", name)));
    }
    kwargs.insert(name, value);
    Ok(())
}

/// Resolve a name: locals, then captured bindings, then globals, then
/// builtins.
fn lookup(frame: &Frame, name: &str) -> Result<Value, RuntimeError> {
    if let Some(value) = frame.locals.get(name) {
        return Ok(value);
    }
    if let Some(value) = frame.function.as_ref().and_then(|f| f.closure.get(name)) {
        return Ok(value.clone());
    }
    if !frame.globals.ptr_eq(&frame.locals) {
        if let Some(value) = frame.globals.get(name) {
            return Ok(value);
        }
    }
    Builtin::lookup(name)
        .map(Value::Builtin)
        .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
}
