// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Assignment to names, attributes, subscripts and unpacking targets.

use weave_ast::expr::{Expr, ExprKind};

use crate::value::Value;

use super::{methods, Frame, Interpreter, RuntimeError};

impl Interpreter {
    pub(super) fn assign_target(&mut self, frame: &Frame, target: &Expr, value: Value) -> Result<(), RuntimeError> {
        match &target.kind {
            ExprKind::Name(name) => {
                frame.locals.set(name.clone(), value);
                Ok(())
            }

            ExprKind::Tuple(targets) | ExprKind::List(targets) => {
                let items = value.iterate()?;
                if items.len() < targets.len() {
                    return Err(RuntimeError::ValueError(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    )));
                }
                if items.len() > targets.len() {
                    return Err(RuntimeError::ValueError(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign_target(frame, target, item)?;
                }
                Ok(())
            }

            ExprKind::Attribute { object, name } => {
                let object = self.eval_expr(frame, object)?;
                methods::set_attr(&object, name, value)
            }

            ExprKind::Subscript { object, index } => {
                let object = self.eval_expr(frame, object)?;
                let index = self.eval_expr(frame, index)?;
                methods::set_item(&object, &index, value)
            }

            _ => Err(RuntimeError::TypeError("cannot assign to expression".to_string())),
        }
    }
}
