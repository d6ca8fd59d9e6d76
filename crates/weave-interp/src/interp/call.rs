// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Calling values and binding arguments to parameters.

use std::sync::Arc;

use indexmap::IndexMap;
use weave_ast::stmt::ParamKind;

use crate::namespace::Namespace;
use crate::value::{Function, Kwargs, Value};

use super::{methods, Frame, Interpreter, RuntimeError, MAX_CALL_DEPTH};

impl Interpreter {
    /// Call any callable value with evaluated arguments.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => self.call_function(function, args, kwargs),
            Value::Builtin(builtin) => builtin.call(self, args, kwargs),
            Value::Native(native) => native.call(self, args, kwargs),
            Value::RecordType(ty) => Ok(Value::Record(ty.instantiate(args, kwargs)?)),
            Value::BoundMethod(method) => methods::call_method(&method.receiver, &method.name, args, kwargs),
            other => Err(RuntimeError::TypeError(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn call_function(
        &mut self,
        function: &Arc<Function>,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::RecursionLimit(MAX_CALL_DEPTH));
        }

        let locals = bind_arguments(function, args, kwargs)?;
        let frame = Frame {
            locals: Namespace::from(locals),
            globals: function.globals.clone(),
            function: Some(function.clone()),
            source: function.origin.source.clone(),
            line_offset: function.origin.line_offset,
        };

        self.depth += 1;
        let result = self.exec_block(&frame, &function.def.body);
        self.depth -= 1;

        match result {
            Ok(()) => Ok(Value::None),
            Err(RuntimeError::Return(value)) => Ok(value),
            Err(e) => Err(e),
        }
    }
}

/// Match call arguments to a function's parameters.
fn bind_arguments(function: &Function, args: Vec<Value>, kwargs: Kwargs) -> Result<IndexMap<String, Value>, RuntimeError> {
    let params = &function.def.params;
    let name = &function.name;
    let normal: Vec<usize> = params
        .iter()
        .enumerate()
        .filter(|(_, p)| p.kind == ParamKind::Normal)
        .map(|(i, _)| i)
        .collect();
    let varargs = params.iter().find(|p| p.kind == ParamKind::VarArgs);
    let kwparam = params.iter().find(|p| p.kind == ParamKind::KwArgs);

    if args.len() > normal.len() && varargs.is_none() {
        return Err(RuntimeError::ArityMismatch {
            callee: name.clone(),
            expected: normal.len(),
            got: args.len(),
        });
    }

    let mut slots: Vec<Option<Value>> = vec![None; params.len()];
    let mut extra_positional = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        match normal.get(i) {
            Some(&index) => slots[index] = Some(arg),
            None => extra_positional.push(arg),
        }
    }

    let mut extra_keywords = IndexMap::new();
    for (key, value) in kwargs {
        let target = normal.iter().copied().find(|&i| params[i].name == key);
        match target {
            Some(index) if slots[index].is_some() => {
                return Err(RuntimeError::TypeError(format!(
                    "{}() got multiple values for argument '{}'",
                    name, key
                )))
            }
            Some(index) => slots[index] = Some(value),
            None if kwparam.is_some() => {
                extra_keywords.insert(key, value);
            }
            None => {
                return Err(RuntimeError::TypeError(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    name, key
                )))
            }
        }
    }

    let mut locals = IndexMap::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
        let value = match param.kind {
            ParamKind::VarArgs => Value::tuple(std::mem::take(&mut extra_positional)),
            ParamKind::KwArgs => Value::dict(std::mem::take(&mut extra_keywords)),
            ParamKind::Normal => match slots[index].take().or_else(|| function.defaults[index].clone()) {
                Some(value) => value,
                None => {
                    return Err(RuntimeError::TypeError(format!(
                        "{}() missing required argument '{}'",
                        name, param.name
                    )))
                }
            },
        };
        locals.insert(param.name.clone(), value);
    }
    Ok(locals)
}
