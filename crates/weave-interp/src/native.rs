// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Closures exposed to scripts as callables.

use std::sync::Arc;

use crate::interp::{Interpreter, RuntimeError};
use crate::value::{Kwargs, NativeFn, Value};

type Callback = dyn Fn(&mut Interpreter, Vec<Value>, Kwargs) -> Result<Value, RuntimeError> + Send + Sync;

/// A named Rust closure callable from scripts.
pub struct NativeFunction {
    name: String,
    callback: Box<Callback>,
}

impl NativeFn for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, interp: &mut Interpreter, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, RuntimeError> {
        (self.callback)(interp, args, kwargs)
    }
}

/// Wrap `callback` as a script value named `name`.
pub fn native<F>(name: impl Into<String>, callback: F) -> Value
where
    F: Fn(&mut Interpreter, Vec<Value>, Kwargs) -> Result<Value, RuntimeError> + Send + Sync + 'static,
{
    Value::Native(Arc::new(NativeFunction {
        name: name.into(),
        callback: Box::new(callback),
    }))
}
