// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `unroll(**names)`: specialize a function and unroll its loops over the
//! given sequences in one step.

use indexmap::IndexMap;
use tracing::debug;
use weave_interp::{native, Interpreter, Kwargs, Namespace, RuntimeError, Value};

use crate::closure::{Closure, CONTROL_NAME};
use crate::error::SpecializeError;
use crate::unroller::Unroller;

#[derive(Debug, Clone, Default)]
pub struct Unroll {
    names: IndexMap<String, Value>,
}

impl Unroll {
    pub fn new(names: IndexMap<String, Value>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &IndexMap<String, Value> {
        &self.names
    }

    /// Specialize `function` over the names, unroll loops over them and
    /// return the rebuilt function.
    pub fn apply(&self, function: &Value) -> Result<Value, SpecializeError> {
        self.apply_in(&mut Interpreter::new(), function)
    }

    pub fn apply_in(&self, interp: &mut Interpreter, function: &Value) -> Result<Value, SpecializeError> {
        let mut closure = Closure::new(function, self.names.clone())?;
        let known: IndexMap<String, Value> = closure
            .vars()
            .iter()
            .filter(|(name, _)| self.names.contains_key(*name) && name.as_str() != CONTROL_NAME)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        debug!(function = %closure.function().name, names = ?known.keys().collect::<Vec<_>>(), "unrolling");
        closure.push_transform(Unroller::new(known));
        closure.make_in(interp)
    }
}

/// Bind the script-level `unroll(**names)` decorator factory in `ns`.
pub fn install(ns: &Namespace) {
    ns.set(CONTROL_NAME, decorator_factory());
}

fn decorator_factory() -> Value {
    native(CONTROL_NAME, |_, args, kwargs: Kwargs| {
        if !args.is_empty() {
            return Err(RuntimeError::native(CONTROL_NAME, "takes keyword arguments only"));
        }
        let unroll = Unroll::new(kwargs);
        Ok(native(CONTROL_NAME, move |interp, args, _| match <[Value; 1]>::try_from(args) {
            Ok([function]) => unroll.apply_in(interp, &function).map_err(into_runtime),
            Err(args) => Err(RuntimeError::native(
                CONTROL_NAME,
                format!("decorator takes exactly one argument ({} given)", args.len()),
            )),
        }))
    })
}

fn into_runtime(err: SpecializeError) -> RuntimeError {
    match err {
        SpecializeError::Runtime(err) => err,
        other => RuntimeError::native(CONTROL_NAME, other),
    }
}
