// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree-walk interpreter for weave script.
//!
//! This is the host primitive the code generators build on: text or trees
//! are compiled with [`compile_unit`] and run with [`execute`] against
//! shared [`Namespace`]s. It also provides the fixed-arity [`Slots`]
//! storage behind slot-backed record classes.

mod builtins;
mod compile;
mod interp;
mod namespace;
mod native;
mod record;
mod serialize;
mod slots;
mod value;

pub use builtins::Builtin;
pub use compile::{compile_unit, parse_module, CompileError, Executable, UnitSource};
pub use interp::methods::{DICT_METHODS, LIST_METHODS, RECORD_METHODS, RECORD_TYPE_METHODS, STR_METHODS};
pub use interp::{Interpreter, RuntimeError, MAX_CALL_DEPTH};
pub use namespace::Namespace;
pub use native::{native, NativeFunction};
pub use record::{Record, RecordType};
pub use serialize::RecordSeed;
pub use slots::Slots;
pub use value::{BoundMethod, Function, Kwargs, NativeFn, Origin, RangeValue, Value};

/// Run `unit` with a fresh interpreter. See [`Interpreter::execute`].
pub fn execute(unit: &Executable, globals: &Namespace, extraction: Option<&Namespace>) -> Result<(), RuntimeError> {
    Interpreter::new().execute(unit, globals, extraction)
}

/// Call `callee` with a fresh interpreter.
pub fn call(callee: &Value, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, RuntimeError> {
    Interpreter::new().call(callee, args, kwargs)
}
