// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Re-creating a function with some of its free names fixed.
//!
//! The definition text is wrapped in a factory
//!
//! ```text
//! def make(<names>):
//!     <definition>
//!     return <function name>
//! ```
//!
//! which is parsed, optionally rewritten, then run against the original
//! function's globals and called with the chosen values.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};
use weave_ast::Module;
use weave_codegen::{Code, Subs, Var};
use weave_interp::{compile_unit, native, parse_module, Function, Interpreter, Kwargs, Namespace, RuntimeError, Value};
use weave_lexer::{is_identifier, is_keyword};

use crate::error::SpecializeError;
use crate::unroller::Transform;

/// Name of the decorator factory the specialized source is re-run with.
pub const CONTROL_NAME: &str = "unroll";

/// A function definition re-parsed inside a `make` factory, ready to be
/// rewritten and instantiated.
pub struct Closure {
    function: Arc<Function>,
    vars: IndexMap<String, Value>,
    module: Module,
    transforms: Vec<Box<dyn Transform>>,
}

impl Closure {
    /// Capture `function` with `substitutions` taking precedence over the
    /// values it already closes over.
    pub fn new(function: &Value, substitutions: IndexMap<String, Value>) -> Result<Self, SpecializeError> {
        let Value::Function(function) = function else {
            return Err(SpecializeError::NotAFunction(function.type_name()));
        };

        let mut vars = IndexMap::with_capacity(substitutions.len() + function.closure.len() + 1);
        for (name, value) in substitutions {
            if !is_identifier(&name) || is_keyword(&name) {
                return Err(SpecializeError::InvalidName(name));
            }
            if name == CONTROL_NAME {
                warn!(function = %function.name, "substitution for '{}' replaced by the pass-through decorator", CONTROL_NAME);
                continue;
            }
            vars.insert(name, tupleify(value)?);
        }
        for (name, value) in &function.closure {
            if !vars.contains_key(name) {
                vars.insert(name.clone(), value.clone());
            }
        }
        vars.insert(CONTROL_NAME.to_string(), pass_through());

        let names: Vec<Var> = vars.keys().map(|name| Var::from(name.as_str())).collect();
        let text = render(&function, &names)?;
        let mut module = parse_module(&text, &function.origin.source.label)?;
        module.increment_lineno(function.first_line() - 2);
        debug!(function = %function.name, names = names.len(), "specialized closure");

        Ok(Self {
            function: function.clone(),
            vars,
            module,
            transforms: Vec::new(),
        })
    }

    pub fn function(&self) -> &Arc<Function> {
        &self.function
    }

    /// Values `make` is called with, by parameter name.
    pub fn vars(&self) -> &IndexMap<String, Value> {
        &self.vars
    }

    /// The factory tree, before pending transforms.
    pub fn tree(&self) -> &Module {
        &self.module
    }

    pub fn tree_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    /// Queue a rewrite to run on the tree when the closure is made.
    pub fn push_transform(&mut self, transform: impl Transform + 'static) {
        self.transforms.push(Box::new(transform));
    }

    /// Build the specialized function with a fresh interpreter.
    pub fn make(&mut self) -> Result<Value, SpecializeError> {
        self.make_in(&mut Interpreter::new())
    }

    /// Apply pending transforms, run the factory definition against the
    /// original globals, and call it with the captured values.
    pub fn make_in(&mut self, interp: &mut Interpreter) -> Result<Value, SpecializeError> {
        let mut module = self.module.clone();
        for transform in &mut self.transforms {
            transform.apply(&mut module)?;
        }
        let label = module.source.label.clone();
        let unit = compile_unit(module, &label)?;

        let extraction = Namespace::new();
        interp.execute(&unit, &self.function.globals, Some(&extraction))?;
        let make = extraction.get("make").ok_or(SpecializeError::MissingFactory)?;
        let kwargs: Kwargs = self.vars.clone();
        Ok(interp.call(&make, Vec::new(), kwargs)?)
    }
}

/// A fresh function object sharing `function`'s code, globals and captured
/// values but not its identity.
pub fn clone_function(function: &Value) -> Result<Value, SpecializeError> {
    match function {
        Value::Function(f) => Ok(Value::Function(f.clone_function())),
        other => Err(SpecializeError::NotAFunction(other.type_name())),
    }
}

fn render(function: &Function, names: &[Var]) -> Result<String, SpecializeError> {
    let mut code = Code::new();
    let header = format!("def make({}):", Code::params(names, None, None));
    code.w(&[&header], &Subs::new())?;
    code.block(None, &Subs::new(), |s| {
        s.ww(function.source_text(), &Subs::new())?;
        s.w(&["return", &function.name], &Subs::new())
    })?;
    Ok(code.build())
}

/// Collections become tuples so their length is fixed. Text stays as is.
fn tupleify(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::List(_) | Value::Dict(_) | Value::Range(_) | Value::Record(_) => Ok(Value::tuple(value.iterate()?)),
        other => Ok(other),
    }
}

/// `unroll(**names)` that returns its argument unchanged when applied.
pub(crate) fn pass_through() -> Value {
    native(CONTROL_NAME, |_, args, _| {
        if !args.is_empty() {
            return Err(RuntimeError::native(CONTROL_NAME, "takes keyword arguments only"));
        }
        Ok(native(CONTROL_NAME, |_, args, _| match <[Value; 1]>::try_from(args) {
            Ok([function]) => Ok(function),
            Err(args) => Err(RuntimeError::native(
                CONTROL_NAME,
                format!("decorator takes exactly one argument ({} given)", args.len()),
            )),
        }))
    })
}
