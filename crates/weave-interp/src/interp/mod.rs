// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The interpreter implementation.
//!
//! A tree-walk interpreter over `weave_ast` statements. Each executing
//! module or function body gets a [`Frame`] naming the namespaces it reads
//! and writes; control flow (`return`, `break`, `continue`) travels as
//! `RuntimeError` variants and is caught where it belongs.

mod assign;
mod call;
mod eval_expr;
mod exec_stmt;
pub(crate) mod format;
pub(crate) mod methods;
pub(crate) mod operators;

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::debug;
use weave_ast::module::Location;
use weave_ast::{SourceFile, Span};

use crate::compile::Executable;
use crate::namespace::Namespace;
use crate::value::{lock, Function, Origin, Value};

/// Deepest allowed nesting of script function calls.
pub const MAX_CALL_DEPTH: usize = 100;

/// Runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("name '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("{0}")]
    TypeError(String),

    #[error("'{ty}' object has no attribute '{attr}'")]
    AttributeError { ty: String, attr: String },

    #[error("index {index} out of range (length is {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("key '{0}' not found")]
    KeyError(String),

    #[error("{callee}() expected {expected} argument{}, got {got}", if *.expected == 1 { "" } else { "s" })]
    ArityMismatch { callee: String, expected: usize, got: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    #[error("{0}")]
    ValueError(String),

    #[error("maximum call depth ({0}) exceeded")]
    RecursionLimit(usize),

    /// Failure reported by a native callable.
    #[error("{name}: {message}")]
    Native { name: String, message: String },

    /// An error together with the statement it escaped from.
    #[error("{location}: {error}")]
    Traced { location: Location, error: Box<RuntimeError> },

    /// Used for control flow: return statement.
    #[error("'return' outside function")]
    Return(Value),

    /// Used for control flow: break statement.
    #[error("'break' outside loop")]
    Break,

    /// Used for control flow: continue statement.
    #[error("'continue' outside loop")]
    Continue,
}

impl RuntimeError {
    pub fn native(name: impl Into<String>, message: impl ToString) -> Self {
        RuntimeError::Native {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn is_control_flow(&self) -> bool {
        matches!(self, RuntimeError::Return(_) | RuntimeError::Break | RuntimeError::Continue)
    }

    /// Where the error was raised, if it has been traced.
    pub fn location(&self) -> Option<&Location> {
        match self {
            RuntimeError::Traced { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The error without its location wrapper.
    pub fn root(&self) -> &RuntimeError {
        match self {
            RuntimeError::Traced { error, .. } => error.root(),
            other => other,
        }
    }

    pub fn into_root(self) -> RuntimeError {
        match self {
            RuntimeError::Traced { error, .. } => error.into_root(),
            other => other,
        }
    }

    /// Attach a location unless one is already attached. Control flow
    /// passes through untouched.
    pub(crate) fn traced(self, location: impl FnOnce() -> Location) -> Self {
        if self.is_control_flow() || matches!(self, RuntimeError::Traced { .. }) {
            return self;
        }
        RuntimeError::Traced {
            location: location(),
            error: Box::new(self),
        }
    }
}

/// The namespaces and source position of one executing body.
pub(crate) struct Frame {
    /// Where assignments go
    pub locals: Namespace,
    pub globals: Namespace,
    /// The function whose body this is, for its captured bindings
    pub function: Option<Arc<Function>>,
    pub source: Arc<SourceFile>,
    pub line_offset: i64,
}

impl Frame {
    pub fn location(&self, span: Span) -> Location {
        Location::resolve(&self.source, self.line_offset, span)
    }

    pub fn origin(&self, span: Span) -> Origin {
        Origin {
            source: self.source.clone(),
            line_offset: self.line_offset,
            span,
        }
    }
}

/// The tree-walk interpreter.
pub struct Interpreter {
    /// Current script call depth.
    depth: usize,
    /// Optional output buffer for capturing stdout (used in tests).
    output_buffer: Option<Arc<Mutex<String>>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            depth: 0,
            output_buffer: None,
        }
    }

    /// Returns interpreter and output buffer reference.
    pub fn with_captured_output() -> (Self, Arc<Mutex<String>>) {
        let buffer = Arc::new(Mutex::new(String::new()));
        let interp = Self {
            depth: 0,
            output_buffer: Some(buffer.clone()),
        };
        (interp, buffer)
    }

    /// Run a compiled unit. Module-level assignments go to `extraction`
    /// when given, otherwise to `globals`.
    pub fn execute(
        &mut self,
        unit: &Executable,
        globals: &Namespace,
        extraction: Option<&Namespace>,
    ) -> Result<(), RuntimeError> {
        debug!(label = unit.label(), "executing unit");
        let module = unit.module();
        let frame = Frame {
            locals: extraction.unwrap_or(globals).clone(),
            globals: globals.clone(),
            function: None,
            source: module.source.clone(),
            line_offset: module.line_offset,
        };
        self.exec_block(&frame, &module.body)
    }

    /// Write program output to the capture buffer or stdout.
    pub(crate) fn write_output(&self, text: &str) {
        match &self.output_buffer {
            Some(buffer) => lock(buffer).push_str(text),
            None => {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_unit;
    use crate::value::Kwargs;

    fn run(src: &str) -> Namespace {
        let unit = compile_unit(src, "<test>").unwrap();
        let ns = Namespace::new();
        Interpreter::new().execute(&unit, &ns, None).unwrap();
        ns
    }

    fn run_err(src: &str) -> RuntimeError {
        let unit = compile_unit(src, "<test>").unwrap();
        Interpreter::new().execute(&unit, &Namespace::new(), None).unwrap_err()
    }

    fn output(src: &str) -> String {
        let unit = compile_unit(src, "<test>").unwrap();
        let (mut interp, buffer) = Interpreter::with_captured_output();
        interp.execute(&unit, &Namespace::new(), None).unwrap();
        let out = buffer.lock().unwrap().clone();
        out
    }

    #[test]
    fn arithmetic_and_assignment() {
        let ns = run("a = 7 // 2\nb = -7 // 2\nc = 7 % -3\nd = 2 ** 10\ne = 1 / 4\nf = 'ab' * 2\n");
        assert_eq!(ns.get("a"), Some(Value::Int(3)));
        assert_eq!(ns.get("b"), Some(Value::Int(-4)));
        assert_eq!(ns.get("c"), Some(Value::Int(-2)));
        assert_eq!(ns.get("d"), Some(Value::Int(1024)));
        assert_eq!(ns.get("e"), Some(Value::Float(0.25)));
        assert_eq!(ns.get("f"), Some(Value::str("abab")));
    }

    #[test]
    fn loops_and_branches() {
        let src = "\
total = 0
for i in range(10):
    if i % 2:
        continue
    if i > 6:
        break
    total += i
else:
    total = -1
n = 0
while n < 3:
    n += 1
";
        let ns = run(src);
        assert_eq!(ns.get("total"), Some(Value::Int(12)));
        assert_eq!(ns.get("n"), Some(Value::Int(3)));
    }

    #[test]
    fn for_else_runs_without_break() {
        let ns = run("hit = False\nfor x in ():\n    pass\nelse:\n    hit = True\n");
        assert_eq!(ns.get("hit"), Some(Value::Bool(true)));
    }

    #[test]
    fn functions_defaults_and_varargs() {
        let src = "\
def f(a, b=10, *rest, **opts):
    return (a, b, rest, opts)
r1 = f(1)
r2 = f(1, 2, 3, 4, k=5)
r3 = f(b=3, a=4)
";
        let ns = run(src);
        assert_eq!(ns.get("r1").unwrap().repr(), "(1, 10, (), {})");
        assert_eq!(ns.get("r2").unwrap().repr(), "(1, 2, (3, 4), {'k': 5})");
        assert_eq!(ns.get("r3").unwrap().repr(), "(4, 3, (), {})");
    }

    #[test]
    fn closures_capture_at_definition() {
        let src = "\
def outer(n):
    def inner(x):
        return x + n
    return inner
add5 = outer(5)
r = add5(1)
";
        let ns = run(src);
        assert_eq!(ns.get("r"), Some(Value::Int(6)));
        let Some(Value::Function(f)) = ns.get("add5") else { panic!("expected function") };
        assert_eq!(f.free_vars().collect::<Vec<_>>(), vec!["n"]);
        assert_eq!(f.closure.get("n"), Some(&Value::Int(5)));
    }

    #[test]
    fn decorators_apply_bottom_up() {
        let src = "\
def tag(label):
    def wrap(f):
        def inner():
            return label + f()
        return inner
    return wrap
@tag('a')
@tag('b')
def base():
    return 'c'
r = base()
";
        assert_eq!(run(src).get("r"), Some(Value::str("abc")));
    }

    #[test]
    fn extraction_namespace_receives_writes() {
        let unit = compile_unit("y = x + 1\n", "<t>").unwrap();
        let globals = Namespace::new();
        globals.set("x", Value::Int(1));
        let locals = Namespace::new();
        Interpreter::new().execute(&unit, &globals, Some(&locals)).unwrap();
        assert_eq!(locals.get("y"), Some(Value::Int(2)));
        assert!(!globals.contains("y"));
    }

    #[test]
    fn errors_are_traced_to_the_failing_line() {
        let err = run_err("x = 1\ny = x + 'a'\n");
        let location = err.location().unwrap();
        assert_eq!(location.to_string(), "<test>:2:1");
        assert!(matches!(err.root(), RuntimeError::TypeError(_)));

        let err = run_err("def f():\n    return g()\nf()\n");
        assert_eq!(err.location().unwrap().line, 2);
        assert!(matches!(err.root(), RuntimeError::UndefinedVariable(n) if n == "g"));
    }

    #[test]
    fn arity_errors() {
        let err = run_err("def f(a, b):\n    pass\nf(1, 2, 3)\n");
        assert_eq!(err.root().to_string(), "f() expected 2 arguments, got 3");
        let err = run_err("def f(a):\n    pass\nf()\n");
        assert!(err.root().to_string().contains("missing required argument 'a'"));
        let err = run_err("def f(a):\n    pass\nf(1, b=2)\n");
        assert!(err.root().to_string().contains("unexpected keyword argument 'b'"));
    }

    #[test]
    fn recursion_is_bounded() {
        // debug builds use large frames; give the walk room below the limit
        let err = std::thread::Builder::new()
            .stack_size(32 << 20)
            .spawn(|| run_err("def f(n):\n    return f(n + 1)\nf(0)\n"))
            .unwrap()
            .join()
            .unwrap();
        assert!(matches!(err.root(), RuntimeError::RecursionLimit(MAX_CALL_DEPTH)));
    }

    #[test]
    fn overflow_is_an_error() {
        let err = run_err("x = 9223372036854775807 + 1\n");
        assert!(matches!(err.root(), RuntimeError::Overflow(_)));
        let err = run_err("x = 1 // 0\n");
        assert!(matches!(err.root(), RuntimeError::DivisionByZero));
        let err = run_err("x = 'ab' * 9223372036854775807\n");
        assert!(matches!(err.root(), RuntimeError::Overflow("repetition")));
        let err = run_err("x = (1, 2) * 9223372036854775807\n");
        assert!(matches!(err.root(), RuntimeError::Overflow("repetition")));
    }

    #[test]
    fn list_containing_itself_has_finite_repr() {
        let ns = run("l = [1]\nl.append(l)\ns = repr(l)\nr = range(10, 0, -9223372036854775807 - 1)\nn = len(r)\n");
        assert_eq!(ns.get("s"), Some(Value::str("[1, [...]]")));
        assert_eq!(ns.get("n"), Some(Value::Int(1)));
    }

    #[test]
    fn print_and_formatting() {
        let out = output("print('%s=%r' % ('a', 'b'), 100 % 7)\nprint(1, 2, sep='-', end='!')\n");
        assert_eq!(out, "a='b' 2\n1-2!");
    }

    #[test]
    fn containers_and_methods() {
        let src = "\
xs = [1, 2]
xs.append(3)
xs.extend((4, 5))
last = xs.pop()
d = {'b': 1}
d['a'] = 2
keys = d.keys()
pairs = d.items()
words = ' '.join(['x', 'y']).upper().split()
a, (b, c) = 1, [2, 3]
";
        let ns = run(src);
        assert_eq!(ns.get("xs").unwrap().repr(), "[1, 2, 3, 4]");
        assert_eq!(ns.get("last"), Some(Value::Int(5)));
        assert_eq!(ns.get("keys").unwrap().repr(), "['b', 'a']");
        assert_eq!(ns.get("pairs").unwrap().repr(), "[('b', 1), ('a', 2)]");
        assert_eq!(ns.get("words").unwrap().repr(), "['X', 'Y']");
        assert_eq!(ns.get("c"), Some(Value::Int(3)));
    }

    #[test]
    fn calling_from_rust() {
        let ns = run("def add(a, b):\n    return a + b\n");
        let add = ns.get("add").unwrap();
        let mut kwargs = Kwargs::new();
        kwargs.insert("b".to_string(), Value::Int(2));
        let r = Interpreter::new().call(&add, vec![Value::Int(1)], kwargs).unwrap();
        assert_eq!(r, Value::Int(3));
    }
}
