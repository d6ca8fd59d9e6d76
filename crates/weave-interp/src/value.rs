// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Runtime values.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use weave_ast::module::Location;
use weave_ast::stmt::FnDef;
use weave_ast::{SourceFile, Span};

use crate::builtins::Builtin;
use crate::interp::{Interpreter, RuntimeError};
use crate::namespace::Namespace;
use crate::record::{Record, RecordType};

/// Keyword arguments, in call order.
pub type Kwargs = IndexMap<String, Value>;

/// A runtime value in the interpreter.
///
/// Containers and functions are reference types: cloning a `Value` shares
/// the underlying object, as assignment does in the script language.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Tuple(Arc<[Value]>),
    List(Arc<Mutex<Vec<Value>>>),
    /// Insertion-ordered, string keys
    Dict(Arc<Mutex<IndexMap<String, Value>>>),
    Range(RangeValue),
    Function(Arc<Function>),
    Builtin(Builtin),
    Native(Arc<dyn NativeFn>),
    BoundMethod(Arc<BoundMethod>),
    /// Positional accessor produced by `_slot(i)` in a class body
    Slot(usize),
    RecordType(Arc<RecordType>),
    Record(Record),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn len(&self) -> usize {
        let span = if self.step > 0 {
            i128::from(self.stop) - i128::from(self.start)
        } else {
            i128::from(self.start) - i128::from(self.stop)
        };
        if span <= 0 {
            return 0;
        }
        let count = (span as u128 - 1) / u128::from(self.step.unsigned_abs()) + 1;
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        if index >= self.len() {
            return None;
        }
        let value = i128::from(self.start) + i128::from(self.step) * index as i128;
        i64::try_from(value).ok()
    }
}

/// A callable implemented in Rust and exposed to scripts.
pub trait NativeFn: Send + Sync {
    fn name(&self) -> &str;

    fn call(&self, interp: &mut Interpreter, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, RuntimeError>;
}

/// `receiver.name`, waiting to be called.
pub struct BoundMethod {
    pub receiver: Value,
    pub name: String,
}

/// A script function: its definition, the namespace it resolves globals in,
/// and the free-variable bindings captured when the `def` ran.
pub struct Function {
    pub name: String,
    pub def: Arc<FnDef>,
    /// Evaluated defaults, aligned with `def.params`
    pub defaults: Vec<Option<Value>>,
    pub globals: Namespace,
    pub closure: IndexMap<String, Value>,
    pub origin: Origin,
}

/// Where a definition came from, for diagnostics and source recovery.
#[derive(Clone)]
pub struct Origin {
    pub source: Arc<SourceFile>,
    pub line_offset: i64,
    pub span: Span,
}

impl Origin {
    pub fn location(&self, span: Span) -> Location {
        Location::resolve(&self.source, self.line_offset, span)
    }
}

impl Function {
    /// Names of the captured free variables, in capture order.
    pub fn free_vars(&self) -> impl Iterator<Item = &str> {
        self.closure.keys().map(String::as_str)
    }

    /// Line of the definition (its first decorator, if any) as reported in
    /// diagnostics.
    pub fn first_line(&self) -> i64 {
        self.origin.location(self.origin.span).line
    }

    /// Text of the definition, decorators included, with the indentation of
    /// its first line preserved.
    pub fn source_text(&self) -> &str {
        self.origin.source.lines_of(self.origin.span)
    }

    pub fn doc(&self) -> Option<&str> {
        self.def.docstring()
    }

    /// A new function object with the same code, globals and captured
    /// values but its own identity.
    pub fn clone_function(self: &Arc<Self>) -> Arc<Function> {
        Arc::new(Function {
            name: self.name.clone(),
            def: Arc::new((*self.def).clone()),
            defaults: self.defaults.clone(),
            globals: self.globals.clone(),
            closure: self.closure.clone(),
            origin: self.origin.clone(),
        })
    }
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

thread_local! {
    static REPR_ACTIVE: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a container as being rendered by `repr` on this thread.
pub(crate) struct ReprGuard(usize);

impl ReprGuard {
    /// `None` when `container` is already being rendered further up.
    pub(crate) fn enter(container: *const ()) -> Option<Self> {
        let addr = container as usize;
        REPR_ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&addr) {
                return None;
            }
            active.push(addr);
            Some(ReprGuard(addr))
        })
    }
}

impl Drop for ReprGuard {
    fn drop(&mut self) {
        REPR_ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|&a| a == self.0) {
                active.remove(pos);
            }
        });
    }
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(Arc::new(Mutex::new(items.into_iter().collect())))
    }

    pub fn dict(entries: IndexMap<String, Value>) -> Value {
        Value::Dict(Arc::new(Mutex::new(entries)))
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Range(_) => "range".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Builtin(_) | Value::Native(_) => "builtin_function".to_string(),
            Value::BoundMethod(_) => "method".to_string(),
            Value::Slot(_) => "slot".to_string(),
            Value::RecordType(_) => "type".to_string(),
            Value::Record(r) => r.record_type().name().to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::List(items) => !lock(items).is_empty(),
            Value::Dict(entries) => !lock(entries).is_empty(),
            Value::Range(r) => !r.is_empty(),
            Value::Record(r) => r.len() > 0,
            _ => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a positional sequence (tuple, list, record), copied out.
    pub fn sequence_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::Tuple(items) => Some(items.to_vec()),
            Value::List(items) => Some(lock(items).clone()),
            Value::Record(r) => Some(r.to_vec()),
            _ => None,
        }
    }

    /// Materialize anything iterable into its items.
    pub fn iterate(&self) -> Result<Vec<Value>, RuntimeError> {
        if let Some(items) = self.sequence_items() {
            return Ok(items);
        }
        match self {
            Value::Dict(entries) => Ok(lock(entries).keys().map(|k| Value::str(k.as_str())).collect()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            Value::Range(r) => Ok((0..r.len()).filter_map(|i| r.get(i)).map(Value::Int).collect()),
            other => Err(RuntimeError::TypeError(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Number of items, for values that have a fixed length.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Tuple(items) => Some(items.len()),
            Value::List(items) => Some(lock(items).len()),
            Value::Dict(entries) => Some(lock(entries).len()),
            Value::Range(r) => Some(r.len()),
            Value::Record(r) => Some(r.len()),
            _ => None,
        }
    }

    /// Identity comparison (`is`).
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::RecordType(a), Value::RecordType(b)) => Arc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => a.slots().ptr_eq(b.slots()),
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Slot(a), Value::Slot(b)) => a == b,
            _ => false,
        }
    }

    /// Text as `repr()` shows it.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => float_repr(*f),
            Value::Str(s) => str_repr(s),
            Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                if inner.len() == 1 {
                    format!("({},)", inner[0])
                } else {
                    format!("({})", inner.join(", "))
                }
            }
            Value::List(items) => {
                let Some(_guard) = ReprGuard::enter(Arc::as_ptr(items) as *const ()) else {
                    return "[...]".to_string();
                };
                let items = lock(items).clone();
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Dict(entries) => {
                let Some(_guard) = ReprGuard::enter(Arc::as_ptr(entries) as *const ()) else {
                    return "{...}".to_string();
                };
                let entries = lock(entries).clone();
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", str_repr(k), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Range(r) if r.step == 1 => format!("range({}, {})", r.start, r.stop),
            Value::Range(r) => format!("range({}, {}, {})", r.start, r.stop, r.step),
            Value::Function(f) => format!("<function {}>", f.name),
            Value::Builtin(b) => format!("<built-in function {}>", b.name()),
            Value::Native(n) => format!("<built-in function {}>", n.name()),
            Value::BoundMethod(m) => format!("<bound method {} of {}>", m.name, m.receiver.type_name()),
            Value::Slot(i) => format!("<slot {}>", i),
            Value::RecordType(t) => format!("<class '{}'>", t.name()),
            Value::Record(r) => r.repr(),
        }
    }
}

/// Python-style float text: integral values keep a trailing `.0`.
fn float_repr(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        (if f > 0.0 { "inf" } else { "-inf" }).to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// Single-quoted unless the text contains a single quote and no double.
pub(crate) fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// `str()` text: strings print bare, everything else as `repr()`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("closure", &self.closure.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Numeric view used by equality, ordering and hashing so that `1`, `1.0`
/// and `True` agree.
enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(v: &Value) -> Option<Num> {
    match v {
        Value::Bool(b) => Some(Num::Int(*b as i64)),
        Value::Int(n) => Some(Num::Int(*n)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

fn num_cmp(a: Num, b: Num) -> Option<Ordering> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        (Num::Int(x), Num::Float(y)) => (x as f64).partial_cmp(&y),
        (Num::Float(x), Num::Int(y)) => x.partial_cmp(&(y as f64)),
        (Num::Float(x), Num::Float(y)) => x.partial_cmp(&y),
    }
}

/// Tuples and records share positional value semantics.
fn positional(v: &Value) -> Option<Vec<Value>> {
    match v {
        Value::Tuple(items) => Some(items.to_vec()),
        Value::Record(r) => Some(r.to_vec()),
        _ => None,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (as_num(self), as_num(other)) {
            return num_cmp(a, b) == Some(Ordering::Equal);
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Arc::ptr_eq(a, b) || {
                    let left = lock(a).clone();
                    let right = lock(b).clone();
                    left == right
                }
            }
            (Value::Dict(a), Value::Dict(b)) => {
                Arc::ptr_eq(a, b) || {
                    let left = lock(a).clone();
                    let right = lock(b).clone();
                    left.len() == right.len()
                        && left.iter().all(|(k, v)| right.get(k).is_some_and(|w| v == w))
                }
            }
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Slot(a), Value::Slot(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Record(a), Value::Record(b)) if a.slots().ptr_eq(b.slots()) => true,
            (a, b) => match (positional(a), positional(b)) {
                (Some(x), Some(y)) => x == y,
                _ => a.is_same(b),
            },
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (as_num(self), as_num(other)) {
            return num_cmp(a, b);
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::List(a), Value::List(b)) => {
                let left = lock(a).clone();
                let right = lock(b).clone();
                seq_cmp(&left, &right)
            }
            (a, b) => match (positional(a), positional(b)) {
                (Some(x), Some(y)) => seq_cmp(&x, &y),
                _ => None,
            },
        }
    }
}

fn seq_cmp(a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b) {
        match x.partial_cmp(y)? {
            Ordering::Equal => continue,
            non_eq => return Some(non_eq),
        }
    }
    Some(a.len().cmp(&b.len()))
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(n) = as_num(self) {
            match n {
                Num::Int(i) => i.hash(state),
                Num::Float(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => (f as i64).hash(state),
                Num::Float(f) => f.to_bits().hash(state),
            }
            return;
        }
        if let Some(items) = positional(self) {
            "seq".hash(state);
            items.hash(state);
            return;
        }
        match self {
            Value::None => 0u8.hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(items) => lock(items).clone().hash(state),
            Value::Dict(entries) => {
                for (k, v) in lock(entries).clone() {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Range(r) => r.hash(state),
            Value::Slot(i) => i.hash(state),
            Value::Builtin(b) => b.hash(state),
            Value::Function(f) => (Arc::as_ptr(f) as usize).hash(state),
            Value::Native(n) => (Arc::as_ptr(n) as *const () as usize).hash(state),
            Value::BoundMethod(m) => (Arc::as_ptr(m) as usize).hash(state),
            Value::RecordType(t) => (Arc::as_ptr(t) as usize).hash(state),
            _ => {}
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::tuple(items)
    }
}
