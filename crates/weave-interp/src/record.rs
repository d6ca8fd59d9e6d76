// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Slot-backed record classes.
//!
//! A `class Name(_slots):` body is turned into a [`RecordType`]; calling the
//! type produces [`Record`] instances whose storage is a [`Slots`] of the
//! type's arity.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use crate::builtins::Builtin;
use crate::interp::format::percent_format;
use crate::interp::RuntimeError;
use crate::slots::Slots;
use crate::value::{Kwargs, ReprGuard, Value};

/// Class-body names with special meaning; everything else is an attribute.
const RESERVED_ATTRS: &[&str] = &["_fields", "_arity", "_repr_fmt", "_mapping"];

#[derive(Debug)]
pub struct RecordType {
    name: String,
    fields: Vec<String>,
    /// Accessor name → slot index
    accessors: IndexMap<String, usize>,
    repr_fmt: String,
    doc: Option<String>,
    attrs: IndexMap<String, Value>,
    source: OnceLock<String>,
}

impl RecordType {
    /// Build a record type from an executed class body.
    pub fn from_class(
        name: &str,
        doc: Option<&str>,
        body: IndexMap<String, Value>,
    ) -> Result<RecordType, RuntimeError> {
        let fields = match body.get("_fields") {
            Some(value) => field_names(value).ok_or_else(|| {
                RuntimeError::TypeError(format!("{}._fields must be a tuple of strings", name))
            })?,
            None => {
                return Err(RuntimeError::TypeError(format!(
                    "class {} must define _fields",
                    name
                )))
            }
        };

        if let Some(arity) = body.get("_arity") {
            if arity.as_int() != Some(fields.len() as i64) {
                return Err(RuntimeError::ValueError(format!(
                    "{}._arity is {} but there are {} fields",
                    name,
                    arity.repr(),
                    fields.len()
                )));
            }
        }

        match body.get("_mapping") {
            None | Some(Value::Builtin(Builtin::Dict | Builtin::OrderedDict)) => {}
            Some(other) => {
                return Err(RuntimeError::TypeError(format!(
                    "{}._mapping must be a dict type, not {}",
                    name,
                    other.repr()
                )))
            }
        }

        let repr_fmt = match body.get("_repr_fmt") {
            Some(Value::Str(fmt)) => fmt.to_string(),
            Some(other) => {
                return Err(RuntimeError::TypeError(format!(
                    "{}._repr_fmt must be a string, not {}",
                    name,
                    other.type_name()
                )))
            }
            None => default_repr_fmt(&fields),
        };

        let mut accessors = IndexMap::new();
        let mut attrs = IndexMap::new();
        for (key, value) in body {
            if RESERVED_ATTRS.contains(&key.as_str()) {
                continue;
            }
            match value {
                Value::Slot(index) if index >= fields.len() => {
                    return Err(RuntimeError::ValueError(format!(
                        "{}.{} refers to slot {} but the arity is {}",
                        name,
                        key,
                        index,
                        fields.len()
                    )))
                }
                Value::Slot(index) => {
                    accessors.insert(key, index);
                }
                other => {
                    attrs.insert(key, other);
                }
            }
        }

        Ok(RecordType {
            name: name.to_string(),
            fields,
            accessors,
            repr_fmt,
            doc: doc.map(str::to_string),
            attrs,
            source: OnceLock::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Generated source, when it was kept.
    pub fn source(&self) -> Option<&str> {
        self.source.get().map(String::as_str)
    }

    /// Attach the source text the type was compiled from. Only the first
    /// call has an effect.
    pub fn set_source(&self, source: String) {
        let _ = self.source.set(source);
    }

    pub fn accessor(&self, name: &str) -> Option<usize> {
        self.accessors.get(name).copied()
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn fields_value(&self) -> Value {
        Value::tuple(self.fields.iter().map(|f| Value::str(f.as_str())))
    }

    /// Construct an instance from call arguments. The total argument count
    /// must equal the arity; keywords must name fields not already given.
    pub fn instantiate(self: &Arc<Self>, args: Vec<Value>, kwargs: Kwargs) -> Result<Record, RuntimeError> {
        let got = args.len() + kwargs.len();
        if got != self.arity() {
            return Err(RuntimeError::ArityMismatch {
                callee: self.name.clone(),
                expected: self.arity(),
                got,
            });
        }

        let positional = args.len();
        let mut values: Vec<Option<Value>> = args.into_iter().map(Some).collect();
        values.resize(self.arity(), None);
        for (key, value) in kwargs {
            let index = self.field_index(&key).ok_or_else(|| {
                RuntimeError::TypeError(format!("{}() got an unexpected keyword argument '{}'", self.name, key))
            })?;
            if index < positional || values[index].is_some() {
                return Err(RuntimeError::TypeError(format!(
                    "{}() got multiple values for argument '{}'",
                    self.name, key
                )));
            }
            values[index] = Some(value);
        }

        Ok(Record::new(self.clone(), values.into_iter().map(|v| v.unwrap_or(Value::None)).collect()))
    }

    /// `_make(iterable)`: construct from exactly `arity` items.
    pub fn make(self: &Arc<Self>, values: Vec<Value>) -> Result<Record, RuntimeError> {
        if values.len() != self.arity() {
            return Err(RuntimeError::ArityMismatch {
                callee: self.name.clone(),
                expected: self.arity(),
                got: values.len(),
            });
        }
        Ok(Record::new(self.clone(), values))
    }

    fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}

fn field_names(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Tuple(items) => items.iter().map(|v| v.as_str().map(str::to_string)).collect(),
        _ => None,
    }
}

fn default_repr_fmt(fields: &[String]) -> String {
    let parts: Vec<String> = fields.iter().map(|f| format!("{}=%r", f)).collect();
    format!("({})", parts.join(", "))
}

/// An instance of a [`RecordType`].
#[derive(Clone, Debug)]
pub struct Record {
    ty: Arc<RecordType>,
    slots: Slots,
}

impl Record {
    fn new(ty: Arc<RecordType>, values: Vec<Value>) -> Self {
        Record { ty, slots: Slots::new(values) }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.ty.arity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.slots.to_vec()
    }

    pub fn get_index(&self, index: usize) -> Option<Value> {
        self.slots.get(index)
    }

    /// Read a field through its accessor.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.ty.accessor(name).and_then(|i| self.slots.get(i))
    }

    /// Write a field through its accessor.
    pub fn set(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        match self.ty.accessor(name) {
            Some(index) => self.slots.set(index, value),
            None => Err(RuntimeError::AttributeError {
                ty: self.ty.name.clone(),
                attr: name.to_string(),
            }),
        }
    }

    /// `_replace(**updates)`: every name is checked before any slot is
    /// written, then the instance is updated in place.
    pub fn replace(&self, updates: Kwargs) -> Result<&Self, RuntimeError> {
        let mut writes = Vec::with_capacity(updates.len());
        let mut unknown = Vec::new();
        for (key, value) in updates {
            match self.ty.field_index(&key) {
                Some(index) => writes.push((index, value)),
                None => unknown.push(key),
            }
        }
        if !unknown.is_empty() {
            return Err(RuntimeError::ValueError(format!(
                "got unexpected field names: {}",
                unknown.join(", ")
            )));
        }
        self.slots.set_many(writes);
        Ok(self)
    }

    /// `_asdict()`: field → value in field order.
    pub fn as_dict(&self) -> IndexMap<String, Value> {
        self.ty.fields.iter().cloned().zip(self.slots.to_vec()).collect()
    }

    pub fn repr(&self) -> String {
        let Some(_guard) = ReprGuard::enter(self.slots.as_ptr()) else {
            return format!("{}(...)", self.ty.name);
        };
        let values = Value::tuple(self.slots.to_vec());
        match percent_format(&self.ty.repr_fmt, &values) {
            Ok(body) => format!("{}{}", self.ty.name, body),
            Err(_) => format!("<{} object>", self.ty.name),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Record) -> bool {
        self.slots == other.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_type() -> Arc<RecordType> {
        let mut body = IndexMap::new();
        body.insert("_fields".to_string(), Value::tuple([Value::str("x"), Value::str("y")]));
        body.insert("_arity".to_string(), Value::Int(2));
        body.insert("_repr_fmt".to_string(), Value::str("(x=%r, y=%r)"));
        body.insert("_mapping".to_string(), Value::Builtin(Builtin::OrderedDict));
        body.insert("x".to_string(), Value::Slot(0));
        body.insert("y".to_string(), Value::Slot(1));
        body.insert("origin".to_string(), Value::Int(0));
        Arc::new(RecordType::from_class("Point", Some("Point(x, y)"), body).unwrap())
    }

    fn kwargs(pairs: &[(&str, i64)]) -> Kwargs {
        pairs.iter().map(|(k, v)| (k.to_string(), Value::Int(*v))).collect()
    }

    #[test]
    fn class_body_is_split_into_accessors_and_attrs() {
        let ty = point_type();
        assert_eq!(ty.fields(), ["x", "y"]);
        assert_eq!(ty.accessor("y"), Some(1));
        assert_eq!(ty.attr("origin"), Some(&Value::Int(0)));
        assert!(ty.attr("_arity").is_none());
        assert_eq!(ty.doc(), Some("Point(x, y)"));
    }

    #[test]
    fn construction_checks_arity_then_keywords() {
        let ty = point_type();
        let p = ty.instantiate(vec![Value::Int(1)], kwargs(&[("y", 2)])).unwrap();
        assert_eq!(p.to_vec(), vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(p.repr(), "Point(x=1, y=2)");

        let err = ty.instantiate(vec![Value::Int(1)], Kwargs::new()).unwrap_err();
        assert_eq!(err.to_string(), "Point() expected 2 arguments, got 1");

        let err = ty.instantiate(vec![Value::Int(1)], kwargs(&[("x", 2)])).unwrap_err();
        assert!(err.to_string().contains("multiple values for argument 'x'"));

        let err = ty.instantiate(vec![], kwargs(&[("x", 1), ("z", 2)])).unwrap_err();
        assert!(err.to_string().contains("unexpected keyword argument 'z'"));
    }

    #[test]
    fn replace_validates_before_writing() {
        let ty = point_type();
        let p = ty.make(vec![Value::Int(1), Value::Int(2)]).unwrap();
        let err = p.replace(kwargs(&[("x", 9), ("w", 0)])).unwrap_err();
        assert!(err.to_string().contains("w"));
        assert_eq!(p.get("x"), Some(Value::Int(1)));

        let same = p.replace(kwargs(&[("y", 7)])).unwrap();
        assert!(same.slots().ptr_eq(p.slots()));
        assert_eq!(p.get("y"), Some(Value::Int(7)));
    }

    #[test]
    fn record_holding_itself_repr() {
        let ty = point_type();
        let p = ty.make(vec![Value::Int(1), Value::None]).unwrap();
        p.set("y", Value::Record(p.clone())).unwrap();
        assert_eq!(p.repr(), "Point(x=1, y=Point(...))");
    }

    #[test]
    fn bad_class_bodies() {
        let err = RecordType::from_class("T", None, IndexMap::new()).unwrap_err();
        assert!(err.to_string().contains("must define _fields"));

        let mut body = IndexMap::new();
        body.insert("_fields".to_string(), Value::tuple([Value::str("a")]));
        body.insert("_arity".to_string(), Value::Int(3));
        assert!(RecordType::from_class("T", None, body).is_err());

        let mut body = IndexMap::new();
        body.insert("_fields".to_string(), Value::tuple([Value::str("a")]));
        body.insert("b".to_string(), Value::Slot(4));
        assert!(RecordType::from_class("T", None, body).is_err());
    }

    #[test]
    fn source_is_set_once() {
        let ty = point_type();
        assert_eq!(ty.source(), None);
        ty.set_source("first".to_string());
        ty.set_source("second".to_string());
        assert_eq!(ty.source(), Some("first"));
    }
}
