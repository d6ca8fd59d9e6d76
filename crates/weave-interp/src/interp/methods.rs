// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Attribute access, subscripts and built-in methods.

use std::sync::Arc;

use crate::value::{lock, BoundMethod, Kwargs, Value};

use super::RuntimeError;

pub const LIST_METHODS: &[&str] = &["append", "extend", "pop"];
pub const DICT_METHODS: &[&str] = &["items", "keys", "values", "get"];
pub const STR_METHODS: &[&str] = &["join", "split", "startswith", "replace", "upper", "lower"];
pub const RECORD_METHODS: &[&str] = &["_asdict", "_replace"];
pub const RECORD_TYPE_METHODS: &[&str] = &["_make"];

fn bind(receiver: &Value, name: &str) -> Value {
    Value::BoundMethod(Arc::new(BoundMethod {
        receiver: receiver.clone(),
        name: name.to_string(),
    }))
}

fn no_attribute(value: &Value, name: &str) -> RuntimeError {
    RuntimeError::AttributeError {
        ty: value.type_name(),
        attr: name.to_string(),
    }
}

pub(crate) fn get_attr(value: &Value, name: &str) -> Result<Value, RuntimeError> {
    let methods = match value {
        Value::List(_) => LIST_METHODS,
        Value::Dict(_) => DICT_METHODS,
        Value::Str(_) => STR_METHODS,
        Value::Record(_) => RECORD_METHODS,
        Value::RecordType(_) => RECORD_TYPE_METHODS,
        _ => &[],
    };
    if methods.contains(&name) {
        return Ok(bind(value, name));
    }

    match value {
        Value::Record(record) => {
            let ty = record.record_type();
            if let Some(field) = record.get(name) {
                return Ok(field);
            }
            match name {
                "_fields" => Ok(ty.fields_value()),
                "__class__" => Ok(Value::RecordType(ty.clone())),
                "__doc__" => Ok(ty.doc().map(Value::str).unwrap_or(Value::None)),
                _ => ty.attr(name).cloned().ok_or_else(|| no_attribute(value, name)),
            }
        }
        Value::RecordType(ty) => match name {
            "__name__" => Ok(Value::str(ty.name())),
            "__doc__" => Ok(ty.doc().map(Value::str).unwrap_or(Value::None)),
            "_fields" => Ok(ty.fields_value()),
            "_source" => ty.source().map(Value::str).ok_or_else(|| no_attribute(value, name)),
            _ => ty
                .accessor(name)
                .map(Value::Slot)
                .or_else(|| ty.attr(name).cloned())
                .ok_or_else(|| no_attribute(value, name)),
        },
        Value::Function(function) => match name {
            "__name__" => Ok(Value::str(function.name.as_str())),
            "__doc__" => Ok(function.doc().map(Value::str).unwrap_or(Value::None)),
            _ => Err(no_attribute(value, name)),
        },
        _ => Err(no_attribute(value, name)),
    }
}

pub(crate) fn set_attr(target: &Value, name: &str, value: Value) -> Result<(), RuntimeError> {
    match target {
        Value::Record(record) => record.set(name, value),
        other => Err(no_attribute(other, name)),
    }
}

/// Resolve a possibly negative index against `len`.
fn normalize_index(index: &Value, len: usize, container: &Value) -> Result<usize, RuntimeError> {
    let i = index.as_int().ok_or_else(|| {
        RuntimeError::TypeError(format!(
            "{} indices must be integers, not {}",
            container.type_name(),
            index.type_name()
        ))
    })?;
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved >= len as i64 {
        return Err(RuntimeError::IndexOutOfBounds { index: i, len });
    }
    Ok(resolved as usize)
}

fn dict_key<'a>(key: &'a Value) -> Result<&'a str, RuntimeError> {
    key.as_str()
        .ok_or_else(|| RuntimeError::TypeError(format!("dict keys must be strings, not '{}'", key.type_name())))
}

pub(crate) fn get_item(container: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match container {
        Value::Dict(entries) => {
            let key = dict_key(index)?;
            lock(entries)
                .get(key)
                .cloned()
                .ok_or_else(|| RuntimeError::KeyError(key.to_string()))
        }
        Value::Tuple(items) => Ok(items[normalize_index(index, items.len(), container)?].clone()),
        Value::List(items) => {
            let items = lock(items);
            Ok(items[normalize_index(index, items.len(), container)?].clone())
        }
        Value::Record(record) => {
            let i = normalize_index(index, record.len(), container)?;
            record
                .get_index(i)
                .ok_or(RuntimeError::IndexOutOfBounds { index: i as i64, len: record.len() })
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = normalize_index(index, chars.len(), container)?;
            Ok(Value::str(chars[i].to_string()))
        }
        Value::Range(range) => {
            let i = normalize_index(index, range.len(), container)?;
            range
                .get(i)
                .map(Value::Int)
                .ok_or(RuntimeError::IndexOutOfBounds { index: i as i64, len: range.len() })
        }
        other => Err(RuntimeError::TypeError(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

pub(crate) fn set_item(container: &Value, index: &Value, value: Value) -> Result<(), RuntimeError> {
    match container {
        Value::Dict(entries) => {
            let key = dict_key(index)?;
            lock(entries).insert(key.to_string(), value);
            Ok(())
        }
        Value::List(items) => {
            let mut items = lock(items);
            let i = normalize_index(index, items.len(), container)?;
            items[i] = value;
            Ok(())
        }
        Value::Record(record) => {
            let i = normalize_index(index, record.len(), container)?;
            record.slots().set(i, value)
        }
        other => Err(RuntimeError::TypeError(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

fn arity(method: &str, args: &[Value], min: usize, max: usize) -> Result<(), RuntimeError> {
    if args.len() < min || args.len() > max {
        return Err(RuntimeError::ArityMismatch {
            callee: method.to_string(),
            expected: if args.len() < min { min } else { max },
            got: args.len(),
        });
    }
    Ok(())
}

fn no_keywords(method: &str, kwargs: &Kwargs) -> Result<(), RuntimeError> {
    match kwargs.keys().next() {
        Some(key) => Err(RuntimeError::TypeError(format!(
            "{}() got an unexpected keyword argument '{}'",
            method, key
        ))),
        None => Ok(()),
    }
}

fn string_arg<'a>(method: &str, value: &'a Value) -> Result<&'a str, RuntimeError> {
    value.as_str().ok_or_else(|| {
        RuntimeError::TypeError(format!("{}() argument must be str, not {}", method, value.type_name()))
    })
}

/// Call `receiver.name(*args, **kwargs)` for a built-in method.
pub(crate) fn call_method(
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
    kwargs: Kwargs,
) -> Result<Value, RuntimeError> {
    if !matches!(receiver, Value::Record(_)) {
        no_keywords(name, &kwargs)?;
    }

    match (receiver, name) {
        (Value::List(items), "append") => {
            arity(name, &args, 1, 1)?;
            lock(items).extend(args);
            Ok(Value::None)
        }
        (Value::List(items), "extend") => {
            arity(name, &args, 1, 1)?;
            let extra = args[0].iterate()?;
            lock(items).extend(extra);
            Ok(Value::None)
        }
        (Value::List(items), "pop") => {
            arity(name, &args, 0, 1)?;
            let mut items = lock(items);
            let index = args.first().cloned().unwrap_or(Value::Int(-1));
            let i = normalize_index(&index, items.len(), receiver)?;
            Ok(items.remove(i))
        }

        (Value::Dict(entries), "items") => {
            arity(name, &args, 0, 0)?;
            let pairs = lock(entries)
                .iter()
                .map(|(k, v)| Value::tuple([Value::str(k.as_str()), v.clone()]))
                .collect::<Vec<_>>();
            Ok(Value::list(pairs))
        }
        (Value::Dict(entries), "keys") => {
            arity(name, &args, 0, 0)?;
            let keys = lock(entries).keys().map(|k| Value::str(k.as_str())).collect::<Vec<_>>();
            Ok(Value::list(keys))
        }
        (Value::Dict(entries), "values") => {
            arity(name, &args, 0, 0)?;
            let values = lock(entries).values().cloned().collect::<Vec<_>>();
            Ok(Value::list(values))
        }
        (Value::Dict(entries), "get") => {
            arity(name, &args, 1, 2)?;
            let key = dict_key(&args[0])?;
            let found = lock(entries).get(key).cloned();
            Ok(found.or_else(|| args.get(1).cloned()).unwrap_or(Value::None))
        }

        (Value::Str(s), "join") => {
            arity(name, &args, 1, 1)?;
            let mut parts = Vec::new();
            for item in args[0].iterate()? {
                parts.push(string_arg(name, &item)?.to_string());
            }
            Ok(Value::str(parts.join(&**s)))
        }
        (Value::Str(s), "split") => {
            arity(name, &args, 0, 1)?;
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::None) => s.split_whitespace().map(Value::str).collect(),
                Some(sep) => {
                    let sep = string_arg(name, sep)?;
                    if sep.is_empty() {
                        return Err(RuntimeError::ValueError("empty separator".to_string()));
                    }
                    s.split(sep).map(Value::str).collect()
                }
            };
            Ok(Value::list(parts))
        }
        (Value::Str(s), "startswith") => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Bool(s.starts_with(string_arg(name, &args[0])?)))
        }
        (Value::Str(s), "replace") => {
            arity(name, &args, 2, 2)?;
            let old = string_arg(name, &args[0])?;
            let new = string_arg(name, &args[1])?;
            Ok(Value::str(s.replace(old, new)))
        }
        (Value::Str(s), "upper") => {
            arity(name, &args, 0, 0)?;
            Ok(Value::str(s.to_uppercase()))
        }
        (Value::Str(s), "lower") => {
            arity(name, &args, 0, 0)?;
            Ok(Value::str(s.to_lowercase()))
        }

        (Value::Record(record), "_asdict") => {
            arity(name, &args, 0, 0)?;
            no_keywords(name, &kwargs)?;
            Ok(Value::dict(record.as_dict()))
        }
        (Value::Record(record), "_replace") => {
            arity(name, &args, 0, 0)?;
            record.replace(kwargs)?;
            Ok(receiver.clone())
        }
        (Value::RecordType(ty), "_make") => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Record(ty.make(args[0].iterate()?)?))
        }

        _ => Err(no_attribute(receiver, name)),
    }
}
