// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Built-in functions.

use std::cmp::Ordering;

use indexmap::IndexMap;
use weave_ast::expr::BinOp;

use crate::interp::{methods, operators, Interpreter, RuntimeError};
use crate::value::{lock, Kwargs, RangeValue, Value};

/// Built-in callables.
///
/// `Slots`, `Slot` and `OrderedDict` are not visible by name; hosts seed
/// them into a namespace explicitly (see [`Builtin::ambient`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Len,
    Tuple,
    List,
    Dict,
    OrderedDict,
    Range,
    Str,
    Repr,
    Print,
    Getattr,
    Setattr,
    Zip,
    Enumerate,
    Min,
    Max,
    Sum,
    Abs,
    Int,
    /// Base class for slot-backed records (`_slots`)
    Slots,
    /// Positional accessor factory (`_slot`)
    Slot,
}

const GLOBAL: &[Builtin] = &[
    Builtin::Len,
    Builtin::Tuple,
    Builtin::List,
    Builtin::Dict,
    Builtin::Range,
    Builtin::Str,
    Builtin::Repr,
    Builtin::Print,
    Builtin::Getattr,
    Builtin::Setattr,
    Builtin::Zip,
    Builtin::Enumerate,
    Builtin::Min,
    Builtin::Max,
    Builtin::Sum,
    Builtin::Abs,
    Builtin::Int,
];

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Tuple => "tuple",
            Builtin::List => "list",
            Builtin::Dict => "dict",
            Builtin::OrderedDict => "OrderedDict",
            Builtin::Range => "range",
            Builtin::Str => "str",
            Builtin::Repr => "repr",
            Builtin::Print => "print",
            Builtin::Getattr => "getattr",
            Builtin::Setattr => "setattr",
            Builtin::Zip => "zip",
            Builtin::Enumerate => "enumerate",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Sum => "sum",
            Builtin::Abs => "abs",
            Builtin::Int => "int",
            Builtin::Slots => "_slots",
            Builtin::Slot => "_slot",
        }
    }

    /// Builtins every unit can see without importing them.
    pub fn lookup(name: &str) -> Option<Builtin> {
        GLOBAL.iter().copied().find(|b| b.name() == name)
    }

    /// Bindings a host seeds into a namespace to enable record classes.
    pub fn ambient() -> [(String, Value); 3] {
        [Builtin::Slots, Builtin::Slot, Builtin::OrderedDict].map(|b| (b.name().to_string(), Value::Builtin(b)))
    }

    pub(crate) fn call(self, interp: &mut Interpreter, args: Vec<Value>, kwargs: Kwargs) -> Result<Value, RuntimeError> {
        if !matches!(self, Builtin::Print | Builtin::Dict | Builtin::OrderedDict | Builtin::Enumerate | Builtin::Sum) {
            if let Some(key) = kwargs.keys().next() {
                return Err(RuntimeError::TypeError(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    self.name(),
                    key
                )));
            }
        }

        match self {
            Builtin::Len => {
                let [value] = exact(self, args)?;
                value.len().map(|n| Value::Int(n as i64)).ok_or_else(|| {
                    RuntimeError::TypeError(format!("object of type '{}' has no len()", value.type_name()))
                })
            }
            Builtin::Tuple => match at_most::<1>(self, args)? {
                [None] => Ok(Value::tuple([])),
                [Some(value)] => Ok(Value::tuple(value.iterate()?)),
            },
            Builtin::List => match at_most::<1>(self, args)? {
                [None] => Ok(Value::list([])),
                [Some(value)] => Ok(Value::list(value.iterate()?)),
            },
            Builtin::Dict | Builtin::OrderedDict => {
                let [source] = at_most::<1>(self, args)?;
                let mut entries = match source {
                    None => IndexMap::new(),
                    Some(Value::Dict(entries)) => {
                        let copy = lock(&entries).clone();
                        copy
                    }
                    Some(pairs) => dict_from_pairs(pairs)?,
                };
                entries.extend(kwargs);
                Ok(Value::dict(entries))
            }
            Builtin::Range => range(args),
            Builtin::Str => match at_most::<1>(self, args)? {
                [None] => Ok(Value::str("")),
                [Some(value)] => Ok(Value::str(value.to_string())),
            },
            Builtin::Repr => {
                let [value] = exact(self, args)?;
                Ok(Value::str(value.repr()))
            }
            Builtin::Print => print(interp, args, kwargs),
            Builtin::Getattr => {
                if args.len() < 2 || args.len() > 3 {
                    return Err(arity_error(self, 3, args.len()));
                }
                let name = args[1].as_str().ok_or_else(|| {
                    RuntimeError::TypeError("getattr(): attribute name must be string".to_string())
                })?;
                match (methods::get_attr(&args[0], name), args.get(2)) {
                    (Err(RuntimeError::AttributeError { .. }), Some(default)) => Ok(default.clone()),
                    (result, _) => result,
                }
            }
            Builtin::Setattr => {
                let [target, name, value] = exact(self, args)?;
                let name = name.as_str().ok_or_else(|| {
                    RuntimeError::TypeError("setattr(): attribute name must be string".to_string())
                })?;
                methods::set_attr(&target, name, value)?;
                Ok(Value::None)
            }
            Builtin::Zip => {
                let columns = args.iter().map(Value::iterate).collect::<Result<Vec<_>, _>>()?;
                let len = columns.iter().map(Vec::len).min().unwrap_or(0);
                let rows = (0..len).map(|i| Value::tuple(columns.iter().map(|c| c[i].clone())));
                Ok(Value::list(rows))
            }
            Builtin::Enumerate => {
                let mut kwargs = kwargs;
                let start = kwargs.shift_remove("start");
                no_keywords(self, &kwargs)?;
                let (iterable, start) = match (args.as_slice(), start.as_ref()) {
                    ([iterable], None) => (iterable, Value::Int(0)),
                    ([iterable, start], None) | ([iterable], Some(start)) => (iterable, start.clone()),
                    _ => return Err(arity_error(self, 2, args.len())),
                };
                let start = start
                    .as_int()
                    .ok_or_else(|| RuntimeError::TypeError("enumerate() start must be an integer".to_string()))?;
                let rows = iterable
                    .iterate()?
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| Value::tuple([Value::Int(start + i as i64), v]));
                Ok(Value::list(rows))
            }
            Builtin::Min => extreme(self, args, Ordering::Less),
            Builtin::Max => extreme(self, args, Ordering::Greater),
            Builtin::Sum => {
                let mut kwargs = kwargs;
                let start = kwargs.shift_remove("start");
                no_keywords(self, &kwargs)?;
                let (iterable, start) = match (args.as_slice(), start.as_ref()) {
                    ([iterable], None) => (iterable, Value::Int(0)),
                    ([iterable, start], None) | ([iterable], Some(start)) => (iterable, start.clone()),
                    _ => return Err(arity_error(self, 2, args.len())),
                };
                iterable
                    .iterate()?
                    .iter()
                    .try_fold(start, |acc, v| operators::binary(BinOp::Add, &acc, v))
            }
            Builtin::Abs => {
                let [value] = exact(self, args)?;
                match value {
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => match other.as_int() {
                        Some(n) => n.checked_abs().map(Value::Int).ok_or(RuntimeError::Overflow("abs")),
                        None => Err(RuntimeError::TypeError(format!(
                            "bad operand type for abs(): '{}'",
                            other.type_name()
                        ))),
                    },
                }
            }
            Builtin::Int => match at_most::<1>(self, args)? {
                [None] => Ok(Value::Int(0)),
                [Some(value)] => to_int(&value),
            },
            Builtin::Slots => Err(RuntimeError::TypeError(
                "_slots is a base class and cannot be instantiated".to_string(),
            )),
            Builtin::Slot => {
                let [index] = exact(self, args)?;
                match index.as_int() {
                    Some(i) if i >= 0 => Ok(Value::Slot(i as usize)),
                    _ => Err(RuntimeError::ValueError(format!(
                        "_slot() index must be a non-negative integer, not {}",
                        index.repr()
                    ))),
                }
            }
        }
    }
}

fn arity_error(builtin: Builtin, expected: usize, got: usize) -> RuntimeError {
    RuntimeError::ArityMismatch {
        callee: builtin.name().to_string(),
        expected,
        got,
    }
}

fn exact<const N: usize>(builtin: Builtin, args: Vec<Value>) -> Result<[Value; N], RuntimeError> {
    let got = args.len();
    args.try_into().map_err(|_| arity_error(builtin, N, got))
}

/// Up to `N` positional arguments, missing ones as `None`.
fn at_most<const N: usize>(builtin: Builtin, args: Vec<Value>) -> Result<[Option<Value>; N], RuntimeError> {
    if args.len() > N {
        return Err(arity_error(builtin, N, args.len()));
    }
    let mut out: [Option<Value>; N] = std::array::from_fn(|_| None);
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = Some(arg);
    }
    Ok(out)
}

fn no_keywords(builtin: Builtin, kwargs: &Kwargs) -> Result<(), RuntimeError> {
    match kwargs.keys().next() {
        Some(key) => Err(RuntimeError::TypeError(format!(
            "{}() got an unexpected keyword argument '{}'",
            builtin.name(),
            key
        ))),
        None => Ok(()),
    }
}

fn dict_from_pairs(pairs: Value) -> Result<IndexMap<String, Value>, RuntimeError> {
    let mut entries = IndexMap::new();
    for pair in pairs.iterate()? {
        match pair.sequence_items().as_deref() {
            Some([Value::Str(key), value]) => {
                entries.insert(key.to_string(), value.clone());
            }
            _ => {
                return Err(RuntimeError::TypeError(
                    "dict() expects (str, value) pairs".to_string(),
                ))
            }
        }
    }
    Ok(entries)
}

fn range(args: Vec<Value>) -> Result<Value, RuntimeError> {
    let ints = args
        .iter()
        .map(|v| {
            v.as_int().ok_or_else(|| {
                RuntimeError::TypeError(format!("'{}' object cannot be interpreted as an integer", v.type_name()))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(arity_error(Builtin::Range, 3, ints.len())),
    };
    if step == 0 {
        return Err(RuntimeError::ValueError("range() arg 3 must not be zero".to_string()));
    }
    Ok(Value::Range(RangeValue { start, stop, step }))
}

fn print(interp: &mut Interpreter, args: Vec<Value>, mut kwargs: Kwargs) -> Result<Value, RuntimeError> {
    let mut text_option = |name: &str, default: &str| -> Result<String, RuntimeError> {
        match kwargs.shift_remove(name) {
            None | Some(Value::None) => Ok(default.to_string()),
            Some(Value::Str(s)) => Ok(s.to_string()),
            Some(other) => Err(RuntimeError::TypeError(format!(
                "{} must be None or a string, not {}",
                name,
                other.type_name()
            ))),
        }
    };
    let sep = text_option("sep", " ")?;
    let end = text_option("end", "\n")?;
    no_keywords(Builtin::Print, &kwargs)?;

    let parts: Vec<String> = args.iter().map(Value::to_string).collect();
    interp.write_output(&format!("{}{}", parts.join(sep.as_str()), end));
    Ok(Value::None)
}

fn extreme(builtin: Builtin, args: Vec<Value>, want: Ordering) -> Result<Value, RuntimeError> {
    let items = match args.len() {
        0 => return Err(arity_error(builtin, 1, 0)),
        1 => args[0].iterate()?,
        _ => args,
    };
    let mut items = items.into_iter();
    let mut best = items
        .next()
        .ok_or_else(|| RuntimeError::ValueError(format!("{}() arg is an empty sequence", builtin.name())))?;
    for item in items {
        let ordering = item.partial_cmp(&best).ok_or_else(|| {
            RuntimeError::TypeError(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                if want == Ordering::Less { "<" } else { ">" },
                item.type_name(),
                best.type_name()
            ))
        })?;
        if ordering == want {
            best = item;
        }
    }
    Ok(best)
}

fn to_int(value: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Float(f) if f.is_finite() && f.abs() < 9.2e18 => Ok(Value::Int(f.trunc() as i64)),
        Value::Float(f) => Err(RuntimeError::ValueError(format!("cannot convert float {} to integer", f))),
        Value::Str(s) => {
            let text = s.trim().replace('_', "");
            text.parse::<i64>().map(Value::Int).map_err(|_| {
                RuntimeError::ValueError(format!("invalid literal for int() with base 10: {}", value.repr()))
            })
        }
        other => other.as_int().map(Value::Int).ok_or_else(|| {
            RuntimeError::TypeError(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(b: Builtin, args: Vec<Value>) -> Result<Value, RuntimeError> {
        b.call(&mut Interpreter::new(), args, Kwargs::new())
    }

    #[test]
    fn record_helpers_are_not_global() {
        assert_eq!(Builtin::lookup("len"), Some(Builtin::Len));
        assert_eq!(Builtin::lookup("_slots"), None);
        assert_eq!(Builtin::lookup("OrderedDict"), None);
        let names: Vec<String> = Builtin::ambient().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["_slots", "_slot", "OrderedDict"]);
    }

    #[test]
    fn conversions() {
        assert_eq!(call(Builtin::Int, vec![Value::str(" 42 ")]).unwrap(), Value::Int(42));
        assert_eq!(call(Builtin::Int, vec![Value::Float(-2.7)]).unwrap(), Value::Int(-2));
        assert!(call(Builtin::Int, vec![Value::str("4x")]).is_err());
        let t = call(Builtin::Tuple, vec![Value::list([Value::Int(1), Value::Int(2)])]).unwrap();
        assert_eq!(t.repr(), "(1, 2)");
        assert_eq!(call(Builtin::Str, vec![Value::Float(1.0)]).unwrap(), Value::str("1.0"));
    }

    #[test]
    fn aggregates() {
        let xs = Value::tuple([Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(call(Builtin::Min, vec![xs.clone()]).unwrap(), Value::Int(1));
        assert_eq!(call(Builtin::Max, vec![Value::Int(4), Value::Int(9)]).unwrap(), Value::Int(9));
        assert_eq!(call(Builtin::Sum, vec![xs.clone()]).unwrap(), Value::Int(6));
        assert!(call(Builtin::Min, vec![Value::tuple([])]).is_err());
        let zipped = call(Builtin::Zip, vec![xs, Value::str("ab")]).unwrap();
        assert_eq!(zipped.repr(), "[(3, 'a'), (1, 'b')]");
    }

    #[test]
    fn arity_is_checked() {
        let err = call(Builtin::Len, vec![]).unwrap_err();
        assert_eq!(err.to_string(), "len() expected 1 argument, got 0");
        assert!(call(Builtin::Range, vec![Value::Int(1), Value::Int(2), Value::Int(0)]).is_err());
    }

    #[test]
    fn slot_accessor_factory() {
        assert!(matches!(call(Builtin::Slot, vec![Value::Int(2)]), Ok(Value::Slot(2))));
        assert!(call(Builtin::Slot, vec![Value::Int(-1)]).is_err());
        assert!(call(Builtin::Slots, vec![]).is_err());
    }
}
