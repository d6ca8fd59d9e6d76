// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Binary, unary and comparison operators.

use std::cmp::Ordering;

use weave_ast::expr::{BinOp, CmpOp, UnaryOp};

use crate::value::{lock, Value};

use super::format::percent_format;
use super::RuntimeError;

pub(crate) fn binary(op: BinOp, l: &Value, r: &Value) -> Result<Value, RuntimeError> {
    if let (Some(a), Some(b)) = (int_operand(l), int_operand(r)) {
        return int_binary(op, a, b);
    }
    if let (Some(a), Some(b)) = (float_operand(l), float_operand(r)) {
        return float_binary(op, a, b);
    }

    match (op, l, r) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{}{}", a, b))),
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => Ok(Value::tuple(a.iter().chain(b.iter()).cloned())),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = lock(a).clone();
            items.extend(lock(b).iter().cloned());
            Ok(Value::list(items))
        }
        (BinOp::Mul, seq, Value::Int(n)) | (BinOp::Mul, Value::Int(n), seq) if repeatable(seq) => repeat(seq, *n),
        (BinOp::Mod, Value::Str(fmt), args) => Ok(Value::str(percent_format(fmt, args)?)),
        _ => Err(unsupported(op.symbol(), l, r)),
    }
}

fn int_operand(v: &Value) -> Option<i64> {
    match v {
        Value::Int(n) => Some(*n),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

fn float_operand(v: &Value) -> Option<f64> {
    match v {
        Value::Float(f) => Some(*f),
        other => int_operand(other).map(|n| n as f64),
    }
}

fn int_binary(op: BinOp, a: i64, b: i64) -> Result<Value, RuntimeError> {
    let result = match op {
        BinOp::Add => a.checked_add(b).ok_or(RuntimeError::Overflow("addition"))?,
        BinOp::Sub => a.checked_sub(b).ok_or(RuntimeError::Overflow("subtraction"))?,
        BinOp::Mul => a.checked_mul(b).ok_or(RuntimeError::Overflow("multiplication"))?,
        BinOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            let q = a.checked_div(b).ok_or(RuntimeError::Overflow("division"))?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            // sign follows the divisor
            let m = a.checked_rem(b).ok_or(RuntimeError::Overflow("modulo"))?;
            if m != 0 && ((m < 0) != (b < 0)) {
                m + b
            } else {
                m
            }
        }
        BinOp::Pow => {
            if b < 0 {
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exp = u32::try_from(b).map_err(|_| RuntimeError::Overflow("exponentiation"))?;
            a.checked_pow(exp).ok_or(RuntimeError::Overflow("exponentiation"))?
        }
        BinOp::BitAnd => a & b,
        BinOp::BitOr => a | b,
        BinOp::BitXor => a ^ b,
        BinOp::Shl => {
            if b < 0 {
                return Err(RuntimeError::ValueError("negative shift count".to_string()));
            }
            let shifted = if b >= 64 { None } else { a.checked_shl(b as u32) };
            match shifted {
                Some(v) if v >> b == a => v,
                _ if a == 0 => 0,
                _ => return Err(RuntimeError::Overflow("left shift")),
            }
        }
        BinOp::Shr => {
            if b < 0 {
                return Err(RuntimeError::ValueError("negative shift count".to_string()));
            }
            a >> b.min(63)
        }
    };
    Ok(Value::Int(result))
}

fn float_binary(op: BinOp, a: f64, b: f64) -> Result<Value, RuntimeError> {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div | BinOp::FloorDiv | BinOp::Mod if b == 0.0 => return Err(RuntimeError::DivisionByZero),
        BinOp::Div => a / b,
        BinOp::FloorDiv => (a / b).floor(),
        BinOp::Mod => a - b * (a / b).floor(),
        BinOp::Pow => a.powf(b),
        _ => {
            return Err(unsupported(op.symbol(), &Value::Float(a), &Value::Float(b)));
        }
    };
    Ok(Value::Float(result))
}

fn repeatable(v: &Value) -> bool {
    matches!(v, Value::Str(_) | Value::Tuple(_) | Value::List(_))
}

/// Largest sequence, in items or bytes, that `*` will build.
const MAX_REPEAT_LEN: usize = 1 << 28;

fn repeat(seq: &Value, n: i64) -> Result<Value, RuntimeError> {
    let count = usize::try_from(n.max(0)).map_err(|_| RuntimeError::Overflow("repetition"))?;
    let checked = |len: usize| {
        len.checked_mul(count)
            .filter(|total| *total <= MAX_REPEAT_LEN)
            .ok_or(RuntimeError::Overflow("repetition"))
    };
    match seq {
        Value::Str(s) => {
            checked(s.len())?;
            Ok(Value::str(s.repeat(count)))
        }
        Value::Tuple(items) => {
            let total = checked(items.len())?;
            Ok(Value::tuple(items.iter().cycle().take(total).cloned()))
        }
        Value::List(items) => {
            let items = lock(items).clone();
            let total = checked(items.len())?;
            Ok(Value::list(items.into_iter().cycle().take(total)))
        }
        other => Err(unsupported("*", other, &Value::Int(n))),
    }
}

fn unsupported(symbol: &str, l: &Value, r: &Value) -> RuntimeError {
    RuntimeError::TypeError(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        symbol,
        l.type_name(),
        r.type_name()
    ))
}

pub(crate) fn unary(op: UnaryOp, v: &Value) -> Result<Value, RuntimeError> {
    match (op, v) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Float(f)) => Ok(Value::Float(*f)),
        (op, v) => {
            let n = int_operand(v).ok_or_else(|| {
                RuntimeError::TypeError(format!("bad operand type for unary operator: '{}'", v.type_name()))
            })?;
            match op {
                UnaryOp::Neg => n.checked_neg().map(Value::Int).ok_or(RuntimeError::Overflow("negation")),
                UnaryOp::BitNot => Ok(Value::Int(!n)),
                _ => Ok(Value::Int(n)),
            }
        }
    }
}

pub(crate) fn compare(op: CmpOp, l: &Value, r: &Value) -> Result<bool, RuntimeError> {
    match op {
        CmpOp::Eq => Ok(l == r),
        CmpOp::Ne => Ok(l != r),
        CmpOp::Is => Ok(l.is_same(r)),
        CmpOp::IsNot => Ok(!l.is_same(r)),
        CmpOp::In => contains(r, l),
        CmpOp::NotIn => contains(r, l).map(|found| !found),
        CmpOp::Lt | CmpOp::Gt | CmpOp::Le | CmpOp::Ge => {
            let ordering = l.partial_cmp(r).ok_or_else(|| {
                RuntimeError::TypeError(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    l.type_name(),
                    r.type_name()
                ))
            })?;
            Ok(match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::Gt => ordering == Ordering::Greater,
                CmpOp::Le => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, RuntimeError> {
    match (container, item) {
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(&**needle)),
        (Value::Str(_), other) => Err(RuntimeError::TypeError(format!(
            "'in <string>' requires string as left operand, not {}",
            other.type_name()
        ))),
        (Value::Dict(entries), Value::Str(key)) => Ok(lock(entries).contains_key(&**key)),
        (Value::Dict(_), _) => Ok(false),
        (Value::Range(range), item) => Ok(match int_operand(item) {
            Some(n) => {
                let offset = n - range.start;
                let in_bounds = if range.step > 0 {
                    n >= range.start && n < range.stop
                } else {
                    n <= range.start && n > range.stop
                };
                in_bounds && offset % range.step == 0
            }
            None => false,
        }),
        (container, item) => match container.sequence_items() {
            Some(items) => Ok(items.iter().any(|v| v == item)),
            None => Err(RuntimeError::TypeError(format!(
                "argument of type '{}' is not iterable",
                container.type_name()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_and_modulo_follow_the_divisor() {
        assert_eq!(binary(BinOp::FloorDiv, &Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(-4));
        assert_eq!(binary(BinOp::Mod, &Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(1));
        assert_eq!(binary(BinOp::Mod, &Value::Float(-1.0), &Value::Int(3)).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn overflow_and_shifts() {
        assert!(matches!(
            binary(BinOp::Mul, &Value::Int(i64::MAX), &Value::Int(2)),
            Err(RuntimeError::Overflow("multiplication"))
        ));
        assert!(binary(BinOp::Pow, &Value::Int(10), &Value::Int(30)).is_err());
        assert_eq!(binary(BinOp::Shl, &Value::Int(1), &Value::Int(4)).unwrap(), Value::Int(16));
        assert!(binary(BinOp::Shl, &Value::Int(1), &Value::Int(64)).is_err());
        assert!(matches!(unary(UnaryOp::Neg, &Value::Int(i64::MIN)), Err(RuntimeError::Overflow(_))));
    }

    #[test]
    fn sequences() {
        let t = Value::tuple([Value::Int(1)]);
        assert_eq!(binary(BinOp::Mul, &t, &Value::Int(3)).unwrap().repr(), "(1, 1, 1)");
        assert_eq!(binary(BinOp::Add, &t, &t).unwrap().repr(), "(1, 1)");
        assert!(compare(CmpOp::In, &Value::Int(1), &t).unwrap());
        assert!(compare(CmpOp::NotIn, &Value::str("z"), &Value::str("abc")).unwrap());
    }

    #[test]
    fn huge_repetition_is_an_overflow_error() {
        for seq in [Value::str("ab"), Value::tuple([Value::Int(1), Value::Int(2)]), Value::list([Value::None])] {
            assert!(matches!(
                binary(BinOp::Mul, &seq, &Value::Int(i64::MAX)),
                Err(RuntimeError::Overflow("repetition"))
            ));
        }
        assert_eq!(binary(BinOp::Mul, &Value::str("ab"), &Value::Int(-3)).unwrap(), Value::str(""));
        assert_eq!(binary(BinOp::Mul, &Value::tuple([]), &Value::Int(i64::MAX)).unwrap(), Value::tuple([]));
    }

    #[test]
    fn ordering_errors_name_both_types() {
        let err = compare(CmpOp::Lt, &Value::Int(1), &Value::str("a")).unwrap_err();
        assert_eq!(err.to_string(), "'<' not supported between instances of 'int' and 'str'");
    }

    #[test]
    fn range_membership() {
        let r = Value::Range(crate::value::RangeValue { start: 0, stop: 10, step: 3 });
        assert!(compare(CmpOp::In, &Value::Int(9), &r).unwrap());
        assert!(!compare(CmpOp::In, &Value::Int(4), &r).unwrap());
    }
}
