// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `str % args` formatting.

use crate::value::Value;

use super::RuntimeError;

/// Apply `%r`, `%s`, `%d`/`%i` and `%%` conversions. A tuple supplies one
/// argument per conversion; anything else is a single argument.
pub(crate) fn percent_format(template: &str, args: &Value) -> Result<String, RuntimeError> {
    let args = match args {
        Value::Tuple(items) => items.to_vec(),
        other => vec![other.clone()],
    };
    let mut args = args.into_iter();
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        let conversion = chars
            .next()
            .ok_or_else(|| RuntimeError::ValueError("incomplete format".to_string()))?;
        if conversion == '%' {
            result.push('%');
            continue;
        }
        let value = args
            .next()
            .ok_or_else(|| RuntimeError::TypeError("not enough arguments for format string".to_string()))?;
        match conversion {
            'r' => result.push_str(&value.repr()),
            's' => result.push_str(&value.to_string()),
            'd' | 'i' => result.push_str(&integer_text(&value)?),
            other => {
                return Err(RuntimeError::ValueError(format!(
                    "unsupported format character '{}'",
                    other
                )))
            }
        }
    }

    if args.next().is_some() {
        return Err(RuntimeError::TypeError(
            "not all arguments converted during string formatting".to_string(),
        ));
    }
    Ok(result)
}

fn integer_text(value: &Value) -> Result<String, RuntimeError> {
    match value {
        Value::Int(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok((*b as i64).to_string()),
        Value::Float(f) => Ok((f.trunc() as i64).to_string()),
        other => Err(RuntimeError::TypeError(format!(
            "%d format: a number is required, not {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let args = Value::tuple([Value::str("a"), Value::str("b"), Value::Float(2.9)]);
        assert_eq!(percent_format("%s/%r/%d %%", &args).unwrap(), "a/'b'/2 %");
        assert_eq!(percent_format("(%r)", &Value::Int(5)).unwrap(), "(5)");
        assert_eq!(percent_format("()", &Value::tuple([])).unwrap(), "()");
    }

    #[test]
    fn argument_count_must_match() {
        assert!(percent_format("%r %r", &Value::tuple([Value::Int(1)])).is_err());
        assert!(percent_format("%r", &Value::tuple([Value::Int(1), Value::Int(2)])).is_err());
        assert!(percent_format("%q", &Value::Int(1)).is_err());
    }
}
