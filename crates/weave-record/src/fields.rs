// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Field name normalization and validation.

use weave_lexer::{is_identifier, is_keyword};

use crate::error::RecordError;

/// Field names as given: one string separated by commas or whitespace, or
/// an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNames {
    Text(String),
    List(Vec<String>),
}

impl FieldNames {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            FieldNames::Text(text) => text.replace(',', " ").split_whitespace().map(str::to_string).collect(),
            FieldNames::List(names) => names,
        }
    }
}

impl From<&str> for FieldNames {
    fn from(text: &str) -> Self {
        FieldNames::Text(text.to_string())
    }
}

impl From<String> for FieldNames {
    fn from(text: String) -> Self {
        FieldNames::Text(text)
    }
}

impl From<Vec<String>> for FieldNames {
    fn from(names: Vec<String>) -> Self {
        FieldNames::List(names)
    }
}

impl From<&[&str]> for FieldNames {
    fn from(names: &[&str]) -> Self {
        FieldNames::List(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldNames {
    fn from(names: [&str; N]) -> Self {
        FieldNames::List(names.iter().map(|s| s.to_string()).collect())
    }
}

fn is_valid_field(name: &str) -> bool {
    is_identifier(name) && !is_keyword(name) && !name.starts_with('_')
}

/// Replace every invalid or repeated name by `_<index>`.
pub(crate) fn rename(names: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let renamed = if is_valid_field(&name) && !seen.contains(&name) {
                name.clone()
            } else {
                format!("_{}", index)
            };
            seen.push(name);
            renamed
        })
        .collect()
}

/// Check the type name and fields. `renamed` permits the `_<index>` names
/// produced by [`rename`].
pub(crate) fn validate(type_name: &str, fields: &[String], renamed: bool) -> Result<(), RecordError> {
    for name in std::iter::once(type_name).chain(fields.iter().map(String::as_str)) {
        if !is_identifier(name) {
            return Err(RecordError::Validation(format!(
                "type names and field names must be valid identifiers: '{}'",
                name
            )));
        }
        if is_keyword(name) {
            return Err(RecordError::Validation(format!(
                "type names and field names cannot be a keyword: '{}'",
                name
            )));
        }
    }

    let mut seen: Vec<&str> = Vec::with_capacity(fields.len());
    for name in fields {
        if name.starts_with('_') && !renamed {
            return Err(RecordError::Validation(format!(
                "field names cannot start with an underscore: '{}'",
                name
            )));
        }
        if seen.contains(&name.as_str()) {
            return Err(RecordError::Validation(format!("encountered duplicate field name: '{}'", name)));
        }
        seen.push(name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn text_is_split_on_commas_and_spaces() {
        assert_eq!(FieldNames::from("x, y  z,w").into_vec(), ["x", "y", "z", "w"]);
        assert!(FieldNames::from("").into_vec().is_empty());
        assert_eq!(FieldNames::from(["a", "b"]).into_vec(), ["a", "b"]);
    }

    #[test]
    fn rename_replaces_by_position() {
        let names = strings(&["abc", "def", "ghi", "abc", "_x", "9z", "ok"]);
        assert_eq!(rename(names), ["abc", "_1", "ghi", "_3", "_4", "_5", "ok"]);
    }

    #[test]
    fn validation_messages() {
        let err = validate("P", &strings(&["x", "x"]), false).unwrap_err();
        assert_eq!(err.to_string(), "encountered duplicate field name: 'x'");
        let err = validate("P", &strings(&["_x"]), false).unwrap_err();
        assert!(err.to_string().contains("underscore"));
        let err = validate("my-type", &[], false).unwrap_err();
        assert!(err.to_string().contains("valid identifiers: 'my-type'"));
        let err = validate("P", &strings(&["x", "class"]), false).unwrap_err();
        assert!(err.to_string().contains("keyword: 'class'"));
        assert!(validate("P", &strings(&["x", "_1"]), true).is_ok());
    }
}
