// SPDX-License-Identifier: (MIT OR Apache-2.0)

use std::fmt;

/// One entry of an argument or parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Var {
    Name(String),
    /// `name=default`
    Default(String, String),
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Var::Name(name) => f.write_str(name),
            Var::Default(name, default) => write!(f, "{}={}", name, default),
        }
    }
}

impl From<&str> for Var {
    fn from(name: &str) -> Self {
        Var::Name(name.to_string())
    }
}

impl From<String> for Var {
    fn from(name: String) -> Self {
        Var::Name(name)
    }
}

impl<D: fmt::Display> From<(&str, D)> for Var {
    fn from((name, default): (&str, D)) -> Self {
        Var::Default(name.to_string(), default.to_string())
    }
}

pub(crate) fn format_list(vars: &[Var], args: Option<&str>, kwargs: Option<&str>) -> String {
    let mut parts: Vec<String> = vars.iter().map(Var::to_string).collect();
    parts.extend(args.map(str::to_string));
    parts.extend(kwargs.map(str::to_string));
    parts.join(", ")
}
