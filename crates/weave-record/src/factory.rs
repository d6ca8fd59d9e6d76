// SPDX-License-Identifier: (MIT OR Apache-2.0)

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use weave_codegen::{subs, Code, EmitterConfig, Subs};
use weave_interp::{compile_unit, execute, Builtin, Kwargs, Namespace, Record, RecordSeed, RecordType, Value};

use crate::error::RecordError;
use crate::fields::{rename, validate, FieldNames};

#[derive(Debug, Clone)]
pub struct DefineOptions {
    /// Print the generated class source to stdout.
    pub verbose: bool,
    /// Replace invalid or repeated field names with `_<index>` instead of failing.
    pub rename: bool,
    /// Keep the generated source on the type (`source()`, `_source`).
    pub keep_source: bool,
}

impl Default for DefineOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            rename: false,
            keep_source: true,
        }
    }
}

const CLASS_TEMPLATE: &str = "
class {typename}(_slots):
    '{typename}({arg_list})'
    _fields = {field_names}
    _arity = {num_fields}
    _repr_fmt = '({repr_fmt})'
    _mapping = OrderedDict
";

const FIELD_TEMPLATE: &str = "{name} = _slot({index})";

/// Create a new record type named `type_name` with the given fields.
///
/// Every call compiles a fresh class, so two calls with identical
/// arguments produce distinct types.
pub fn define(
    type_name: &str,
    field_names: impl Into<FieldNames>,
    options: &DefineOptions,
) -> Result<RecordClass, RecordError> {
    let mut fields = field_names.into().into_vec();
    if options.rename {
        fields = rename(fields);
    }
    validate(type_name, &fields, options.rename)?;

    let source = render(type_name, &fields)?;
    let label = format!("<record {}>", type_name);
    let unit = compile_unit(source.as_str(), &label)?;
    let namespace: Namespace = Builtin::ambient().into_iter().collect();
    execute(&unit, &namespace, None)?;

    let ty = match namespace.get(type_name) {
        Some(Value::RecordType(ty)) => ty,
        _ => {
            return Err(RecordError::Validation(format!(
                "generated source did not define '{}'",
                type_name
            )))
        }
    };
    debug!(type_name, fields = fields.len(), "defined record type");

    if options.verbose {
        println!("{}", source);
    }
    if options.keep_source {
        ty.set_source(source);
    }
    Ok(RecordClass { ty })
}

fn render(type_name: &str, fields: &[String]) -> Result<String, RecordError> {
    let field_names = Value::tuple(fields.iter().map(|f| Value::str(f.as_str()))).repr();
    let repr_fmt: Vec<String> = fields.iter().map(|f| format!("{}=%r", f)).collect();
    let vars = subs! {
        typename = type_name,
        arg_list = fields.join(", "),
        field_names = field_names,
        num_fields = fields.len(),
        repr_fmt = repr_fmt.join(", "),
    };

    let mut code = Code::with_config(EmitterConfig {
        label: format!("<record {}>", type_name),
        ..EmitterConfig::default()
    });
    code.ww(CLASS_TEMPLATE, &vars)?;
    if !fields.is_empty() {
        code.block(None, &Subs::new(), |s| {
            for (index, name) in fields.iter().enumerate() {
                s.w(&[FIELD_TEMPLATE], &subs! { name = name, index = index })?;
            }
            Ok::<_, RecordError>(())
        })?;
    }
    Ok(code.build())
}

/// A record type produced by [`define`].
#[derive(Clone)]
pub struct RecordClass {
    ty: Arc<RecordType>,
}

impl RecordClass {
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    pub fn fields(&self) -> &[String] {
        self.ty.fields()
    }

    pub fn arity(&self) -> usize {
        self.ty.arity()
    }

    pub fn doc(&self) -> Option<&str> {
        self.ty.doc()
    }

    /// The generated class source, when kept.
    pub fn source(&self) -> Option<&str> {
        self.ty.source()
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// The type as a script value, for binding into a namespace.
    pub fn to_value(&self) -> Value {
        Value::RecordType(self.ty.clone())
    }

    /// Construct an instance from positional and keyword arguments.
    pub fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Record, RecordError> {
        self.ty.instantiate(args, kwargs).map_err(RecordError::from_construction)
    }

    /// `_make`: construct from exactly `arity` values.
    pub fn make(&self, values: impl IntoIterator<Item = Value>) -> Result<Record, RecordError> {
        self.ty
            .make(values.into_iter().collect())
            .map_err(RecordError::from_construction)
    }

    /// Deserialize an instance from a bare sequence.
    pub fn seed(&self) -> RecordSeed {
        self.ty.seed()
    }

    /// Whether both handles refer to the same generated type.
    pub fn ptr_eq(&self, other: &RecordClass) -> bool {
        Arc::ptr_eq(&self.ty, &other.ty)
    }
}

impl fmt::Debug for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordClass")
            .field("name", &self.name())
            .field("fields", &self.fields())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_source() {
        let point = define("Point", "x y", &DefineOptions::default()).unwrap();
        assert_eq!(
            point.source().unwrap(),
            "class Point(_slots):\n    'Point(x, y)'\n    _fields = ('x', 'y')\n    _arity = 2\n    \
             _repr_fmt = '(x=%r, y=%r)'\n    _mapping = OrderedDict\n    x = _slot(0)\n    y = _slot(1)"
        );
    }

    #[test]
    fn single_and_empty_field_lists() {
        let one = define("One", "a", &DefineOptions::default()).unwrap();
        assert!(one.source().unwrap().contains("_fields = ('a',)"));
        let zero = define("Zero", "", &DefineOptions::default()).unwrap();
        assert!(zero.source().unwrap().ends_with("_mapping = OrderedDict"));
        assert_eq!(zero.arity(), 0);
    }

    #[test]
    fn source_can_be_dropped() {
        let options = DefineOptions { keep_source: false, ..DefineOptions::default() };
        assert!(define("P", "x", &options).unwrap().source().is_none());
    }

    #[test]
    fn every_call_makes_a_new_type() {
        let a = define("P", "x", &DefineOptions::default()).unwrap();
        let b = define("P", "x", &DefineOptions::default()).unwrap();
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }
}
