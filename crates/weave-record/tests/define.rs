// SPDX-License-Identifier: (MIT OR Apache-2.0)

use serde::de::DeserializeSeed;
use weave_interp::{compile_unit, execute, Kwargs, Namespace, Value};
use weave_record::{define, DefineOptions, FieldNames, RecordError};

fn opts() -> DefineOptions {
    DefineOptions::default()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

/// Bind `ty` as `T` and evaluate `expr` in that namespace.
fn eval(ty: &weave_record::RecordClass, setup: &str, expr: &str) -> Value {
    let ns = Namespace::new();
    ns.set("T", ty.to_value());
    let src = format!("{}__result = {}\n", setup, expr);
    let unit = compile_unit(src.as_str(), "<test>").unwrap();
    execute(&unit, &ns, None).unwrap();
    ns.get("__result").unwrap()
}

#[test]
fn point_basics() {
    let point = define("Point", "x y", &opts()).unwrap();
    assert_eq!(point.name(), "Point");
    assert_eq!(point.fields(), ["x", "y"]);
    assert_eq!(point.doc(), Some("Point(x, y)"));

    let mut kwargs = Kwargs::new();
    kwargs.insert("y".to_string(), Value::Int(22));
    let p = point.call(ints(&[11]), kwargs).unwrap();
    let q = point.make(ints(&[11, 22])).unwrap();
    assert_eq!(Value::from(p.clone()), Value::from(q));
    assert_eq!(p.repr(), "Point(x=11, y=22)");
    assert_eq!(p.as_dict().keys().collect::<Vec<_>>(), ["x", "y"]);
}

#[test]
fn script_view_of_the_type() {
    let point = define("Point", "x, y", &opts()).unwrap();
    assert_eq!(eval(&point, "", "T(11, 22) == T(x=11, y=22)"), Value::Bool(true));
    assert_eq!(eval(&point, "", "T(1, 2)[0] + T(1, 2)[1]"), Value::Int(3));
    assert_eq!(eval(&point, "p = T(1, 2)\nx, y = p\n", "(y, x)"), Value::tuple(ints(&[2, 1])));
    assert_eq!(eval(&point, "", "T.__name__"), Value::str("Point"));
    assert_eq!(eval(&point, "", "T(1, 2)._fields"), Value::tuple([Value::str("x"), Value::str("y")]));
    assert!(eval(&point, "", "T._source").as_str().is_some_and(|s| s.starts_with("class Point(_slots):")));
}

#[test]
fn replace_mutates_in_place() {
    let point = define("Point", "x y", &opts()).unwrap();
    let result = eval(&point, "p = T(1, 2)\nq = p._replace(x=100)\n", "(q is p, p.x, p._replace() is p)");
    assert_eq!(result, Value::tuple([Value::Bool(true), Value::Int(100), Value::Bool(true)]));
}

#[test]
fn wrong_arity_is_a_validation_error() {
    let point = define("Point", "x y", &opts()).unwrap();
    let err = point.call(ints(&[1]), Kwargs::new()).unwrap_err();
    assert!(matches!(err, RecordError::Validation(_)));
    assert_eq!(err.to_string(), "Point() expected 2 arguments, got 1");

    let err = point.make(ints(&[1, 2, 3])).unwrap_err();
    assert_eq!(err.to_string(), "Point() expected 2 arguments, got 3");

    let mut kwargs = Kwargs::new();
    kwargs.insert("z".to_string(), Value::Int(1));
    assert!(matches!(point.call(ints(&[1]), kwargs), Err(RecordError::Validation(_))));
}

#[test]
fn empty_record() {
    let zero = define("Zero", "", &opts()).unwrap();
    assert_eq!(eval(&zero, "", "T() == ()"), Value::Bool(true));
    assert_eq!(eval(&zero, "", "T()._fields"), Value::tuple([]));
    assert_eq!(eval(&zero, "", "repr(T())"), Value::str("Zero()"));
}

#[test]
fn invalid_names_without_rename() {
    for (ty, fields) in [("P", "x x"), ("P", "x _y"), ("P", "x for"), ("9P", "x"), ("P", "x-y")] {
        let err = define(ty, fields, &opts()).unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)), "{ty} {fields}: {err}");
    }
}

#[test]
fn rename_replaces_bad_names() {
    let options = DefineOptions { rename: true, ..opts() };
    let ty = define("P", FieldNames::from(["a", "a", "class", "_b", "c"]), &options).unwrap();
    assert_eq!(ty.fields(), ["a", "_1", "_2", "_3", "c"]);
    assert_eq!(eval(&ty, "", "T(1, 2, 3, 4, 5)._2"), Value::Int(3));
}

#[test]
fn serializes_as_a_bare_sequence() {
    let point = define("Point", "x y", &opts()).unwrap();
    let p = point.make([Value::Int(1), Value::str("a")]).unwrap();
    assert_eq!(serde_json::to_string(&p).unwrap(), r#"[1,"a"]"#);

    let mut de = serde_json::Deserializer::from_str("[5, 6]");
    let q = point.seed().deserialize(&mut de).unwrap();
    assert_eq!(q.get("x"), Some(Value::Int(5)));
}

#[test]
fn generated_types_cross_threads() {
    let point = define("Point", "x y", &opts()).unwrap();
    let handle = std::thread::spawn(move || point.make(ints(&[1, 2])).map(|p| p.repr()));
    assert_eq!(handle.join().unwrap().unwrap(), "Point(x=1, y=2)");
}
