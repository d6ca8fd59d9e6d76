// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! End-to-end specialization through the `unroll` decorator.

use indexmap::IndexMap;
use weave_interp::{compile_unit, execute, Interpreter, Kwargs, Namespace, RuntimeError, Value};
use weave_unroll::{install, SpecializeError, TransformError, Unroll};

fn run(ns: &Namespace, src: &str) -> Result<(), RuntimeError> {
    let unit = compile_unit(src, "script.wv").unwrap();
    execute(&unit, ns, None)
}

fn scripted(src: &str) -> Namespace {
    let ns = Namespace::new();
    install(&ns);
    run(&ns, src).unwrap();
    ns
}

fn call(ns: &Namespace, name: &str, args: Vec<Value>) -> Value {
    weave_interp::call(&ns.get(name).unwrap(), args, Kwargs::new()).unwrap()
}

const SUM_WEIGHTED: &str = "\
weights = [1, 10, 100]

@unroll(ws=weights)
def weighted(xs):
    total = 0
    i = 0
    for w in ws:
        total += w * xs[i]
        i += 1
    return total
";

#[test]
fn decorated_function_computes_the_same_result() {
    let ns = scripted(SUM_WEIGHTED);
    let xs = Value::tuple([Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(call(&ns, "weighted", vec![xs]), Value::Int(321));
}

#[test]
fn decorated_function_has_no_loop_left() {
    let ns = scripted(SUM_WEIGHTED);
    let Some(Value::Function(f)) = ns.get("weighted") else { panic!() };
    assert_eq!(f.closure.get("ws"), Some(&Value::tuple([Value::Int(1), Value::Int(10), Value::Int(100)])));
    let has_for = f
        .def
        .body
        .iter()
        .any(|s| matches!(s.kind, weave_ast::stmt::StmtKind::For { .. }));
    assert!(!has_for);
}

#[test]
fn changing_the_global_later_does_not_affect_the_specialization() {
    let ns = scripted(SUM_WEIGHTED);
    run(&ns, "weights.append(1000)\n").unwrap();
    let xs = Value::tuple([Value::Int(1), Value::Int(1), Value::Int(1)]);
    assert_eq!(call(&ns, "weighted", vec![xs]), Value::Int(111));
}

#[test]
fn applied_from_rust() {
    let ns = Namespace::new();
    run(&ns, "def join(sep):\n    out = ''\n    for p in parts:\n        out = out + p + sep\n    return out\n").unwrap();
    let mut names = IndexMap::new();
    names.insert("parts".to_string(), Value::list([Value::str("a"), Value::str("b")]));
    let joined = Unroll::new(names).apply(&ns.get("join").unwrap()).unwrap();
    let out = weave_interp::call(&joined, vec![Value::str("-")], Kwargs::new()).unwrap();
    assert_eq!(out, Value::str("a-b-"));
}

#[test]
fn transform_errors_surface_through_the_decorator() {
    let ns = Namespace::new();
    install(&ns);
    let err = run(&ns, "@unroll(xs=(1, 2))\ndef f():\n    for x in xs:\n        break\n").unwrap_err();
    let RuntimeError::Native { name, message } = err.root() else { panic!("{err}") };
    assert_eq!(name, "unroll");
    assert!(message.contains("'break' would leave the unrolled loop over 'xs'"), "{message}");

    let ns = Namespace::new();
    run(&ns, "def f():\n    for x in n:\n        pass\n").unwrap();
    let mut names = IndexMap::new();
    names.insert("n".to_string(), Value::Int(3));
    let err = Unroll::new(names).apply(&ns.get("f").unwrap()).unwrap_err();
    assert!(matches!(err, SpecializeError::Transform(TransformError::Unsized { .. })));
}

#[test]
fn print_inside_the_factory_goes_to_the_callers_interpreter() {
    let ns = Namespace::new();
    install(&ns);
    let (mut interp, output) = Interpreter::with_captured_output();
    let unit = compile_unit(
        "@unroll(xs=(1, 2))\ndef show():\n    for x in xs:\n        print(x)\nshow()\n",
        "print.wv",
    )
    .unwrap();
    interp.execute(&unit, &ns, None).unwrap();
    assert_eq!(output.lock().unwrap().as_str(), "1\n2\n");
}

#[test]
fn strings_unroll_per_character() {
    let ns = Namespace::new();
    run(&ns, "def spell():\n    out = []\n    for c in s:\n        out.append(c)\n    return out\n").unwrap();
    let mut names = IndexMap::new();
    names.insert("s".to_string(), Value::str("ab"));
    let spell = Unroll::new(names).apply(&ns.get("spell").unwrap()).unwrap();
    let out = weave_interp::call(&spell, vec![], Kwargs::new()).unwrap();
    assert_eq!(out, Value::list([Value::str("a"), Value::str("b")]));
}

#[test]
fn redecorating_with_the_control_name_is_identity() {
    let ns = scripted("@unroll(k=3, unroll=5)\ndef triple(x):\n    return x * k\n");
    assert_eq!(call(&ns, "triple", vec![Value::Int(2)]), Value::Int(6));

    let ns = Namespace::new();
    run(&ns, "def f(x):\n    return x + k\n").unwrap();
    let mut names = IndexMap::new();
    names.insert("unroll".to_string(), Value::str("mine"));
    names.insert("k".to_string(), Value::Int(1));
    let f = Unroll::new(names).apply(&ns.get("f").unwrap()).unwrap();
    let Value::Function(function) = &f else { panic!() };
    assert!(matches!(function.closure.get("unroll"), None | Some(Value::Native(_))));
    assert_eq!(weave_interp::call(&f, vec![Value::Int(1)], Kwargs::new()).unwrap(), Value::Int(2));
}
