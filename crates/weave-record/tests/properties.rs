// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Property tests: generated types agree with their field lists.

use indexmap::IndexMap;
use proptest::prelude::*;
use weave_interp::{Kwargs, Value};
use weave_lexer::is_keyword;
use weave_record::{define, DefineOptions, FieldNames, RecordError};

/// A lowercase identifier that is not a reserved word.
fn arb_field() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_filter("reserved word", |s| !is_keyword(s))
}

/// Distinct field names in a random order.
fn arb_fields() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(arb_field(), 0..8).prop_map(|set| set.into_iter().collect())
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-z ]{0,8}".prop_map(Value::str),
        Just(Value::None),
    ]
}

proptest! {
    /// A defined type exposes exactly the requested fields and arity.
    #[test]
    fn fields_and_arity_match(fields in arb_fields()) {
        let ty = define("Rec", FieldNames::from(fields.clone()), &DefineOptions::default()).unwrap();
        prop_assert_eq!(ty.fields(), fields.as_slice());
        prop_assert_eq!(ty.arity(), fields.len());

        let too_many = vec![Value::None; fields.len() + 1];
        let is_validation = matches!(ty.make(too_many), Err(RecordError::Validation(_)));
        prop_assert!(is_validation);
    }

    /// `_make(tuple(p)) == p` and `T(**p._asdict()) == p`.
    #[test]
    fn round_trips(
        fields in arb_fields(),
        pool in prop::collection::vec(arb_value(), 8),
    ) {
        let ty = define("Rec", FieldNames::from(fields.clone()), &DefineOptions::default()).unwrap();
        let values: Vec<Value> = pool.into_iter().take(fields.len()).collect();
        let p = ty.make(values.clone()).unwrap();

        let remade = ty.make(p.to_vec()).unwrap();
        prop_assert_eq!(Value::from(remade), Value::from(p.clone()));

        let kwargs: Kwargs = p.as_dict();
        let rebuilt = ty.call(Vec::new(), kwargs).unwrap();
        prop_assert_eq!(Value::from(rebuilt), Value::tuple(values));
    }

    /// `_replace()` with no updates leaves the record as it was.
    #[test]
    fn empty_replace_is_identity(
        fields in arb_fields(),
        pool in prop::collection::vec(arb_value(), 8),
    ) {
        let ty = define("Rec", FieldNames::from(fields.clone()), &DefineOptions::default()).unwrap();
        let p = ty.make(pool.into_iter().take(fields.len())).unwrap();
        let before = p.to_vec();
        p.replace(IndexMap::new()).unwrap();
        prop_assert_eq!(p.to_vec(), before);
    }

    /// With `rename`, a repeated name at position `i` becomes `_i`.
    #[test]
    fn rename_repeated_name(fields in arb_fields(), extra in 0usize..8) {
        prop_assume!(!fields.is_empty());
        let mut names = fields.clone();
        let repeated = names[extra % fields.len()].clone();
        names.push(repeated);
        let options = DefineOptions { rename: true, ..DefineOptions::default() };
        let ty = define("Rec", FieldNames::from(names.clone()), &options).unwrap();
        let last = names.len() - 1;
        prop_assert_eq!(ty.fields()[last].clone(), format!("_{}", last));

        let strict = define("Rec", FieldNames::from(names), &DefineOptions::default());
        prop_assert!(matches!(strict, Err(RecordError::Validation(_))));
    }
}
