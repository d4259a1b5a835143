//! Property tests: decode followed by encode reproduces the input with
//! defaults filled, and decode is atomic.

mod common;

use common::{ListForm, TestForm};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

use formwork_schema::FormType;

fn test_form_input() -> impl Strategy<Value = (i64, String, Option<String>)> {
    (0i64..1_000_000, "[a-zA-Z0-9 ]{0,16}", proptest::option::of("[a-z]{0,8}"))
}

fn build(index: Value, name: &str, optional: Option<&str>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("index".into(), index);
    map.insert("name".into(), json!(name));
    if let Some(optional) = optional {
        map.insert("optional".into(), json!(optional));
    }
    map
}

proptest! {
    /// Encoding a decoded form yields the input plus filled defaults.
    #[test]
    fn decode_encode_round_trip((index, name, optional) in test_form_input()) {
        let input = build(json!(index), &name, optional.as_deref());
        let form = TestForm::decode(&input).unwrap();
        let want = build(json!(index), &name, Some(optional.as_deref().unwrap_or("missing")));
        prop_assert_eq!(form.encode().unwrap(), want);
    }

    /// Numeric strings decode to the same canonical output as integers.
    #[test]
    fn decode_coerces_numeric_strings((index, name, optional) in test_form_input()) {
        let from_string = TestForm::decode(&build(json!(index.to_string()), &name, optional.as_deref())).unwrap();
        let from_int = TestForm::decode(&build(json!(index), &name, optional.as_deref())).unwrap();
        prop_assert_eq!(from_string.encode().unwrap(), from_int.encode().unwrap());
    }

    /// A negative index always fails, naming only that field.
    #[test]
    fn decode_rejects_negative_index(index in i64::MIN..0, name in "[a-z]{1,8}") {
        let err = TestForm::decode(&build(json!(index), &name, None)).unwrap_err();
        prop_assert_eq!(err.errors().fields(), vec!["index"]);
    }

    /// Sequences of nested forms keep their order through a round trip.
    #[test]
    fn nested_list_round_trip(names in proptest::collection::vec("[a-z]{1,8}", 0..6)) {
        let subs: Vec<Value> = names.iter().map(|n| json!({"name": n})).collect();
        let mut input = Map::new();
        input.insert("subs".into(), Value::Array(subs));
        let form = ListForm::decode(&input).unwrap();
        prop_assert_eq!(form.encode().unwrap(), input);
    }
}
