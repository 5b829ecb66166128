//! Property tests: pretty-printed output re-parses to the same value tree.

use indexmap::IndexMap;
use nota::{Value, parse_data, stringify};
use proptest::collection::vec;
use proptest::prelude::*;

fn scalar() -> BoxedStrategy<Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::int(n as i128)),
        // Finite, non-integral-pathological floats; display uses the shortest
        // form which round-trips through parse.
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z][a-z0-9 ]{0,11}".prop_map(Value::String),
    ]
    .boxed()
}

// Boxed so the recursive closure can hand `fields` a cloneable strategy.
fn value() -> BoxedStrategy<Value> {
    scalar()
        .prop_recursive(3, 24, 6, |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(Value::Array),
                fields(inner).prop_map(Value::Object),
            ]
        })
        .boxed()
}

fn fields(
    inner: impl Strategy<Value = Value> + Clone,
) -> impl Strategy<Value = IndexMap<String, Value>> {
    vec(("[a-z][a-z0-9_]{0,7}", inner), 0..5).prop_map(|pairs| {
        // Duplicate keys collapse in the parser; collapse here too so the
        // comparison is exact.
        pairs.into_iter().collect()
    })
}

fn document() -> impl Strategy<Value = Value> {
    fields(value()).prop_map(Value::Object)
}

proptest! {
    #[test]
    fn stringify_then_parse_is_identity(doc in document()) {
        let text = stringify(&doc);
        let reparsed = parse_data(&text).unwrap();
        prop_assert_eq!(reparsed, doc);
    }

    #[test]
    fn stringify_is_stable(doc in document()) {
        let once = stringify(&doc);
        let twice = stringify(&parse_data(&once).unwrap());
        prop_assert_eq!(once, twice);
    }
}
