//! End-to-end scenarios: schema text + data text through parse and check.

use nota::{check, parse_data, parse_schema};
use rstest::rstest;

fn messages(schema: &str, data: &str) -> Vec<String> {
    let schema = parse_schema(schema).expect("schema parses");
    let value = parse_data(data).expect("data parses");
    match check(&value, &schema) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.into_iter().map(|e| e.message).collect(),
    }
}

#[rstest]
#[case::minimum_age(
    "{ age: int min(18) }",
    "{ age: 15 }",
    &["'age' must be at least 18"]
)]
#[case::age_ok("{ age: int min(18) }", "{ age: 18 }", &[])]
#[case::nullable_date_absent("{ meeting_at: null | date }", "{ }", &[])]
#[case::nullable_date_null("{ meeting_at: null | date }", "{ meeting_at: null }", &[])]
#[case::nullable_date_set(
    "{ meeting_at: null | date }",
    "{ meeting_at: 2026-01-15T09:00 }",
    &[]
)]
#[case::heterogeneous_array(
    "{ fruits: [string] }",
    r#"{ fruits: ["apple", 5] }"#,
    &["'1' must be a string value"]
)]
#[case::union_order_does_not_matter(
    "{ v: string | int }",
    "{ v: 42 }",
    &[]
)]
#[case::string_pattern(
    "{ id: string pattern(/^[a-z]+-[0-9]+$/) }",
    r#"{ id: "order-17" }"#,
    &[]
)]
#[case::string_pattern_fails(
    "{ id: string pattern(/^[a-z]+-[0-9]+$/) }",
    r#"{ id: "Order 17" }"#,
    &["'id' doesn't match pattern '^[a-z]+-[0-9]+$'"]
)]
#[case::unique_array(
    "{ tags: [string] unique }",
    r#"{ tags: ["a", "b", "a"] }"#,
    &["'tags' must have unique values"]
)]
fn scenario(#[case] schema: &str, #[case] data: &str, #[case] expected: &[&str]) {
    assert_eq!(messages(schema, data), expected);
}

#[test]
fn role_mix_rejects_wrong_literal() {
    let schema = r#"{
        @def(admin): { role: "admin", level: int min(1) },
        @def(guest): { role: "guest" },
        @mix(admin | guest)
    }"#;
    assert!(messages(schema, r#"{ role: "admin", level: 3 }"#).is_empty());
    assert!(messages(schema, r#"{ role: "guest" }"#).is_empty());
    let msgs = messages(schema, r#"{ role: "owner" }"#);
    assert_eq!(msgs.len(), 1);
    assert!(msgs[0].contains("'role' must be 'admin'"));
    assert!(msgs[0].contains("'role' must be 'guest'"));
    assert!(msgs[0].contains(" | "));
}

#[test]
fn nested_config_with_props_and_descriptions() {
    let schema = r#"{
        ## Server settings.
        server: {
            port: int min(1) max(65535),
            hosts: [string] minlen(1),
        },
        @props(/^feature_/): bool,
        server_name: string | null,
    }"#;
    let ok = r#"{
        server: { port: 8080, hosts: ["a.example", "b.example"] },
        feature_fast: true,
        server_name: null,
    }"#;
    // The props walk visits every key, so the named fields must also satisfy
    // its pattern and element type; this data does not.
    let msgs = messages(schema, ok);
    assert!(msgs.contains(&"'server' name doesn't match pattern '^feature_'".to_string()));
}

#[test]
fn errors_report_in_schema_field_order() {
    let schema = "{ a: int, b: string, c: bool }";
    let data = r#"{ c: 1, a: "x", b: 2 }"#;
    let msgs = messages(schema, data);
    assert_eq!(
        msgs,
        vec![
            "'a' must be an int value",
            "'b' must be a string value",
            "'c' must be a bool value",
        ]
    );
}

#[test]
fn check_errors_carry_full_paths() {
    let schema = "{ servers: [{ port: int }] }";
    let data = r#"{ servers: [{ port: 80 }, { port: "x" }] }"#;
    let schema = parse_schema(schema).unwrap();
    let value = parse_data(data).unwrap();
    let errors = check(&value, &schema).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path_text(), "servers.1.port");
}

#[test]
fn repeated_checks_are_deterministic() {
    let schema = parse_schema(
        "{ a: int min(10), b: string minlen(2), c: [int] unique }",
    )
    .unwrap();
    let value = parse_data(r#"{ a: 5, b: "x", c: [1, 1] }"#).unwrap();
    let first = check(&value, &schema).unwrap_err();
    for _ in 0..5 {
        assert_eq!(check(&value, &schema).unwrap_err(), first);
    }
}
