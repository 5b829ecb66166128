//! The validation engine: walks a parsed value tree against a parsed schema.
//!
//! All mutable status (path stack, error list, defs registry) lives in one
//! [`Checker`] scoped to a single `check` call; parsed trees are shared
//! read-only. Union and mix alternatives backtrack by marking the error list,
//! trying the alternative, and draining the new errors on failure.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::CheckError;
use crate::schema::{PropsPattern, Schema, SchemaKind, SchemaNode, ValidatorConfig};
use crate::value::{NULL, Value};

pub mod validators;

/// Check a parsed top-level object against a parsed schema.
pub fn check(value: &Value, schema: &Schema) -> Result<(), Vec<CheckError>> {
    let mut cx = Checker::new();
    match value.as_object() {
        Some(obj) => cx.check_object(obj, &schema.fields),
        None => cx.errors.push(CheckError {
            path: Vec::new(),
            message: "Top-level value must be an object".to_string(),
        }),
    }
    if cx.errors.is_empty() { Ok(()) } else { Err(cx.errors) }
}

struct Checker<'s> {
    /// Name -> def body, registered in field-iteration order during this
    /// call. Carried through the whole recursive walk, which is what makes
    /// recursive self-referential defs resolvable; forward references fail.
    defs: HashMap<String, &'s IndexMap<String, SchemaNode>>,
    path: Vec<String>,
    errors: Vec<CheckError>,
}

impl<'s> Checker<'s> {
    fn new() -> Self {
        Self { defs: HashMap::new(), path: Vec::new(), errors: Vec::new() }
    }

    fn error(&mut self, message: String) {
        self.errors.push(CheckError { path: self.path.clone(), message });
    }

    fn field_name(&self) -> String {
        self.path.last().cloned().unwrap_or_else(|| "$".to_string())
    }

    // ---------------------------- Object walk ----------------------------- //

    fn check_object(
        &mut self,
        obj: &IndexMap<String, Value>,
        fields: &'s IndexMap<String, SchemaNode>,
    ) {
        for (key, node) in fields {
            match &node.kind {
                SchemaKind::Def { name, fields: body } if key.starts_with("def$") => {
                    self.defs.insert(name.clone(), body);
                }
                SchemaKind::Ref { name } if key.starts_with("ref$") => {
                    // A ref re-checks the current object, not a sub-object.
                    match self.defs.get(name).copied() {
                        Some(resolved) => self.check_object(obj, resolved),
                        None => self.error(format!("Undefined def: '{name}'")),
                    }
                }
                SchemaKind::Mix { alternatives } if key.starts_with("mix$") => {
                    self.check_mix(obj, alternatives);
                }
                SchemaKind::Props { pattern, element } if key.starts_with("props$") => {
                    self.check_props(obj, pattern, element);
                }
                _ => {
                    // Absent keys materialize as null; explicit null and
                    // absence are indistinguishable past this point.
                    let value = obj.get(key).unwrap_or(&NULL);
                    self.path.push(key.clone());
                    self.check_value(value, node);
                    self.path.pop();
                }
            }
        }
    }

    fn check_mix(
        &mut self,
        obj: &IndexMap<String, Value>,
        alternatives: &'s [IndexMap<String, SchemaNode>],
    ) {
        let mut failures = Vec::new();
        for alt in alternatives {
            let mark = self.errors.len();
            self.check_object(obj, alt);
            if self.errors.len() == mark {
                return;
            }
            let joined = self
                .errors
                .drain(mark..)
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join(" & ");
            failures.push(joined);
        }
        self.error(failures.join(" | "));
    }

    fn check_props(
        &mut self,
        obj: &IndexMap<String, Value>,
        pattern: &Option<PropsPattern>,
        element: &'s SchemaNode,
    ) {
        // Every key of the input object is visited, including keys already
        // covered by explicitly named sibling fields; those are validated
        // independently by both.
        for (key, value) in obj {
            self.path.push(key.clone());
            if let Some(p) = pattern {
                if !p.regex.is_match(key) {
                    self.error(format!("'{key}' name doesn't match pattern '{}'", p.source));
                }
            }
            self.check_value(value, element);
            self.path.pop();
        }
    }

    // ---------------------------- Value checks ---------------------------- //

    fn check_value(&mut self, v: &Value, node: &'s SchemaNode) {
        match &node.kind {
            SchemaKind::Object { fields } => match v.as_object() {
                Some(obj) => self.check_object(obj, fields),
                None => self.type_error("must be an object"),
            },
            SchemaKind::Array { element } => match v.as_array() {
                Some(items) => {
                    self.run_validators(v, "array", &node.validators);
                    for (i, item) in items.iter().enumerate() {
                        self.path.push(i.to_string());
                        self.check_value(item, element);
                        self.path.pop();
                    }
                }
                None => self.type_error("must be an array"),
            },
            SchemaKind::Union { alternatives } => self.check_union(v, alternatives),
            SchemaKind::Field { type_name } => self.check_field(v, type_name, node),
            // The remaining kinds reach value position only through synthetic
            // object keys; handle them against the value as an object shape.
            SchemaKind::Def { name, fields } => {
                self.defs.insert(name.clone(), fields);
            }
            SchemaKind::Ref { name } => match v.as_object() {
                Some(obj) => match self.defs.get(name).copied() {
                    Some(resolved) => self.check_object(obj, resolved),
                    None => self.error(format!("Undefined def: '{name}'")),
                },
                None => self.type_error("must be an object"),
            },
            SchemaKind::Mix { alternatives } => match v.as_object() {
                Some(obj) => self.check_mix(obj, alternatives),
                None => self.type_error("must be an object"),
            },
            SchemaKind::Props { pattern, element } => match v.as_object() {
                Some(obj) => self.check_props(obj, pattern, element),
                None => self.type_error("must be an object"),
            },
        }
    }

    fn check_union(&mut self, v: &Value, alternatives: &'s [SchemaNode]) {
        let mut failures = Vec::new();
        for alt in alternatives {
            let mark = self.errors.len();
            self.check_value(v, alt);
            if self.errors.len() == mark {
                return;
            }
            let joined = self
                .errors
                .drain(mark..)
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join(" & ");
            failures.push(joined);
        }
        self.error(failures.join(" | "));
    }

    fn check_field(&mut self, v: &Value, type_name: &str, node: &'s SchemaNode) {
        let field = self.field_name();
        // Missingness first: null never satisfies a non-nullable primitive
        // or literal. Genuinely absent keys take this path too.
        if v.is_null() && type_name != "undef" && type_name != "null" {
            self.error(format!("Field not found: '{field}'"));
            return;
        }
        match type_name {
            "undef" | "null" => {
                if !v.is_null() {
                    self.error(format!("'{field}' must be null"));
                }
            }
            "bool" => match v {
                Value::Bool(_) => self.run_validators(v, "bool", &node.validators),
                _ => self.error(format!("'{field}' must be a bool value")),
            },
            "int" => match v {
                Value::Int { wide: false, .. } => {
                    self.run_validators(v, "int", &node.validators)
                }
                _ => self.error(format!("'{field}' must be an int value")),
            },
            "num" => match v {
                // Wide integers satisfy neither int nor num.
                Value::Float(_) | Value::Int { wide: false, .. } => {
                    self.run_validators(v, "num", &node.validators)
                }
                _ => self.error(format!("'{field}' must be a num value")),
            },
            "date" => match v {
                Value::Date(_) => self.run_validators(v, "date", &node.validators),
                _ => self.error(format!("'{field}' must be a date value")),
            },
            "string" => match v {
                Value::String(_) => self.run_validators(v, "string", &node.validators),
                _ => self.error(format!("'{field}' must be a string value")),
            },
            literal => {
                let expected = strip_quotes(literal);
                if v.canonical_text() != expected {
                    self.error(format!("'{field}' must be '{expected}'"));
                }
            }
        }
    }

    fn run_validators(
        &mut self,
        v: &Value,
        type_key: &str,
        configs: &IndexMap<String, ValidatorConfig>,
    ) {
        if configs.is_empty() {
            return;
        }
        let field = self.field_name();
        for (name, cfg) in configs {
            if let Err(message) = validators::run(v, type_key, name, cfg, &field) {
                self.error(message);
                break; // first failing validator stops the rest for this field
            }
        }
    }

    fn type_error(&mut self, suffix: &str) {
        let field = self.field_name();
        self.error(format!("'{field}' {suffix}"));
    }
}

fn strip_quotes(literal: &str) -> &str {
    literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal)
}

// -------------------------------- Tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_data;
    use crate::schema::parse_schema;

    fn run(schema: &str, data: &str) -> Result<(), Vec<CheckError>> {
        let schema = parse_schema(schema).expect("schema parses");
        let value = parse_data(data).expect("data parses");
        check(&value, &schema)
    }

    fn messages(result: Result<(), Vec<CheckError>>) -> Vec<String> {
        result.unwrap_err().into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn matching_object_passes() {
        assert!(run(
            "{ name: string, age: int, tags: [string] }",
            r#"{ name: "Ada", age: 36, tags: ["a", "b"] }"#
        )
        .is_ok());
    }

    #[test]
    fn validator_failure_message_and_path() {
        let errs = run("{ age: int min(18) }", "{ age: 15 }").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, "'age' must be at least 18");
        assert_eq!(errs[0].path, vec!["age".to_string()]);
    }

    #[test]
    fn first_failing_validator_stops_the_rest_for_that_field() {
        let errs = run(
            "{ name: string minlen(10) pattern(/^[A-Z]/) }",
            r#"{ name: "ada" }"#,
        )
        .unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, "'name' must be at least 10 characters");
    }

    #[test]
    fn missing_field_reports_field_not_found() {
        let msgs = messages(run("{ age: int }", "{ }"));
        assert_eq!(msgs, vec!["Field not found: 'age'"]);
    }

    #[test]
    fn explicit_null_and_absence_are_indistinguishable() {
        assert_eq!(
            messages(run("{ age: int }", "{ age: null }")),
            vec!["Field not found: 'age'"]
        );
    }

    #[test]
    fn undef_accepts_null_and_absence() {
        assert!(run("{ note: undef }", "{ }").is_ok());
        assert!(run("{ note: undef }", "{ note: null }").is_ok());
        assert_eq!(
            messages(run("{ note: undef }", "{ note: 1 }")),
            vec!["'note' must be null"]
        );
    }

    #[test]
    fn union_first_match_wins_without_reporting_earlier_failures() {
        assert!(run("{ value: string | int }", "{ value: 42 }").is_ok());
        assert!(run("{ meeting_at: null | date }", "{ meeting_at: null }").is_ok());
    }

    #[test]
    fn union_total_failure_joins_alternative_messages() {
        let msgs = messages(run("{ value: string | int }", "{ value: true }"));
        assert_eq!(
            msgs,
            vec!["'value' must be a string value | 'value' must be an int value"]
        );
    }

    #[test]
    fn array_element_errors_use_index_paths() {
        let errs = run("{ fruits: [string] }", r#"{ fruits: ["apple", 5] }"#).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, "'1' must be a string value");
        assert_eq!(errs[0].path, vec!["fruits".to_string(), "1".to_string()]);
    }

    #[test]
    fn non_array_value_for_array_schema() {
        assert_eq!(
            messages(run("{ fruits: [string] }", "{ fruits: 1 }")),
            vec!["'fruits' must be an array"]
        );
    }

    #[test]
    fn literal_fields_match_exactly() {
        assert!(run(r#"{ role: "admin" }"#, r#"{ role: "admin" }"#).is_ok());
        assert_eq!(
            messages(run(r#"{ role: "admin" }"#, r#"{ role: "user" }"#)),
            vec!["'role' must be 'admin'"]
        );
        assert!(run("{ on: true, answer: 42 }", "{ on: true, answer: 42 }").is_ok());
        assert_eq!(
            messages(run("{ on: true }", "{ on: false }")),
            vec!["'on' must be 'true'"]
        );
    }

    #[test]
    fn wide_integers_satisfy_neither_int_nor_num() {
        assert_eq!(
            messages(run("{ n: int }", "{ n: 3_000_000_000 }")),
            vec!["'n' must be an int value"]
        );
        assert_eq!(
            messages(run("{ n: num }", "{ n: 3_000_000_000 }")),
            vec!["'n' must be a num value"]
        );
    }

    #[test]
    fn num_accepts_ints_and_floats() {
        assert!(run("{ a: num, b: num }", "{ a: 3, b: 3.5 }").is_ok());
    }

    #[test]
    fn mix_named_alternative_resolves_through_defs() {
        let schema = r#"{ @def(admin): { role: "admin", level: int }, @mix(admin) }"#;
        assert!(run(schema, r#"{ role: "admin", level: 5 }"#).is_ok());
        let msgs = messages(run(schema, r#"{ role: "user", level: 5 }"#));
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("'role' must be 'admin'"), "got {:?}", msgs[0]);
    }

    #[test]
    fn mix_failure_joins_alternatives_with_pipe_and_errors_with_ampersand() {
        let schema = r#"{ @mix({ a: int, b: int } | { c: string }) }"#;
        let msgs = messages(run(schema, "{ }"));
        assert_eq!(
            msgs,
            vec!["Field not found: 'a' & Field not found: 'b' | Field not found: 'c'"]
        );
    }

    #[test]
    fn mix_first_fully_matching_alternative_wins() {
        let schema = r#"{ @mix({ kind: "a", a: int } | { kind: "b", b: string }) }"#;
        assert!(run(schema, r#"{ kind: "b", b: "hi" }"#).is_ok());
    }

    #[test]
    fn recursive_def_through_mix() {
        let schema = r#"{
            @def(section): { title: string, @mix({ leaf: bool } | section) },
            @mix(section)
        }"#;
        // The second alternative re-checks the same object against the def
        // itself; the leaf alternative terminates the recursion.
        assert!(run(schema, r#"{ title: "root", leaf: true }"#).is_ok());
    }

    #[test]
    fn undefined_def_is_a_check_time_error() {
        // Defs register only when the walk reaches them. Here the def sits in
        // a union alternative the walk never tries, so the mix reference is
        // undefined at check time even though parsing knew the name.
        let schema = "{ v: int | { @def(x): { a: int } }, @mix(x) }";
        let msgs = messages(run(schema, "{ v: 1, a: 2 }"));
        assert_eq!(msgs, vec!["Undefined def: 'x'"]);
    }

    #[test]
    fn props_pattern_checks_every_key() {
        let schema = "{ @props(/^env_/): string }";
        assert!(run(schema, r#"{ env_home: "/root", env_path: "/bin" }"#).is_ok());
        let msgs = messages(run(schema, r#"{ env_home: "/root", misc: "x" }"#));
        assert_eq!(msgs, vec!["'misc' name doesn't match pattern '^env_'"]);
    }

    #[test]
    fn props_without_pattern_checks_values_only() {
        let schema = "{ @props(): int }";
        assert!(run(schema, "{ a: 1, b: 2 }").is_ok());
        let msgs = messages(run(schema, r#"{ a: 1, b: "x" }"#));
        assert_eq!(msgs, vec!["'b' must be an int value"]);
    }

    #[test]
    fn props_overlaps_named_siblings() {
        // Keys covered by named fields are still visited by props.
        let schema = "{ port: int, @props(): int }";
        assert!(run(schema, "{ port: 80 }").is_ok());
        let errs = run(schema, r#"{ port: "x" }"#).unwrap_err();
        // Both the named field and the props walk report independently.
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| e.message == "'port' must be an int value"));
    }

    #[test]
    fn nested_paths_accumulate() {
        let errs = run(
            "{ server: { port: int } }",
            r#"{ server: { port: "http" } }"#,
        )
        .unwrap_err();
        assert_eq!(errs[0].path, vec!["server".to_string(), "port".to_string()]);
    }

    #[test]
    fn non_object_value_for_object_schema() {
        assert_eq!(
            messages(run("{ server: { port: int } }", "{ server: 1 }")),
            vec!["'server' must be an object"]
        );
    }

    #[test]
    fn check_is_deterministic() {
        let schema = parse_schema("{ a: int min(2), b: string }").unwrap();
        let value = parse_data(r#"{ a: 1, b: 3 }"#).unwrap();
        let first = check(&value, &schema).unwrap_err();
        for _ in 0..3 {
            assert_eq!(check(&value, &schema).unwrap_err(), first);
        }
    }

    #[test]
    fn extra_keys_without_props_are_ignored() {
        assert!(run("{ a: int }", "{ a: 1, extra: \"x\" }").is_ok());
    }
}
