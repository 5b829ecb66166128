//! Recursive-descent parser for the data notation.
//!
//! Grammar: optional leading comment (`#...`) and macro (`@name(...)` /
//! `@name"..."`) lines, then exactly one `{ ... }` object. Fields separate
//! with `,` (trailing comma allowed); field names are bare identifiers or
//! quoted strings (stored with their quotes); values are objects, arrays,
//! quoted strings, or bare tokens handed to the literal converter.
//!
//! Structural failures abort immediately with the errors collected so far;
//! per-field literal errors are recorded and parsing continues.

use indexmap::IndexMap;

use crate::error::ParseError;
use crate::lex::{self, Abort, Cursor, Lexed};
use crate::literal;
use crate::value::Value;

/// A parsed data file: the top-level object plus the `@schema` directive from
/// the preamble, if any (its meaning is resolved by the file reader).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub value: Value,
    pub schema_directive: Option<String>,
}

/// Parse notation text into its top-level object.
pub fn parse_data(text: &str) -> Result<Value, Vec<ParseError>> {
    parse_document(text).map(|doc| doc.value)
}

/// Parse notation text, keeping the preamble `@schema` directive.
pub fn parse_document(text: &str) -> Result<Document, Vec<ParseError>> {
    let mut parser = DataParser::new(text);
    let doc = parser.run();
    match doc {
        Ok(doc) if parser.errors.is_empty() => Ok(doc),
        _ => Err(parser.errors),
    }
}

struct DataParser<'a> {
    cur: Cursor<'a>,
    errors: Vec<ParseError>,
}

impl<'a> DataParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { cur: Cursor::new(text), errors: Vec::new() }
    }

    fn run(&mut self) -> Lexed<Document> {
        let schema_directive = self.parse_preamble()?;
        self.cur.skip_whitespace();
        self.cur.expect('{', &mut self.errors)?;
        let fields = self.parse_object()?;
        self.cur.skip_whitespace();
        if !self.cur.at_end() {
            self.errors.push(ParseError {
                message: "Unexpected content after top-level object".to_string(),
                offset: self.cur.pos(),
                length: 1,
            });
        }
        Ok(Document { value: Value::Object(fields), schema_directive })
    }

    /// Comment and macro lines before the top-level object. Only the
    /// `@schema` macro is meaningful here; other macro lines address external
    /// tools and are consumed without error.
    fn parse_preamble(&mut self) -> Lexed<Option<String>> {
        let mut directive = None;
        loop {
            self.cur.skip_whitespace();
            match self.cur.peek() {
                Some('#') => self.cur.skip_line(),
                Some('@') => {
                    self.cur.bump();
                    let name = self.cur.scan_ident().unwrap_or("").to_string();
                    let body = self.parse_macro_body()?;
                    if name == "schema" && directive.is_none() {
                        directive = Some(body);
                    }
                }
                _ => break,
            }
        }
        Ok(directive)
    }

    /// `(...)` with balanced parens, or a quoted string. Returns the inner
    /// text, quotes stripped.
    fn parse_macro_body(&mut self) -> Lexed<String> {
        self.cur.skip_inline_whitespace();
        match self.cur.peek() {
            Some('(') => {
                self.cur.bump();
                let mut depth = 1usize;
                let mut body = String::new();
                loop {
                    match self.cur.bump() {
                        None => {
                            self.errors.push(ParseError {
                                message: "Expected ')' but found 'undefined'".to_string(),
                                offset: self.cur.pos(),
                                length: 1,
                            });
                            return Err(Abort);
                        }
                        Some('(') => {
                            depth += 1;
                            body.push('(');
                        }
                        Some(')') => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            body.push(')');
                        }
                        Some(c) => body.push(c),
                    }
                }
                let body = body.trim();
                let body = body
                    .strip_prefix('"')
                    .and_then(|b| b.strip_suffix('"'))
                    .unwrap_or(body);
                Ok(body.to_string())
            }
            Some('"') => lex::scan_string(&mut self.cur, &mut self.errors),
            _ => Ok(String::new()),
        }
    }

    /// Object body; the opening `{` is already consumed.
    fn parse_object(&mut self) -> Lexed<IndexMap<String, Value>> {
        let mut fields = IndexMap::new();
        loop {
            self.cur.skip_whitespace();
            if self.cur.accept('}') {
                break;
            }
            let key = self.parse_field_name()?;
            self.cur.skip_whitespace();
            self.cur.expect(':', &mut self.errors)?;
            self.cur.skip_whitespace();
            let value = self.parse_value()?;
            // Duplicate keys: last value wins, first position kept.
            fields.insert(key, value);
            self.cur.skip_whitespace();
            if self.cur.accept(',') {
                continue;
            }
            self.cur.expect('}', &mut self.errors)?;
            break;
        }
        Ok(fields)
    }

    /// Bare identifier, or a quoted string stored with its quotes.
    fn parse_field_name(&mut self) -> Lexed<String> {
        if self.cur.peek() == Some('"') {
            let inner = lex::scan_string(&mut self.cur, &mut self.errors)?;
            return Ok(format!("\"{inner}\""));
        }
        match self.cur.scan_ident() {
            Some(name) => Ok(name.to_string()),
            None => {
                let found = match self.cur.peek() {
                    Some(c) => c.to_string(),
                    None => "undefined".to_string(),
                };
                self.errors.push(ParseError {
                    message: format!("Expected field name but found '{found}'"),
                    offset: self.cur.pos(),
                    length: 1,
                });
                Err(Abort)
            }
        }
    }

    fn parse_value(&mut self) -> Lexed<Value> {
        match self.cur.peek() {
            Some('{') => {
                self.cur.bump();
                Ok(Value::Object(self.parse_object()?))
            }
            Some('[') => {
                self.cur.bump();
                Ok(Value::Array(self.parse_array()?))
            }
            Some('"') => {
                let raw = lex::scan_string(&mut self.cur, &mut self.errors)?;
                Ok(Value::String(lex::dedent_block(&raw)))
            }
            _ => {
                let start = self.cur.pos();
                let raw = self.cur.scan_until(&[',', '}', ']', '\n']).trim_end();
                Ok(literal::convert(raw, start, &mut self.errors))
            }
        }
    }

    /// Array body; the opening `[` is already consumed.
    fn parse_array(&mut self) -> Lexed<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            self.cur.skip_whitespace();
            if self.cur.accept(']') {
                break;
            }
            items.push(self.parse_value()?);
            self.cur.skip_whitespace();
            if self.cur.accept(',') {
                continue;
            }
            self.cur.expect(']', &mut self.errors)?;
            break;
        }
        Ok(items)
    }
}

// -------------------------------- Tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DateValue, Zone};
    use chrono::{NaiveDate, NaiveTime};

    fn obj(v: &Value) -> &IndexMap<String, Value> {
        v.as_object().expect("top-level object")
    }

    #[test]
    fn parses_scalars_and_nesting() {
        let text = r#"
            {
                name: "Ada",
                age: 36,
                scores: [1, 2, 3],
                meta: { active: true, note: null },
            }
        "#;
        let v = parse_data(text).unwrap();
        let root = obj(&v);
        assert_eq!(root["name"], Value::String("Ada".into()));
        assert_eq!(root["age"], Value::int(36));
        assert_eq!(
            root["scores"],
            Value::Array(vec![Value::int(1), Value::int(2), Value::int(3)])
        );
        let meta = root["meta"].as_object().unwrap();
        assert_eq!(meta["active"], Value::Bool(true));
        assert_eq!(meta["note"], Value::Null);
    }

    #[test]
    fn quoted_keys_keep_their_quotes() {
        let v = parse_data(r#"{ "full name": "Ada Lovelace" }"#).unwrap();
        let root = obj(&v);
        assert!(root.contains_key("\"full name\""));
        assert!(!root.contains_key("full name"));
    }

    #[test]
    fn bare_date_tokens_survive_colons() {
        let v = parse_data("{ at: 2024-03-09T10:30U, t: 07:45 }").unwrap();
        let root = obj(&v);
        assert_eq!(
            root["at"],
            Value::Date(DateValue {
                date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
                time: Some(NaiveTime::from_hms_opt(10, 30, 0).unwrap()),
                zone: Some(Zone::Utc),
            })
        );
        assert_eq!(
            root["t"],
            Value::Date(DateValue::time_only(NaiveTime::from_hms_opt(7, 45, 0).unwrap()))
        );
    }

    #[test]
    fn trailing_comma_is_allowed() {
        assert!(parse_data("{ a: 1, }").is_ok());
        assert!(parse_data("{ a: [1, 2,], }").is_ok());
    }

    #[test]
    fn whitespace_is_not_significant_around_punctuation() {
        let tight = parse_data("{a:1,b:[2,3],c:{d:\"x\"}}").unwrap();
        let loose = parse_data("{ a : 1 , b : [ 2 , 3 ] , c : { d : \"x\" } }").unwrap();
        assert_eq!(tight, loose);
    }

    #[test]
    fn preamble_comment_and_schema_directive() {
        let text = "# config\n@schema(\"shapes/server.schema\")\n{ port: 8080 }";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.schema_directive.as_deref(), Some("shapes/server.schema"));
        assert_eq!(obj(&doc.value)["port"], Value::int(8080));
    }

    #[test]
    fn unknown_preamble_macros_are_consumed() {
        let doc = parse_document("@version(2)\n{ a: 1 }").unwrap();
        assert_eq!(doc.schema_directive, None);
    }

    #[test]
    fn missing_open_brace_is_structural() {
        let errs = parse_data("port: 8080").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, "Expected '{' but found 'p'");
    }

    #[test]
    fn unterminated_object_aborts_with_collected_errors() {
        let errs = parse_data("{ a: banana, b: 1").unwrap_err();
        // The literal error is collected, then the structural abort ends the
        // attempt.
        assert!(errs.iter().any(|e| e.message == "Unsupported value type 'banana'"));
        assert_eq!(errs.last().unwrap().message, "Expected '}' but found 'undefined'");
    }

    #[test]
    fn literal_errors_do_not_stop_sibling_fields() {
        let errs = parse_data("{ a: banana, b: 2024-02-30, c: 1 }").unwrap_err();
        let msgs: Vec<_> = errs.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            msgs,
            vec!["Unsupported value type 'banana'", "Invalid date '2024-02-30'"]
        );
    }

    #[test]
    fn error_offsets_are_byte_positions() {
        let text = "{ a: banana }";
        let errs = parse_data(text).unwrap_err();
        assert_eq!(errs[0].offset, text.find("banana").unwrap());
        assert_eq!(errs[0].length, "banana".len());
    }

    #[test]
    fn multiline_string_blocks_dedent() {
        let text = "{ note: \"\n    first\n      second\n    third\" }";
        let v = parse_data(text).unwrap();
        assert_eq!(
            obj(&v)["note"],
            Value::String("first\n  second\nthird".into())
        );
    }

    #[test]
    fn duplicate_keys_last_value_wins() {
        let v = parse_data("{ a: 1, a: 2 }").unwrap();
        assert_eq!(obj(&v)["a"], Value::int(2));
        assert_eq!(obj(&v).len(), 1);
    }

    #[test]
    fn trailing_content_is_reported() {
        let errs = parse_data("{ a: 1 } extra").unwrap_err();
        assert_eq!(errs[0].message, "Unexpected content after top-level object");
    }
}
