//! Recursive-descent parser for the schema notation.
//!
//! Shares the lexical machinery of the data parser, but field values are
//! schema expressions: a primitive type keyword, a reference name, a literal
//! match value, a nested object, a nested array, or a `|`-separated union
//! (flattened). Scalar and array types may be followed by space-separated
//! validator calls. `##` comments immediately preceding a field become its
//! description. Macros (`@schema`, `@def`, `@mix`, `@props`) are recognized
//! only as schema-object entries.

use std::collections::HashSet;

use indexmap::IndexMap;
use regex::Regex;

use crate::check::validators;
use crate::error::ParseError;
use crate::lex::{self, Abort, Cursor, Lexed};
use crate::literal;
use crate::schema::{PropsPattern, Schema, SchemaKind, SchemaNode, ValidatorConfig};
use crate::value::Value;

/// Parse schema notation text.
pub fn parse_schema(text: &str) -> Result<Schema, Vec<ParseError>> {
    let mut parser = SchemaParser::new(text);
    let schema = parser.run();
    match schema {
        Ok(schema) if parser.errors.is_empty() => Ok(schema),
        _ => Err(parser.errors),
    }
}

struct SchemaParser<'a> {
    cur: Cursor<'a>,
    errors: Vec<ParseError>,
    /// Def names seen so far, for validating `@mix(name)` references.
    defs_seen: HashSet<String>,
}

impl<'a> SchemaParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { cur: Cursor::new(text), errors: Vec::new(), defs_seen: HashSet::new() }
    }

    fn run(&mut self) -> Lexed<Schema> {
        loop {
            self.cur.skip_whitespace();
            if self.cur.peek() == Some('#') {
                self.cur.skip_line();
            } else {
                break;
            }
        }
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
        Ok(Schema { fields })
    }

    /// Object body; the opening `{` is already consumed. Counters for the
    /// synthetic keys are per-object: `def$N` counts alone, `mix$N` and
    /// `props$N` share one sequence.
    fn parse_object(&mut self) -> Lexed<IndexMap<String, SchemaNode>> {
        let mut fields = IndexMap::new();
        let mut def_counter = 0usize;
        let mut alt_counter = 0usize;
        let mut desc: Option<String> = None;
        loop {
            self.cur.skip_whitespace();
            match self.cur.peek() {
                Some('#') => {
                    self.take_comment(&mut desc);
                    continue;
                }
                Some('}') => {
                    self.cur.bump();
                    break;
                }
                Some('@') => {
                    self.parse_macro_entry(
                        &mut fields,
                        &mut def_counter,
                        &mut alt_counter,
                        &mut desc,
                    )?;
                }
                _ => {
                    let key = self.parse_field_name()?;
                    self.cur.skip_whitespace();
                    self.cur.expect(':', &mut self.errors)?;
                    self.cur.skip_whitespace();
                    let mut node = self.parse_value()?;
                    node.description = desc.take();
                    fields.insert(key, node);
                }
            }
            self.cur.skip_whitespace();
            if self.cur.accept(',') {
                continue;
            }
            self.cur.expect('}', &mut self.errors)?;
            break;
        }
        Ok(fields)
    }

    /// `#` skips the line; `##` captures it into the description buffer,
    /// which the very next field consumes.
    fn take_comment(&mut self, desc: &mut Option<String>) {
        self.cur.bump();
        if self.cur.accept('#') {
            let line = self.cur.take_line().trim().to_string();
            match desc {
                Some(d) => {
                    d.push('\n');
                    d.push_str(&line);
                }
                None => *desc = Some(line),
            }
        } else {
            self.cur.skip_line();
        }
    }

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

    // ------------------------------ Macros -------------------------------- //

    fn parse_macro_entry(
        &mut self,
        fields: &mut IndexMap<String, SchemaNode>,
        def_counter: &mut usize,
        alt_counter: &mut usize,
        desc: &mut Option<String>,
    ) -> Lexed<()> {
        let at_offset = self.cur.pos();
        self.cur.bump();
        let name = self.cur.scan_ident().unwrap_or("").to_string();
        match name.as_str() {
            "schema" => {
                // Resolved by the external reader; consumed and discarded.
                self.skip_macro_body()?;
            }
            "def" => {
                self.cur.expect('(', &mut self.errors)?;
                self.cur.skip_whitespace();
                let def_name = match self.cur.scan_ident() {
                    Some(n) => n.to_string(),
                    None => {
                        self.cur.expect(')', &mut self.errors)?;
                        return Err(Abort);
                    }
                };
                self.cur.skip_whitespace();
                self.cur.expect(')', &mut self.errors)?;
                self.cur.skip_whitespace();
                self.cur.expect(':', &mut self.errors)?;
                self.cur.skip_whitespace();
                self.cur.expect('{', &mut self.errors)?;
                // Registered before the body parses so a def may reference
                // itself through a nested @mix.
                self.defs_seen.insert(def_name.clone());
                let body = self.parse_object()?;
                *def_counter += 1;
                let mut node = SchemaNode::new(SchemaKind::Def { name: def_name, fields: body });
                node.description = desc.take();
                fields.insert(format!("def${def_counter}"), node);
            }
            "mix" => {
                self.cur.expect('(', &mut self.errors)?;
                let alternatives = self.parse_mix_alternatives()?;
                *alt_counter += 1;
                let mut node = SchemaNode::new(SchemaKind::Mix { alternatives });
                node.description = desc.take();
                fields.insert(format!("mix${alt_counter}"), node);
            }
            "props" => {
                self.cur.expect('(', &mut self.errors)?;
                self.cur.skip_whitespace();
                let pattern = if self.cur.peek() == Some('/') {
                    self.parse_props_pattern()?
                } else {
                    None
                };
                self.cur.skip_whitespace();
                self.cur.expect(')', &mut self.errors)?;
                self.cur.skip_whitespace();
                self.cur.expect(':', &mut self.errors)?;
                self.cur.skip_whitespace();
                let element = self.parse_value()?;
                *alt_counter += 1;
                let mut node =
                    SchemaNode::new(SchemaKind::Props { pattern, element: Box::new(element) });
                node.description = desc.take();
                fields.insert(format!("props${alt_counter}"), node);
            }
            other => {
                self.errors.push(ParseError {
                    message: format!("Unknown macro: '{other}'"),
                    offset: at_offset,
                    length: other.len() + 1,
                });
                self.skip_macro_body()?;
            }
        }
        Ok(())
    }

    /// Balanced-parenthesis macro body (or quoted form), skipped.
    fn skip_macro_body(&mut self) -> Lexed<()> {
        self.cur.skip_inline_whitespace();
        match self.cur.peek() {
            Some('(') => {
                self.cur.bump();
                let mut depth = 1usize;
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
                        Some('(') => depth += 1,
                        Some(')') => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        Some(_) => {}
                    }
                }
                Ok(())
            }
            Some('"') => {
                lex::scan_string(&mut self.cur, &mut self.errors)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn parse_mix_alternatives(&mut self) -> Lexed<Vec<IndexMap<String, SchemaNode>>> {
        let mut alternatives = Vec::new();
        loop {
            self.cur.skip_whitespace();
            match self.cur.peek() {
                Some('{') => {
                    self.cur.bump();
                    alternatives.push(self.parse_object()?);
                }
                Some(')') if alternatives.is_empty() => break,
                _ => {
                    let start = self.cur.pos();
                    match self.cur.scan_ident() {
                        Some(name) => {
                            if !self.defs_seen.contains(name) {
                                self.errors.push(ParseError {
                                    message: format!("Unknown reference: '{name}'"),
                                    offset: start,
                                    length: name.len(),
                                });
                            }
                            let mut alt = IndexMap::new();
                            alt.insert(
                                "ref$1".to_string(),
                                SchemaNode::new(SchemaKind::Ref { name: name.to_string() }),
                            );
                            alternatives.push(alt);
                        }
                        None => {
                            self.cur.expect(')', &mut self.errors)?;
                            return Ok(alternatives);
                        }
                    }
                }
            }
            self.cur.skip_whitespace();
            if self.cur.accept('|') {
                continue;
            }
            break;
        }
        self.cur.expect(')', &mut self.errors)?;
        Ok(alternatives)
    }

    /// `/pattern/` with `\/` accepted inside; compiled at the point of
    /// definition.
    fn parse_props_pattern(&mut self) -> Lexed<Option<PropsPattern>> {
        let start = self.cur.pos();
        self.cur.bump(); // '/'
        let mut source = String::new();
        loop {
            match self.cur.bump() {
                None => {
                    self.errors.push(ParseError {
                        message: "Expected '/' but found 'undefined'".to_string(),
                        offset: self.cur.pos(),
                        length: 1,
                    });
                    return Err(Abort);
                }
                Some('\\') => {
                    source.push('\\');
                    if let Some(c) = self.cur.bump() {
                        source.push(c);
                    }
                }
                Some('/') => break,
                Some(c) => source.push(c),
            }
        }
        match Regex::new(&source) {
            Ok(regex) => Ok(Some(PropsPattern { source, regex })),
            Err(_) => {
                self.errors.push(ParseError {
                    message: format!("Invalid pattern '{source}'"),
                    offset: start,
                    length: self.cur.pos() - start,
                });
                Ok(None)
            }
        }
    }

    // -------------------------- Schema expressions ------------------------ //

    /// One schema expression: `|`-separated alternatives, flattened into a
    /// single union (never right-nested).
    fn parse_value(&mut self) -> Lexed<SchemaNode> {
        let mut alternatives = Vec::new();
        loop {
            self.cur.skip_whitespace();
            alternatives.push(self.parse_alternative()?);
            self.cur.skip_inline_whitespace();
            if !self.cur.accept('|') {
                break;
            }
        }
        if alternatives.len() == 1 {
            Ok(alternatives.pop().unwrap())
        } else {
            Ok(SchemaNode::new(SchemaKind::Union { alternatives }))
        }
    }

    fn parse_alternative(&mut self) -> Lexed<SchemaNode> {
        match self.cur.peek() {
            Some('{') => {
                self.cur.bump();
                let fields = self.parse_object()?;
                Ok(SchemaNode::new(SchemaKind::Object { fields }))
            }
            Some('[') => {
                self.cur.bump();
                self.cur.skip_whitespace();
                let element = self.parse_value()?;
                self.cur.skip_whitespace();
                self.cur.expect(']', &mut self.errors)?;
                let mut node =
                    SchemaNode::new(SchemaKind::Array { element: Box::new(element) });
                self.parse_validator_tail("array", &mut node)?;
                Ok(node)
            }
            Some('"') => {
                let inner = lex::scan_string(&mut self.cur, &mut self.errors)?;
                let type_name = format!("\"{inner}\"");
                let mut node = SchemaNode::new(SchemaKind::Field { type_name: type_name.clone() });
                self.parse_validator_tail(&type_name, &mut node)?;
                Ok(node)
            }
            _ => {
                let start = self.cur.pos();
                let raw = self
                    .cur
                    .scan_until(&[' ', '\t', '\n', '\r', ',', '}', ']', ')', '|', '(', '#'])
                    .to_string();
                if raw.is_empty() {
                    let found = match self.cur.peek() {
                        Some(c) => c.to_string(),
                        None => "undefined".to_string(),
                    };
                    self.errors.push(ParseError {
                        message: format!("Expected type but found '{found}'"),
                        offset: start,
                        length: 1,
                    });
                    return Err(Abort);
                }
                let mut node = SchemaNode::new(SchemaKind::Field { type_name: raw.clone() });
                self.parse_validator_tail(&raw, &mut node)?;
                Ok(node)
            }
        }
    }

    /// Zero or more space-separated validator calls: `name` or `name(arg)`.
    /// Scanning is line-scoped so the next field is never misread as a
    /// validator. Unknown names for the type are reported, not fatal.
    fn parse_validator_tail(&mut self, type_name: &str, node: &mut SchemaNode) -> Lexed<()> {
        loop {
            self.cur.skip_inline_whitespace();
            match self.cur.peek() {
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
                _ => break,
            }
            let name_offset = self.cur.pos();
            let name = self.cur.scan_ident().unwrap_or("").to_string();
            let mut raw = String::new();
            let mut arg_offset = self.cur.pos();
            let has_arg = self.cur.accept('(');
            if has_arg {
                arg_offset = self.cur.pos();
                raw = self.scan_validator_arg()?;
            }
            if !validators::supported(type_name, &name) {
                self.errors.push(ParseError {
                    message: format!("Unsupported validator '{name}' for type '{type_name}'"),
                    offset: name_offset,
                    length: name.len(),
                });
                continue;
            }
            let raw = raw.trim().to_string();
            let parsed = if has_arg {
                literal::convert(&raw, arg_offset, &mut self.errors)
            } else {
                Value::Bool(true)
            };
            node.validators.insert(name, ValidatorConfig { raw, parsed });
        }
        Ok(())
    }

    /// Argument text up to the matching `)`. A leading `/` switches to
    /// regex-literal scanning so patterns may contain parentheses.
    fn scan_validator_arg(&mut self) -> Lexed<String> {
        let mut out = String::new();
        if self.cur.peek() == Some('/') {
            out.push('/');
            self.cur.bump();
            loop {
                match self.cur.bump() {
                    None => return self.unterminated_arg(),
                    Some('\\') => {
                        out.push('\\');
                        if let Some(c) = self.cur.bump() {
                            out.push(c);
                        }
                    }
                    Some('/') => {
                        out.push('/');
                        break;
                    }
                    Some(c) => out.push(c),
                }
            }
            while matches!(self.cur.peek(), Some(c) if c.is_ascii_alphabetic()) {
                out.push(self.cur.bump().unwrap());
            }
        }
        let mut depth = 1usize;
        loop {
            match self.cur.bump() {
                None => return self.unterminated_arg(),
                Some('(') => {
                    depth += 1;
                    out.push('(');
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(')');
                }
                Some(c) => out.push(c),
            }
        }
        Ok(out)
    }

    fn unterminated_arg(&mut self) -> Lexed<String> {
        self.errors.push(ParseError {
            message: "Expected ')' but found 'undefined'".to_string(),
            offset: self.cur.pos(),
            length: 1,
        });
        Err(Abort)
    }
}

// -------------------------------- Tests ----------------------------------- //
