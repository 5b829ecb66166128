//! Pretty-printer for parsed value trees, back into notation text.
//!
//! Objects print one field per line at increasing indent; arrays print
//! inline. Strings are emitted between plain quotes without re-escaping,
//! so a string containing `"` does not round-trip; this matches the
//! parser's escape handling being one-directional.

use colored::Colorize;

use crate::value::{Value, format_float};

/// Output options. `indent` is the per-level unit; `color` paints scalars
/// with ANSI colors for terminal display.
#[derive(Debug, Clone)]
pub struct Style {
    pub indent: String,
    pub color: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self { indent: "  ".to_string(), color: false }
    }
}

/// Render a value tree with the default style.
pub fn stringify(value: &Value) -> String {
    stringify_styled(value, &Style::default())
}

pub fn stringify_styled(value: &Value, style: &Style) -> String {
    let mut out = String::new();
    write_value(&mut out, value, style, 0);
    out
}

fn write_value(out: &mut String, value: &Value, style: &Style, depth: usize) {
    match value {
        Value::Object(fields) => {
            if fields.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            let last = fields.len() - 1;
            for (i, (key, v)) in fields.iter().enumerate() {
                for _ in 0..=depth {
                    out.push_str(&style.indent);
                }
                out.push_str(key);
                out.push_str(": ");
                write_value(out, v, style, depth + 1);
                if i != last {
                    out.push(',');
                }
                out.push('\n');
            }
            for _ in 0..depth {
                out.push_str(&style.indent);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, style, depth);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar_text(scalar, style)),
    }
}

fn scalar_text(value: &Value, style: &Style) -> String {
    let text = match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int { value, .. } => value.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Date(d) => d.display_text(),
        Value::String(s) => format!("\"{s}\""),
        Value::Array(_) | Value::Object(_) => String::new(),
    };
    if !style.color {
        return text;
    }
    match value {
        Value::Null => text.dimmed().to_string(),
        Value::Bool(_) => text.magenta().to_string(),
        Value::Int { .. } | Value::Float(_) => text.cyan().to_string(),
        Value::Date(_) => text.blue().to_string(),
        Value::String(_) => text.green().to_string(),
        _ => text,
    }
}

// -------------------------------- Tests ----------------------------------- //
