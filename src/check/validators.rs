//! The validator registry: which validator names each type accepts, and how
//! each one runs against a concrete value.
//!
//! `supported` is consulted at schema-parse time so unknown names surface
//! early; `run` executes at check time and returns the failure message.

use regex::RegexBuilder;

use crate::literal::split_regex_literal;
use crate::schema::ValidatorConfig;
use crate::value::Value;

/// Whether `validator` is a known validator for `type_name`.
pub fn supported(type_name: &str, validator: &str) -> bool {
    matches!(
        (type_name, validator),
        ("int" | "num" | "date", "min" | "max")
            | ("string", "minlen" | "maxlen" | "pattern")
            | ("array", "minlen" | "maxlen" | "unique")
    )
}

/// Run one validator. `type_key` is the schema type that attached it; `field`
/// is the innermost path segment, used in failure messages.
pub fn run(
    value: &Value,
    type_key: &str,
    name: &str,
    cfg: &ValidatorConfig,
    field: &str,
) -> Result<(), String> {
    match (type_key, name) {
        ("int" | "num", "min") => numeric_min(value, cfg, field),
        ("int" | "num", "max") => numeric_max(value, cfg, field),
        ("date", "min") => date_min(value, cfg, field),
        ("date", "max") => date_max(value, cfg, field),
        ("string", "minlen") => {
            let n = char_count(value);
            bound(n >= arg_len(cfg), || {
                format!("'{field}' must be at least {} characters", cfg.raw)
            })
        }
        ("string", "maxlen") => {
            let n = char_count(value);
            bound(n <= arg_len(cfg), || {
                format!("'{field}' must be at most {} characters", cfg.raw)
            })
        }
        ("string", "pattern") => pattern(value, cfg, field),
        ("array", "minlen") => {
            let n = item_count(value);
            bound(n >= arg_len(cfg), || {
                format!("'{field}' must have at least {} items", cfg.raw)
            })
        }
        ("array", "maxlen") => {
            let n = item_count(value);
            bound(n <= arg_len(cfg), || {
                format!("'{field}' must have at most {} items", cfg.raw)
            })
        }
        ("array", "unique") => unique(value, field),
        // Unknown pairs are rejected at schema-parse time.
        _ => Ok(()),
    }
}

fn bound(ok: bool, message: impl FnOnce() -> String) -> Result<(), String> {
    if ok { Ok(()) } else { Err(message()) }
}

// ------------------------------- Numeric ---------------------------------- //

// The wide flag is ignored here: values that reach a numeric validator have
// already passed the int/num type check, and a wide bound argument must still
// bound rather than silently pass.
fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Int { value, .. } => Some(*value as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn numeric_min(value: &Value, cfg: &ValidatorConfig, field: &str) -> Result<(), String> {
    let (Some(x), Some(b)) = (as_number(value), as_number(&cfg.parsed)) else {
        return Ok(());
    };
    bound(x >= b, || format!("'{field}' must be at least {}", cfg.raw))
}

fn numeric_max(value: &Value, cfg: &ValidatorConfig, field: &str) -> Result<(), String> {
    let (Some(x), Some(b)) = (as_number(value), as_number(&cfg.parsed)) else {
        return Ok(());
    };
    bound(x <= b, || format!("'{field}' must be at most {}", cfg.raw))
}

// -------------------------------- Dates ----------------------------------- //

fn date_min(value: &Value, cfg: &ValidatorConfig, field: &str) -> Result<(), String> {
    let (Value::Date(d), Value::Date(b)) = (value, &cfg.parsed) else {
        return Ok(());
    };
    bound(d.sort_key() >= b.sort_key(), || {
        format!("'{field}' must be at least {}", cfg.raw)
    })
}

fn date_max(value: &Value, cfg: &ValidatorConfig, field: &str) -> Result<(), String> {
    let (Value::Date(d), Value::Date(b)) = (value, &cfg.parsed) else {
        return Ok(());
    };
    bound(d.sort_key() <= b.sort_key(), || {
        format!("'{field}' must be at most {}", cfg.raw)
    })
}

// ----------------------------- String/array ------------------------------- //

fn char_count(v: &Value) -> usize {
    match v {
        Value::String(s) => s.chars().count(),
        _ => 0,
    }
}

fn item_count(v: &Value) -> usize {
    match v {
        Value::Array(items) => items.len(),
        _ => 0,
    }
}

fn arg_len(cfg: &ValidatorConfig) -> usize {
    match &cfg.parsed {
        Value::Int { value, .. } => usize::try_from(*value).unwrap_or(0),
        _ => 0,
    }
}

fn pattern(value: &Value, cfg: &ValidatorConfig, field: &str) -> Result<(), String> {
    let Value::String(s) = value else {
        return Ok(());
    };
    // Accepts the `/pat/flags` literal form; a bare argument is taken as the
    // pattern text with no flags.
    let (pat, flags) = split_regex_literal(&cfg.raw).unwrap_or((cfg.raw.as_str(), ""));
    let re = RegexBuilder::new(pat)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|_| format!("Invalid pattern '{pat}'"))?;
    bound(re.is_match(s), || {
        format!("'{field}' doesn't match pattern '{pat}'")
    })
}

fn unique(value: &Value, field: &str) -> Result<(), String> {
    let Value::Array(items) = value else {
        return Ok(());
    };
    for (j, item) in items.iter().enumerate().skip(1) {
        if items[..j].contains(item) {
            return Err(format!("'{field}' must have unique values"));
        }
    }
    Ok(())
}

// -------------------------------- Tests ----------------------------------- //
