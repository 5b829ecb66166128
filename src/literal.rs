//! Literal conversion: raw bare-token text to a typed [`Value`].
//!
//! Both parsers delegate here whenever an unquoted token must become a typed
//! value. Classification is first-match-wins over a fixed ladder of token
//! classes; failures are recorded in the caller's error sink and the value
//! falls back to `Null`.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::value::{DateValue, Value, Zone};

// ---------------------------- Token classes ------------------------------- //

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?s)^".*"$"#).unwrap());
static REGEX_LIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^/.*/[a-zA-Z]*$").unwrap());
static SCIENTIFIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9][0-9_]*(\.[0-9]+)?[eE][+-]?[0-9]+$").unwrap());
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9][0-9_]*$").unwrap());
static HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0[xX][0-9a-fA-F][0-9a-fA-F_]*$").unwrap());
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9][0-9_]*\.[0-9][0-9_]*$").unwrap());
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:T(\d{2}):(\d{2})(?::(\d{2}))?)?(U|L|[+-]\d{2}:\d{2})?$",
    )
    .unwrap()
});
static TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2})(?::(\d{2}))?$").unwrap());

/// `/pattern/flags` splitter for regex-literal tokens. Returns the inner
/// pattern text and the trailing flags.
pub fn split_regex_literal(raw: &str) -> Option<(&str, &str)> {
    if !REGEX_LIT.is_match(raw) {
        return None;
    }
    let close = raw.rfind('/')?;
    Some((&raw[1..close], &raw[close + 1..]))
}

// ------------------------------- Convert ---------------------------------- //

/// Convert a raw trimmed token into a typed value. `offset` is the byte
/// offset of the token start; conversion problems are recorded in `errors`
/// and yield `Null`.
pub fn convert(raw: &str, offset: usize, errors: &mut Vec<ParseError>) -> Value {
    match raw {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if QUOTED.is_match(raw) {
        // Caller already handled embedded-quote escaping.
        return Value::String(raw[1..raw.len() - 1].to_string());
    }
    if REGEX_LIT.is_match(raw) {
        // Kept as literal regex text; compiled only where a pattern is used.
        return Value::String(raw.to_string());
    }
    if SCIENTIFIC.is_match(raw) {
        return match raw.replace('_', "").parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => unsupported(raw, offset, errors),
        };
    }
    if INTEGER.is_match(raw) {
        return match raw.replace('_', "").parse::<i128>() {
            Ok(n) => Value::int(n),
            Err(_) => unsupported(raw, offset, errors),
        };
    }
    if HEX.is_match(raw) {
        // Hex literals always land in the 32-bit-range kind.
        return match i128::from_str_radix(&raw[2..].replace('_', ""), 16) {
            Ok(n) => Value::Int { value: n, wide: false },
            Err(_) => unsupported(raw, offset, errors),
        };
    }
    if DECIMAL.is_match(raw) {
        return match raw.replace('_', "").parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => unsupported(raw, offset, errors),
        };
    }
    if let Some(caps) = DATE.captures(raw) {
        return convert_date(raw, &caps, offset, errors);
    }
    if let Some(caps) = TIME.captures(raw) {
        let (h, m) = (num(&caps, 1), num(&caps, 2));
        let s = caps.get(3).map(|c| c.as_str().parse::<u32>().unwrap()).unwrap_or(0);
        return match NaiveTime::from_hms_opt(h, m, s) {
            Some(t) => Value::Date(DateValue::time_only(t)),
            None => invalid_date(raw, offset, errors),
        };
    }

    unsupported(raw, offset, errors)
}

fn convert_date(
    raw: &str,
    caps: &regex::Captures<'_>,
    offset: usize,
    errors: &mut Vec<ParseError>,
) -> Value {
    let (y, mo, d) = (
        caps[1].parse::<i32>().unwrap(),
        num(caps, 2),
        num(caps, 3),
    );
    let Some(date) = NaiveDate::from_ymd_opt(y, mo, d) else {
        return invalid_date(raw, offset, errors);
    };
    let time = match caps.get(4) {
        None => None,
        Some(_) => {
            let (h, mi) = (num(caps, 4), num(caps, 5));
            let s = caps.get(6).map(|c| c.as_str().parse::<u32>().unwrap()).unwrap_or(0);
            match NaiveTime::from_hms_opt(h, mi, s) {
                Some(t) => Some(t),
                None => return invalid_date(raw, offset, errors),
            }
        }
    };
    let zone = caps.get(7).map(|z| parse_zone(z.as_str()));
    Value::Date(DateValue { date, time, zone })
}

fn parse_zone(marker: &str) -> Zone {
    match marker {
        "U" => Zone::Utc,
        "L" => Zone::Local,
        other => {
            // ±HH:MM, already shape-checked by the token class.
            let sign = if other.starts_with('-') { -1 } else { 1 };
            let h: i32 = other[1..3].parse().unwrap();
            let m: i32 = other[4..6].parse().unwrap();
            Zone::Offset(sign * (h * 60 + m))
        }
    }
}

fn num(caps: &regex::Captures<'_>, i: usize) -> u32 {
    caps[i].parse().unwrap()
}

fn unsupported(raw: &str, offset: usize, errors: &mut Vec<ParseError>) -> Value {
    errors.push(ParseError {
        message: format!("Unsupported value type '{raw}'"),
        offset,
        length: raw.len(),
    });
    Value::Null
}

fn invalid_date(raw: &str, offset: usize, errors: &mut Vec<ParseError>) -> Value {
    errors.push(ParseError {
        message: format!("Invalid date '{raw}'"),
        offset,
        length: raw.len(),
    });
    Value::Null
}

// -------------------------------- Tests ----------------------------------- //
