//! The parsed value tree. Closed variant set, immutable once parsed.

use chrono::{NaiveDate, NaiveTime, Timelike};
use indexmap::IndexMap;

// ------------------------------ Date values ------------------------------- //

/// Timezone marker on a date/datetime literal: `U` (UTC), `L` (local), or an
/// explicit `±HH:MM` offset (stored in minutes east of UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utc,
    Local,
    Offset(i32),
}

/// A calendar date with optional time-of-day and optional zone marker.
///
/// Time-only literals are anchored to 1900-01-01 and carry only the time
/// component; this is an encoding choice, not a distinct variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateValue {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub zone: Option<Zone>,
}

impl DateValue {
    /// Anchor date for time-only literals.
    pub fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
    }

    pub fn time_only(time: NaiveTime) -> Self {
        Self { date: Self::epoch(), time: Some(time), zone: None }
    }

    /// Key for calendar comparison (zone markers are ignored).
    pub fn sort_key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time.unwrap_or(NaiveTime::MIN))
    }

    /// Notation text form: `YYYY-MM-DD` when the time-of-day is all-zero or
    /// absent, else `YYYY-MM-DDTHH:MM`. Seconds are always dropped.
    pub fn display_text(&self) -> String {
        match self.time {
            Some(t) if t != NaiveTime::MIN => format!(
                "{}T{:02}:{:02}",
                self.date.format("%Y-%m-%d"),
                t.hour(),
                t.minute()
            ),
            _ => self.date.format("%Y-%m-%d").to_string(),
        }
    }
}

// -------------------------------- Value ----------------------------------- //

/// A parsed notation value.
///
/// `Int` carries a `wide` flag: a plain decimal literal outside the signed
/// 32-bit range is stored wide, and a wide value satisfies neither `int`- nor
/// `num`-typed schema fields. Objects preserve insertion order and have
/// unique keys; quoted keys keep their surrounding quotes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int { value: i128, wide: bool },
    Float(f64),
    Date(DateValue),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

pub const NULL: Value = Value::Null;

impl Value {
    pub fn int(value: i128) -> Self {
        let wide = value < i32::MIN as i128 || value > i32::MAX as i128;
        Value::Int { value, wide }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical text form used for exact-literal schema matches: quotes are
    /// already absent from stored strings, booleans are lower-case, integers
    /// decimal, dates in notation form. Containers have no canonical scalar
    /// text and never match a literal.
    pub fn canonical_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int { value, .. } => value.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Date(d) => d.display_text(),
            Value::String(s) => s.clone(),
            Value::Array(_) => "[array]".to_string(),
            Value::Object(_) => "[object]".to_string(),
        }
    }
}

/// Render a float so that it re-parses as a float: integral values keep one
/// fractional digit.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}
