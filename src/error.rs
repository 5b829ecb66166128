//! Error types shared across the crate.
//!
//! Parse errors are position-addressable `(message, offset, length)` records;
//! offsets are byte offsets into the original text. Check errors are
//! path-qualified: the path is the ordered list of field names / array
//! indices (as decimal strings) leading to the offending value.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

// ------------------------------ ParseError -------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub length: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {}..{})", self.message, self.offset, self.offset + self.length)
    }
}

// ------------------------------ CheckError -------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckError {
    pub path: Vec<String>,
    pub message: String,
}

impl CheckError {
    /// Dot-joined path for display, e.g. `servers.0.port`.
    pub fn path_text(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path_text(), self.message)
        }
    }
}

// ------------------------------- LoadError -------------------------------- //

/// Outcome of loading a data file against its schema. At most one bucket is
/// produced per failed call: schema-parse errors, data-parse errors, or check
/// errors (plus I/O failure on either file).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schema has {} parse error(s)", .0.len())]
    SchemaErrors(Vec<ParseError>),
    #[error("data has {} parse error(s)", .0.len())]
    DataErrors(Vec<ParseError>),
    #[error("check failed with {} error(s)", .0.len())]
    CheckErrors(Vec<CheckError>),
}

// ------------------------------ Line context ------------------------------ //

/// The source line containing an offset, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineContext<'a> {
    /// Full text of the containing line, newline excluded.
    pub line: &'a str,
    /// Zero-based column within the line, in characters.
    pub column: usize,
    /// One-based line number.
    pub line_number: usize,
}

/// Locate `offset` within `text` by scanning to the nearest newlines.
pub fn context_at(text: &str, offset: usize) -> LineContext<'_> {
    let offset = offset.min(text.len());
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len());
    LineContext {
        line: &text[line_start..line_end],
        column: text[line_start..offset].chars().count(),
        line_number: text[..line_start].matches('\n').count() + 1,
    }
}
