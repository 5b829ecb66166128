//! A compact, human-writable structured-data notation with a companion
//! schema notation.
//!
//! Data files hold one top-level object of typed literals (null, bool,
//! 32-bit-range and wide integers, floats, dates, strings) plus arrays and
//! nested objects. Schema files describe the expected shape: primitive
//! types, exact-literal matches, unions, arrays, named reusable definitions
//! (`@def` / `@mix`), and wildcard key patterns (`@props`), with
//! per-field validators such as `min`, `maxlen`, or `pattern`.
//!
//! Error positions are byte offsets into the source text; use
//! [`error::context_at`] to map one to a line and column for display.

pub mod check;
pub mod cli;
pub mod error;
pub mod lex;
pub mod literal;
pub mod parse;
pub mod reader;
pub mod schema;
pub mod stringify;
pub mod value;

pub use check::check;
pub use error::{CheckError, LoadError, ParseError};
pub use parse::{Document, parse_data, parse_document};
pub use reader::load_file;
pub use schema::{Schema, parse_schema};
pub use stringify::{Style, stringify, stringify_styled};
pub use value::Value;
