//! File-level loading: read a data file, resolve its schema, parse both,
//! and run the check.
//!
//! The schema comes from an explicit path when given, else from the file's
//! `@schema(...)` preamble directive resolved relative to the data file's
//! directory. A file with no schema at all parses without checking.

use std::fs;
use std::path::{Path, PathBuf};

use crate::check;
use crate::error::LoadError;
use crate::parse;
use crate::schema;
use crate::value::Value;

/// Load and check one data file. Returns the parsed value tree on success.
pub fn load_file(path: &Path, explicit_schema: Option<&Path>) -> Result<Value, LoadError> {
    let text = read(path)?;
    let doc = parse::parse_document(&text).map_err(LoadError::DataErrors)?;

    let schema_path = match explicit_schema {
        Some(p) => Some(p.to_path_buf()),
        None => doc
            .schema_directive
            .as_deref()
            .map(|directive| resolve_schema_path(path, directive)),
    };
    let Some(schema_path) = schema_path else {
        return Ok(doc.value);
    };

    let schema_text = read(&schema_path)?;
    let schema = schema::parse_schema(&schema_text).map_err(LoadError::SchemaErrors)?;
    check::check(&doc.value, &schema).map_err(LoadError::CheckErrors)?;
    Ok(doc.value)
}

/// A directive path is relative to the data file's directory; absolute
/// directives pass through unchanged.
fn resolve_schema_path(data_path: &Path, directive: &str) -> PathBuf {
    let directive = Path::new(directive);
    if directive.is_absolute() {
        return directive.to_path_buf();
    }
    match data_path.parent() {
        Some(dir) => dir.join(directive),
        None => directive.to_path_buf(),
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// -------------------------------- Tests ----------------------------------- //
