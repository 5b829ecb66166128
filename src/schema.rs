//! The schema value model. Closed variant set; no serde here.
//!
//! A schema is a tree of [`SchemaNode`]s. Object field maps may contain
//! synthetic keys produced by macro expansion: `def$N` (named definitions,
//! own counter), `mix$N` and `props$N` (one shared counter); counters are
//! per-object and start at 1.

use indexmap::IndexMap;
use regex::Regex;

use crate::value::Value;

pub mod parse;

pub use parse::parse_schema;

/// A parsed schema: the field mapping of the top-level object shape.
#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: IndexMap<String, SchemaNode>,
}

/// One schema node: a kind plus the optional `##` description and the
/// declaration-ordered validator calls attached to it.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub description: Option<String>,
    pub validators: IndexMap<String, ValidatorConfig>,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self { kind, description: None, validators: IndexMap::new() }
    }
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Primitive type keyword (`undef|null|bool|int|num|date|string`) or a
    /// literal match value (e.g. `"admin"`, `true`, `42`).
    Field { type_name: String },
    Object { fields: IndexMap<String, SchemaNode> },
    Array { element: Box<SchemaNode> },
    /// `|`-separated alternatives, flattened; first match wins.
    Union { alternatives: Vec<SchemaNode> },
    /// Named, reusable object shape, registered into the per-check registry.
    Def { name: String, fields: IndexMap<String, SchemaNode> },
    /// Reference to a previously registered def; re-checks the current
    /// object against the resolved fields.
    Ref { name: String },
    /// Alternative full object shapes; the first alternative that matches
    /// with zero errors wins. A named alternative is the single-entry
    /// mapping `{ "ref$1": Ref{name} }`.
    Mix { alternatives: Vec<IndexMap<String, SchemaNode>> },
    /// Wildcard: every key of the input object must match `pattern` (when
    /// present) and its value must satisfy `element`.
    Props { pattern: Option<PropsPattern>, element: Box<SchemaNode> },
}

/// A compiled `@props(/pattern/)` key pattern. `source` is the pattern text
/// without its slashes, used for error messages.
#[derive(Debug, Clone)]
pub struct PropsPattern {
    pub source: String,
    pub regex: Regex,
}

/// A validator call as written in the schema: `raw` is the original textual
/// argument; `parsed` its typed conversion, or `Bool(true)` for flag-only
/// validators such as `unique`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    pub raw: String,
    pub parsed: Value,
}
