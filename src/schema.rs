//! Fixed triple-store schema: table names, schema-prefix handling, and
//! identifier sanitization.
//!
//! The compiler emits SQL against `nodes`, `rdf_labels`, `rdf_props`,
//! `rdf_edges` and `kg_NodeEmbeddings`, each optionally qualified with a
//! configured schema prefix (e.g. `Graph_KG.nodes`). The prefix lives on
//! the translation context; the process-wide value here is a convenience
//! shim for callers that do not plumb a context.

use std::sync::RwLock;

use lazy_static::lazy_static;
use thiserror::Error;

pub const NODES: &str = "nodes";
pub const RDF_LABELS: &str = "rdf_labels";
pub const RDF_PROPS: &str = "rdf_props";
pub const RDF_EDGES: &str = "rdf_edges";
pub const NODE_EMBEDDINGS: &str = "kg_NodeEmbeddings";

lazy_static! {
    static ref SCHEMA_PREFIX: RwLock<String> = RwLock::new(String::new());
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Invalid schema identifier '{0}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),
}

/// True for identifiers safe to interpolate into SQL table references.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Sets the process-wide schema prefix. An empty string leaves table
/// references unqualified.
pub fn set_schema_prefix(prefix: &str) -> Result<(), SchemaError> {
    if !prefix.is_empty() && !is_valid_identifier(prefix) {
        return Err(SchemaError::InvalidIdentifier(prefix.to_string()));
    }
    let mut guard = SCHEMA_PREFIX
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = prefix.to_string();
    Ok(())
}

/// Returns the process-wide schema prefix.
pub fn schema_prefix() -> String {
    SCHEMA_PREFIX
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Schema-qualifies a table name with the given prefix.
pub fn qualified(prefix: &str, table: &str) -> String {
    if prefix.is_empty() {
        table.to_string()
    } else {
        format!("{}.{}", prefix, table)
    }
}
