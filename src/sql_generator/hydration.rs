//! Node hydration: expanding a node variable in RETURN into its id, labels
//! array and properties array.
//!
//! Labels and properties come back as JSON arrays built by correlated
//! scalar subqueries, so the outer query stays a single SELECT.

use crate::schema;

use super::context::TranslationContext;

/// JSON array of the node's label strings.
pub fn labels_subquery(ctx: &TranslationContext, id_expr: &str) -> String {
    format!(
        "(SELECT JSON_ARRAYAGG(l.label) FROM {} l WHERE l.s = {})",
        ctx.table(schema::RDF_LABELS),
        id_expr
    )
}

/// JSON array of `{key, value}` objects for the node's properties.
pub fn props_subquery(ctx: &TranslationContext, id_expr: &str) -> String {
    format!(
        "(SELECT JSON_ARRAYAGG(JSON_OBJECT('key' : p.key, 'value' : p.val)) FROM {} p WHERE p.s = {})",
        ctx.table(schema::RDF_PROPS),
        id_expr
    )
}

/// The three output columns a bare node variable hydrates into.
pub fn node_columns(ctx: &TranslationContext, id_expr: &str) -> Vec<String> {
    vec![
        format!("{} AS node_id", id_expr),
        format!("{} AS node_labels", labels_subquery(ctx, id_expr)),
        format!("{} AS node_props", props_subquery(ctx, id_expr)),
    ]
}
