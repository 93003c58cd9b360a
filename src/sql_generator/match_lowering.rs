//! MATCH lowering: graph patterns become joins over the triple store.
//!
//! Nodes join through `nodes` by `node_id`, labels and inline properties
//! through `rdf_labels`/`rdf_props`, relationships through `rdf_edges`.
//! Undirected relationships read from a UNION ALL CTE holding both
//! orientations so the engine can still drive the `(s, p, o_id)` index.

use log::debug;
use serde_json::Value;

use crate::cypher::ast::{Direction, Expression, MatchClause, NodePattern, RelationshipPattern};
use crate::schema;

use super::context::{ParamSink, TranslationContext, VarBinding};
use super::errors::TranslationError;
use super::expr_lowering::{self, lower_expression};
use super::Params;

const UNDIRECTED_CTE: &str = "UndirectedEdges";

pub fn lower_match_clauses(
    clauses: &[MatchClause],
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<(), TranslationError> {
    for clause in clauses {
        lower_match_clause(clause, ctx, params)?;
    }
    Ok(())
}

fn lower_match_clause(
    clause: &MatchClause,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<(), TranslationError> {
    ctx.set_sink(ParamSink::Join);
    // remember the first alias this clause introduces; an optional clause
    // uses it to keep its WHERE predicate null-tolerant
    let mut first_new_alias: Option<String> = None;

    for path in &clause.path_patterns {
        let start_was_bound = is_bound(ctx, &path.start);
        let mut left_id = ensure_node(&path.start, ctx, params, clause.optional, None)?;
        if first_new_alias.is_none() && !start_was_bound {
            first_new_alias = alias_of(ctx, &path.start);
        }

        for (rel, right) in &path.segments {
            let right_was_bound = is_bound(ctx, right);
            let link = lower_relationship(rel, &left_id, ctx, clause.optional)?;
            let right_id = ensure_node(right, ctx, params, clause.optional, Some(link))?;
            if first_new_alias.is_none() && !right_was_bound {
                first_new_alias = alias_of(ctx, right);
            }
            left_id = right_id;
        }
    }

    if let Some(where_clause) = &clause.where_clause {
        ctx.set_sink(ParamSink::Where);
        let condition = lower_expression(&where_clause.condition, ctx, params)?;
        if clause.optional {
            match first_new_alias {
                Some(alias) => ctx
                    .where_conditions
                    .push(format!("({} OR {}.node_id IS NULL)", condition, alias)),
                None => ctx.where_conditions.push(condition),
            }
        } else {
            ctx.where_conditions.push(condition);
        }
    }
    ctx.set_sink(ParamSink::Where);
    Ok(())
}

fn is_bound(ctx: &TranslationContext, node: &NodePattern) -> bool {
    node.name
        .as_deref()
        .is_some_and(|name| ctx.binding(name).is_some())
}

fn alias_of(ctx: &TranslationContext, node: &NodePattern) -> Option<String> {
    let name = node.name.as_deref()?;
    match ctx.binding(name) {
        Some(VarBinding::Node { alias }) => Some(alias.clone()),
        _ => None,
    }
}

/// Registers a node pattern and returns the SQL expression of its id.
///
/// `anchor` carries the edge-side id expression that pins this node when
/// it is reached through a relationship.
fn ensure_node(
    node: &NodePattern,
    ctx: &mut TranslationContext,
    params: &Params,
    optional: bool,
    anchor: Option<String>,
) -> Result<String, TranslationError> {
    let join_kw = if optional { "LEFT JOIN" } else { "JOIN" };

    if let Some(name) = &node.name {
        if let Some(binding) = ctx.binding(name).cloned() {
            let id_expr = match &binding {
                VarBinding::Node { alias } => format!("{}.node_id", alias),
                VarBinding::CteNode { cte, id_column } => {
                    let expr = format!("{}.{}", cte, id_column);
                    // first reference pulls the CTE into FROM
                    if !ctx.from_clauses.iter().any(|f| f == cte)
                        && !ctx.join_clauses.iter().any(|j| j.contains(cte))
                    {
                        match &anchor {
                            Some(anchor) => ctx
                                .join_clauses
                                .push(format!("{} {} ON {} = {}", join_kw, cte, expr, anchor)),
                            None => ctx.from_clauses.push(cte.clone()),
                        }
                    }
                    ctx.consume_cte(cte);
                    expr
                }
                _ => return Err(TranslationError::Unsupported(format!(
                    "'{}' is already bound to a non-node value",
                    name
                ))),
            };
            if let (Some(anchor), VarBinding::Node { .. }) = (&anchor, &binding) {
                ctx.where_conditions.push(format!("{} = {}", id_expr, anchor));
            }
            apply_labels_and_props(node, &id_expr, ctx, params, join_kw)?;
            return Ok(id_expr);
        }

        // fresh node variable: assign n{i} and join through `nodes`
        let alias = ctx.next_node_alias();
        let nodes = ctx.table(schema::NODES);
        let id_expr = format!("{}.node_id", alias);
        match &anchor {
            Some(anchor) => ctx.join_clauses.push(format!(
                "{} {} AS {} ON {} = {}",
                join_kw, nodes, alias, id_expr, anchor
            )),
            None if optional => ctx
                .join_clauses
                .push(format!("LEFT JOIN {} AS {} ON 1 = 1", nodes, alias)),
            None => ctx.from_clauses.push(format!("{} AS {}", nodes, alias)),
        }
        ctx.bind(name, VarBinding::Node { alias });
        apply_labels_and_props(node, &id_expr, ctx, params, join_kw)?;
        return Ok(id_expr);
    }

    // anonymous node: reached through an edge it needs no `nodes` join of
    // its own, the foreign key already guarantees existence
    if let Some(anchor) = anchor {
        apply_labels_and_props(node, &anchor, ctx, params, join_kw)?;
        return Ok(anchor);
    }

    let alias = ctx.next_node_alias();
    let nodes = ctx.table(schema::NODES);
    let id_expr = format!("{}.node_id", alias);
    if optional {
        ctx.join_clauses
            .push(format!("LEFT JOIN {} AS {} ON 1 = 1", nodes, alias));
    } else {
        ctx.from_clauses.push(format!("{} AS {}", nodes, alias));
    }
    apply_labels_and_props(node, &id_expr, ctx, params, join_kw)?;
    Ok(id_expr)
}

/// Label joins and inline-property joins for a node id.
fn apply_labels_and_props(
    node: &NodePattern,
    id_expr: &str,
    ctx: &mut TranslationContext,
    params: &Params,
    join_kw: &str,
) -> Result<(), TranslationError> {
    for label in &node.labels {
        let alias = ctx.next_label_alias();
        let labels = ctx.table(schema::RDF_LABELS);
        ctx.add_join_parameter(Value::String(label.clone()));
        ctx.join_clauses.push(format!(
            "{} {} AS {} ON {}.s = {} AND {}.label = ?",
            join_kw, labels, alias, alias, id_expr, alias
        ));
        ctx.metadata.tag("label_pushdown");
        ctx.metadata.index("pk_labels");
    }

    // inline property maps desugar to equality joins on rdf_props
    for (key, value_expr) in &node.properties {
        let alias = ctx.next_prop_alias();
        let props = ctx.table(schema::RDF_PROPS);
        let value = property_map_value(value_expr, params)?;
        ctx.add_join_parameter(Value::String(key.clone()));
        ctx.add_join_parameter(Value::String(value));
        ctx.join_clauses.push(format!(
            "{} {} AS {} ON {}.s = {} AND {}.key = ? AND {}.val = ?",
            join_kw, props, alias, alias, id_expr, alias, alias
        ));
        ctx.metadata.index("pk_props");
    }
    Ok(())
}

/// Inline pattern property values bind as their stored text representation.
fn property_map_value(expr: &Expression, params: &Params) -> Result<String, TranslationError> {
    let value = match expr {
        Expression::Literal(lit) => expr_lowering::literal_to_value(lit),
        Expression::Parameter(name) => expr_lowering::resolve_scalar_param(params, name)?,
        _ => {
            return Err(TranslationError::Unsupported(
                "pattern property values must be literals or parameters".into(),
            ))
        }
    };
    Ok(stored_value_text(&value))
}

/// The text form `rdf_props.val` stores for a value.
pub fn stored_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        other => other.to_string(),
    }
}

/// Lowers one relationship pattern (possibly a fixed multi-hop chain) and
/// returns the id expression the right-hand node anchors to.
fn lower_relationship(
    rel: &RelationshipPattern,
    left_id: &str,
    ctx: &mut TranslationContext,
    optional: bool,
) -> Result<String, TranslationError> {
    if !rel.properties.is_empty() {
        return Err(TranslationError::Unsupported(
            "relationship property filters in MATCH are not supported".into(),
        ));
    }

    let hops = match rel.hops {
        None => 1,
        Some(range) => match range.fixed_hops() {
            Some(k) if k >= 1 && k <= ctx.max_fixed_hops => k,
            _ => {
                return Err(TranslationError::VariableLengthRange {
                    max: ctx.max_fixed_hops,
                    found: format!("*{:?}..{:?}", range.min, range.max),
                })
            }
        },
    };

    if rel.name.is_some() && hops != 1 {
        return Err(TranslationError::Unsupported(
            "a multi-hop relationship cannot bind a variable".into(),
        ));
    }

    let join_kw = if optional { "LEFT JOIN" } else { "JOIN" };
    let table = match rel.direction {
        Direction::Either => {
            ensure_undirected_cte(ctx);
            UNDIRECTED_CTE.to_string()
        }
        _ => ctx.table(schema::RDF_EDGES),
    };

    debug!(
        "lowering relationship type={:?} direction={:?} hops={}",
        rel.rel_type, rel.direction, hops
    );

    let mut link = left_id.to_string();
    let mut last_alias = String::new();
    for _ in 0..hops {
        let alias = ctx.next_edge_alias();
        let mut on = match rel.direction {
            Direction::Incoming => format!("{}.o_id = {}", alias, link),
            _ => format!("{}.s = {}", alias, link),
        };
        if let Some(rel_type) = &rel.rel_type {
            ctx.add_join_parameter(Value::String(rel_type.clone()));
            on.push_str(&format!(" AND {}.p = ?", alias));
        }
        ctx.join_clauses
            .push(format!("{} {} AS {} ON {}", join_kw, table, alias, on));
        link = match rel.direction {
            Direction::Incoming => format!("{}.s", alias),
            _ => format!("{}.o_id", alias),
        };
        last_alias = alias;
    }
    ctx.metadata.index("u_spo");

    if let Some(name) = &rel.name {
        ctx.bind(name, VarBinding::Edge { alias: last_alias });
    }
    Ok(link)
}

/// Both orientations of every edge, so an undirected hop is one join.
fn ensure_undirected_cte(ctx: &mut TranslationContext) {
    if ctx.has_cte(UNDIRECTED_CTE) {
        return;
    }
    let edges = ctx.table(schema::RDF_EDGES);
    let body = format!(
        "SELECT s, p, o_id FROM {}\nUNION ALL\nSELECT o_id AS s, p, s AS o_id FROM {}",
        edges, edges
    );
    ctx.add_cte(UNDIRECTED_CTE, body, Vec::new());
    ctx.consume_cte(UNDIRECTED_CTE);
}
