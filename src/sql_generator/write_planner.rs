//! Transactional write planning for CREATE, MERGE, SET and DELETE.
//!
//! A write query emits an ordered statement list the caller must run
//! inside one transaction. Statement order encodes the referential
//! dependencies of the triple store: nodes before labels/properties/
//! embeddings/edges, and deletes in the reverse direction.

use std::collections::HashMap;

use log::debug;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::cypher::ast::{
    CypherQuery, Direction, Expression, NodePattern, PathPattern, RelationshipPattern, SetItem,
};
use crate::schema;

use super::context::{TranslationContext, VarBinding};
use super::errors::TranslationError;
use super::expr_lowering::{literal_to_value, resolve_param, resolve_scalar_param, type_name};
use super::match_lowering::stored_value_text;
use super::Params;

/// Node ids resolved at translation time, keyed by variable.
type KnownIds = HashMap<String, String>;

pub fn plan_writes(
    query: &CypherQuery,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<(), TranslationError> {
    let mut known_ids = KnownIds::new();

    for clause in &query.create_clauses {
        for path in &clause.path_patterns {
            plan_path(path, false, ctx, params, &mut known_ids)?;
        }
    }
    for clause in &query.merge_clauses {
        plan_path(&clause.path_pattern, true, ctx, params, &mut known_ids)?;
    }

    if let Some(set_clause) = &query.set_clause {
        for item in &set_clause.items {
            plan_set_item(item, ctx, params, &known_ids)?;
        }
    }

    if let Some(delete_clause) = &query.delete_clause {
        for var in &delete_clause.variables {
            plan_delete(var, ctx, &known_ids)?;
        }
    }

    ctx.metadata.tag("transactional_write");
    Ok(())
}

/// Creates/merges the nodes of a path, then its relationships.
fn plan_path(
    path: &PathPattern,
    merge: bool,
    ctx: &mut TranslationContext,
    params: &Params,
    known_ids: &mut KnownIds,
) -> Result<(), TranslationError> {
    let mut endpoints: Vec<EndpointRef> = Vec::new();
    for node in path.nodes() {
        endpoints.push(plan_node(node, merge, ctx, params, known_ids)?);
    }

    for (index, (rel, _)) in path.segments.iter().enumerate() {
        let left = endpoints[index].clone();
        let right = endpoints[index + 1].clone();
        plan_relationship(rel, left, right, merge, ctx, params)?;
    }
    Ok(())
}

/// How an edge statement refers to an endpoint node.
#[derive(Debug, Clone)]
enum EndpointRef {
    /// Id known at translation time (created here, or given literally).
    Known(String),
    /// Bound by a preceding MATCH; resolves through the lowered match.
    Matched(String),
}

/// Plans the statements for one node pattern and returns how edges should
/// reference it.
fn plan_node(
    node: &NodePattern,
    merge: bool,
    ctx: &mut TranslationContext,
    params: &Params,
    known_ids: &mut KnownIds,
) -> Result<EndpointRef, TranslationError> {
    if let Some(name) = &node.name {
        if let Some(id) = known_ids.get(name) {
            // second appearance in the same write: a reference, not a new node
            return Ok(EndpointRef::Known(id.clone()));
        }
        if matches!(
            ctx.binding(name),
            Some(VarBinding::Node { .. }) | Some(VarBinding::CteNode { .. })
        ) {
            return Ok(EndpointRef::Matched(name.clone()));
        }
    }

    // resolve the node id: inline `id` property, otherwise mint one
    let explicit_id = node
        .properties
        .iter()
        .find(|(key, _)| key == "id")
        .map(|(_, expr)| write_value(expr, params))
        .transpose()?;
    let (id, minted) = match explicit_id {
        Some(value) => (stored_value_text(&value), false),
        None => (Uuid::new_v4().to_string(), true),
    };
    debug!("planning node write id={} merge={}", id, merge);

    let nodes = ctx.table(schema::NODES);
    let labels = ctx.table(schema::RDF_LABELS);
    let props = ctx.table(schema::RDF_PROPS);
    let embeddings = ctx.table(schema::NODE_EMBEDDINGS);

    // 1. the node row, idempotent for CREATE and MERGE alike
    ctx.push_stage(
        format!(
            "INSERT INTO {} (node_id)\nSELECT ?\nWHERE NOT EXISTS (SELECT 1 FROM {} WHERE node_id = ?)",
            nodes, nodes
        ),
        vec![Value::String(id.clone()), Value::String(id.clone())],
    );

    // 2. one row per label
    for label in &node.labels {
        if merge {
            ctx.push_stage(
                format!(
                    "INSERT INTO {} (s, label)\nSELECT ?, ?\nWHERE NOT EXISTS (SELECT 1 FROM {} WHERE s = ? AND label = ?)",
                    labels, labels
                ),
                vec![
                    Value::String(id.clone()),
                    Value::String(label.clone()),
                    Value::String(id.clone()),
                    Value::String(label.clone()),
                ],
            );
        } else {
            ctx.push_stage(
                format!("INSERT INTO {} (s, label)\nVALUES (?, ?)", labels),
                vec![Value::String(id.clone()), Value::String(label.clone())],
            );
        }
    }

    // 3. one row per property; the `id` property is always stored so the
    // node stays queryable by n.id, the embedding is diverted below
    let mut prop_rows: Vec<(String, String)> = Vec::new();
    if minted {
        prop_rows.push(("id".to_string(), id.clone()));
    }
    let mut embedding: Option<Value> = None;
    for (key, expr) in &node.properties {
        if key == "embedding" {
            embedding = Some(write_value(expr, params)?);
            continue;
        }
        let value = write_value(expr, params)?;
        prop_rows.push((key.clone(), stored_value_text(&value)));
    }
    for (key, val) in prop_rows {
        if merge {
            ctx.push_stage(
                format!(
                    "INSERT INTO {} (s, key, val)\nSELECT ?, ?, ?\nWHERE NOT EXISTS (SELECT 1 FROM {} WHERE s = ? AND key = ?)",
                    props, props
                ),
                vec![
                    Value::String(id.clone()),
                    Value::String(key.clone()),
                    Value::String(val),
                    Value::String(id.clone()),
                    Value::String(key),
                ],
            );
        } else {
            ctx.push_stage(
                format!("INSERT INTO {} (s, key, val)\nVALUES (?, ?, ?)", props),
                vec![
                    Value::String(id.clone()),
                    Value::String(key),
                    Value::String(val),
                ],
            );
        }
    }

    // 4. the embedding row through the engine's vector parser
    if let Some(value) = embedding {
        let json = embedding_json(&value)?;
        if merge {
            ctx.push_stage(
                format!(
                    "INSERT INTO {} (id, emb)\nSELECT ?, TO_VECTOR(?)\nWHERE NOT EXISTS (SELECT 1 FROM {} WHERE id = ?)",
                    embeddings, embeddings
                ),
                vec![
                    Value::String(id.clone()),
                    Value::String(json),
                    Value::String(id.clone()),
                ],
            );
        } else {
            ctx.push_stage(
                format!("INSERT INTO {} (id, emb)\nVALUES (?, TO_VECTOR(?))", embeddings),
                vec![Value::String(id.clone()), Value::String(json)],
            );
        }
    }

    if let Some(name) = &node.name {
        known_ids.insert(name.clone(), id.clone());
    }
    Ok(EndpointRef::Known(id))
}

/// Plans the `rdf_edges` insert for one relationship.
fn plan_relationship(
    rel: &RelationshipPattern,
    left: EndpointRef,
    right: EndpointRef,
    merge: bool,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<(), TranslationError> {
    let rel_type = rel.rel_type.as_ref().ok_or_else(|| {
        TranslationError::Unsupported("created relationships must name a type".into())
    })?;
    if rel.hops.is_some() {
        return Err(TranslationError::Unsupported(
            "variable-length relationships cannot be created".into(),
        ));
    }

    let (source, target) = match rel.direction {
        Direction::Outgoing => (left, right),
        Direction::Incoming => (right, left),
        Direction::Either => {
            return Err(TranslationError::Unsupported(
                "created relationships must be directed".into(),
            ))
        }
    };

    let qualifiers = if rel.properties.is_empty() {
        Value::Null
    } else {
        let mut map = Map::new();
        for (key, expr) in &rel.properties {
            map.insert(key.clone(), write_value(expr, params)?);
        }
        Value::String(Value::Object(map).to_string())
    };

    let edges = ctx.table(schema::RDF_EDGES);
    let matched = matches!(&source, EndpointRef::Matched(_))
        || matches!(&target, EndpointRef::Matched(_));

    // SELECT-position params bind before anything in the match fragments
    let mut select_params: Vec<Value> = Vec::new();
    let source_expr = endpoint_sql(&source, ctx, &mut select_params)?;
    select_params.push(Value::String(rel_type.clone()));
    let target_expr = endpoint_sql(&target, ctx, &mut select_params)?;
    select_params.push(qualifiers);

    let mut sql = format!(
        "INSERT INTO {} (s, p, o_id, qualifiers)\nSELECT {}, ?, {}, ?",
        edges, source_expr, target_expr
    );
    let mut stage_params = select_params;

    if matched {
        if !ctx.from_clauses.is_empty() {
            sql.push_str(&format!("\nFROM {}", ctx.from_clauses.join(", ")));
        }
        for join in &ctx.join_clauses {
            sql.push('\n');
            sql.push_str(join);
        }
        let mut conditions = ctx.where_conditions.clone();
        stage_params.extend(ctx.subquery_parameters());
        if merge {
            conditions.push(format!(
                "NOT EXISTS (SELECT 1 FROM {} WHERE s = {} AND p = ? AND o_id = {})",
                edges, source_expr, target_expr
            ));
        }
        if !conditions.is_empty() {
            sql.push_str(&format!("\nWHERE {}", conditions.join(" AND ")));
        }
        if merge {
            // the NOT EXISTS probe re-binds the known endpoints and type
            if let EndpointRef::Known(id) = &source {
                stage_params.push(Value::String(id.clone()));
            }
            stage_params.push(Value::String(rel_type.clone()));
            if let EndpointRef::Known(id) = &target {
                stage_params.push(Value::String(id.clone()));
            }
        }
    } else if merge {
        sql.push_str(&format!(
            "\nWHERE NOT EXISTS (SELECT 1 FROM {} WHERE s = ? AND p = ? AND o_id = ?)",
            edges
        ));
        if let (EndpointRef::Known(s), EndpointRef::Known(o)) = (&source, &target) {
            stage_params.push(Value::String(s.clone()));
            stage_params.push(Value::String(rel_type.clone()));
            stage_params.push(Value::String(o.clone()));
        }
    }

    ctx.push_stage(sql, stage_params);
    ctx.metadata.index("u_spo");
    Ok(())
}

fn endpoint_sql(
    endpoint: &EndpointRef,
    ctx: &TranslationContext,
    select_params: &mut Vec<Value>,
) -> Result<String, TranslationError> {
    match endpoint {
        EndpointRef::Known(id) => {
            select_params.push(Value::String(id.clone()));
            Ok("?".to_string())
        }
        EndpointRef::Matched(var) => ctx.id_expr(var),
    }
}

/// `SET v.k = value` becomes an UPDATE / insert-if-missing pair.
fn plan_set_item(
    item: &SetItem,
    ctx: &mut TranslationContext,
    params: &Params,
    known_ids: &KnownIds,
) -> Result<(), TranslationError> {
    let value = write_value(&item.value, params)?;
    let val_text = stored_value_text(&value);
    let key = &item.target.key;
    let var = &item.target.base;
    let props = ctx.table(schema::RDF_PROPS);

    if let Some(id) = known_ids.get(var) {
        ctx.push_stage(
            format!("UPDATE {} SET val = ?\nWHERE s = ? AND key = ?", props),
            vec![
                Value::String(val_text.clone()),
                Value::String(id.clone()),
                Value::String(key.clone()),
            ],
        );
        ctx.push_stage(
            format!(
                "INSERT INTO {} (s, key, val)\nSELECT ?, ?, ?\nWHERE NOT EXISTS (SELECT 1 FROM {} WHERE s = ? AND key = ?)",
                props, props
            ),
            vec![
                Value::String(id.clone()),
                Value::String(key.clone()),
                Value::String(val_text),
                Value::String(id.clone()),
                Value::String(key.clone()),
            ],
        );
        return Ok(());
    }

    // matched node: resolve the victim set through the lowered match
    let id_expr = ctx.id_expr(var)?;
    let subquery = ctx.build_id_subquery(&id_expr);
    let sub_params = ctx.subquery_parameters();

    let mut update_params = vec![Value::String(val_text.clone())];
    update_params.extend(sub_params.iter().cloned());
    update_params.push(Value::String(key.clone()));
    ctx.push_stage(
        format!(
            "UPDATE {} SET val = ?\nWHERE s IN (\n{}\n) AND key = ?",
            props, subquery
        ),
        update_params,
    );

    let mut insert_sql = format!(
        "INSERT INTO {} (s, key, val)\nSELECT {}, ?, ?",
        props, id_expr
    );
    if !ctx.from_clauses.is_empty() {
        insert_sql.push_str(&format!("\nFROM {}", ctx.from_clauses.join(", ")));
    }
    for join in &ctx.join_clauses {
        insert_sql.push('\n');
        insert_sql.push_str(join);
    }
    let mut conditions = ctx.where_conditions.clone();
    conditions.push(format!(
        "NOT EXISTS (SELECT 1 FROM {} WHERE s = {} AND key = ?)",
        props, id_expr
    ));
    insert_sql.push_str(&format!("\nWHERE {}", conditions.join(" AND ")));

    let mut insert_params = vec![Value::String(key.clone()), Value::String(val_text)];
    insert_params.extend(sub_params);
    insert_params.push(Value::String(key.clone()));
    ctx.push_stage(insert_sql, insert_params);
    Ok(())
}

/// DELETE emits exactly five statements per node, childmost tables first.
fn plan_delete(
    var: &str,
    ctx: &mut TranslationContext,
    known_ids: &KnownIds,
) -> Result<(), TranslationError> {
    let embeddings = ctx.table(schema::NODE_EMBEDDINGS);
    let edges = ctx.table(schema::RDF_EDGES);
    let props = ctx.table(schema::RDF_PROPS);
    let labels = ctx.table(schema::RDF_LABELS);
    let nodes = ctx.table(schema::NODES);

    if let Some(id) = known_ids.get(var) {
        let id = Value::String(id.clone());
        ctx.push_stage(
            format!("DELETE FROM {} WHERE id = ?", embeddings),
            vec![id.clone()],
        );
        ctx.push_stage(
            format!("DELETE FROM {} WHERE s = ? OR o_id = ?", edges),
            vec![id.clone(), id.clone()],
        );
        ctx.push_stage(format!("DELETE FROM {} WHERE s = ?", props), vec![id.clone()]);
        ctx.push_stage(format!("DELETE FROM {} WHERE s = ?", labels), vec![id.clone()]);
        ctx.push_stage(format!("DELETE FROM {} WHERE node_id = ?", nodes), vec![id]);
        return Ok(());
    }

    let id_expr = ctx.id_expr(var)?;
    let subquery = ctx.build_id_subquery(&id_expr);
    let sub_params = ctx.subquery_parameters();

    ctx.push_stage(
        format!("DELETE FROM {} WHERE id IN (\n{}\n)", embeddings, subquery),
        sub_params.clone(),
    );
    let mut edge_params = sub_params.clone();
    edge_params.extend(sub_params.iter().cloned());
    ctx.push_stage(
        format!(
            "DELETE FROM {} WHERE s IN (\n{}\n) OR o_id IN (\n{}\n)",
            edges, subquery, subquery
        ),
        edge_params,
    );
    ctx.push_stage(
        format!("DELETE FROM {} WHERE s IN (\n{}\n)", props, subquery),
        sub_params.clone(),
    );
    ctx.push_stage(
        format!("DELETE FROM {} WHERE s IN (\n{}\n)", labels, subquery),
        sub_params.clone(),
    );
    ctx.push_stage(
        format!("DELETE FROM {} WHERE node_id IN (\n{}\n)", nodes, subquery),
        sub_params,
    );
    Ok(())
}

/// A value assignable by a write: a literal or a caller parameter.
fn write_value(expr: &Expression, params: &Params) -> Result<Value, TranslationError> {
    match expr {
        Expression::Literal(lit) => Ok(literal_to_value(lit)),
        Expression::Parameter(name) => match resolve_param(params, name)? {
            list @ Value::Array(_) => Ok(list.clone()),
            _ => resolve_scalar_param(params, name),
        },
        Expression::List(items) => {
            let values: Result<Vec<Value>, TranslationError> = items
                .iter()
                .map(|item| match item {
                    Expression::Literal(lit) => Ok(literal_to_value(lit)),
                    Expression::Parameter(name) => resolve_scalar_param(params, name),
                    _ => Err(TranslationError::Unsupported(
                        "list values in writes must be literals or parameters".into(),
                    )),
                })
                .collect();
            Ok(Value::Array(values?))
        }
        _ => Err(TranslationError::Unsupported(
            "write values must be literals or parameters".into(),
        )),
    }
}

/// JSON text handed to TO_VECTOR for an embedding property.
fn embedding_json(value: &Value) -> Result<String, TranslationError> {
    match value {
        Value::Array(items) => {
            let mut vector: Vec<f64> = Vec::with_capacity(items.len());
            for item in items {
                match item.as_f64() {
                    Some(v) => vector.push(v),
                    None => {
                        return Err(TranslationError::InvalidArgument {
                            what: "embedding property",
                            detail: format!("expected numbers, got {}", type_name(item)),
                        })
                    }
                }
            }
            Ok(serde_json::to_string(&vector).unwrap_or_else(|_| "[]".to_string()))
        }
        other => Err(TranslationError::InvalidArgument {
            what: "embedding property",
            detail: format!("expected a list of numbers, got {}", type_name(other)),
        }),
    }
}
