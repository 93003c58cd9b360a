//! Lowering of `CALL ivg.vector.search(label, property, target, limit)` to
//! the `VecSearch` common table expression.
//!
//! The CTE ranks embeddings by similarity against the target and keeps the
//! top N; downstream clauses compose with the yielded `node` and `score`
//! columns. Mode 1 binds a literal vector through `TO_VECTOR(?)`; Mode 2
//! embeds a text target through `EMBEDDING(?, ?)` and requires the
//! `embedding_config` option.

use log::debug;
use serde_json::Value;

use crate::cypher::ast::{Expression, Literal, ProcedureCall};
use crate::schema;

use super::context::{TranslationContext, VarBinding};
use super::errors::TranslationError;
use super::expr_lowering::{resolve_param, type_name};
use super::Params;

pub const VECTOR_SEARCH_PROCEDURE: &str = "ivg.vector.search";
pub const VEC_SEARCH_CTE: &str = "VecSearch";

enum SearchTarget {
    /// Literal vector, bound as its JSON serialization.
    Vector(Vec<f64>),
    /// Text to embed on the engine side.
    Text(String),
}

pub fn lower_procedure_call(
    call: &ProcedureCall,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<(), TranslationError> {
    if call.name != VECTOR_SEARCH_PROCEDURE {
        return Err(TranslationError::UnknownProcedure(call.name.clone()));
    }
    if call.arguments.len() < 4 {
        return Err(TranslationError::ProcedureArity(call.arguments.len()));
    }

    let label = string_arg(&call.arguments[0], params, "label argument")?;
    // the property argument names the embedding being searched; the store
    // keeps one embedding per node, so it is validated but not emitted
    let _property = string_arg(&call.arguments[1], params, "property argument")?;
    let target = target_arg(&call.arguments[2], params)?;
    let limit = limit_arg(&call.arguments[3], params)?;

    let similarity_fn = match call.option("similarity") {
        None => "VECTOR_COSINE",
        Some(Expression::Literal(Literal::String(s))) => match s.as_str() {
            "cosine" => "VECTOR_COSINE",
            "dot_product" => "VECTOR_DOT_PRODUCT",
            other => return Err(TranslationError::UnknownSimilarity(other.to_string())),
        },
        Some(other) => {
            return Err(TranslationError::UnknownSimilarity(other.to_string()))
        }
    };

    let mut cte_params: Vec<Value> = Vec::new();
    let target_sql = match target {
        SearchTarget::Vector(vector) => {
            let json = serde_json::to_string(&vector).unwrap_or_else(|_| "[]".to_string());
            cte_params.push(Value::String(json));
            "TO_VECTOR(?)".to_string()
        }
        SearchTarget::Text(text) => {
            let config = match call.option("embedding_config") {
                Some(Expression::Literal(Literal::String(s))) => s.clone(),
                _ => return Err(TranslationError::MissingEmbeddingConfig),
            };
            cte_params.push(Value::String(text));
            cte_params.push(Value::String(config));
            "EMBEDDING(?, ?)".to_string()
        }
    };
    cte_params.push(Value::String(label));

    let body = format!(
        "SELECT TOP {} e.id AS node_id, {}(e.emb, {}) AS score\nFROM {} AS e\nJOIN {} AS l ON l.s = e.id\nWHERE l.label = ?\nORDER BY score DESC",
        limit,
        similarity_fn,
        target_sql,
        ctx.table(schema::NODE_EMBEDDINGS),
        ctx.table(schema::RDF_LABELS),
    );
    debug!("vector search CTE: top {} by {}", limit, similarity_fn);
    ctx.add_cte(VEC_SEARCH_CTE, body, cte_params);
    ctx.metadata.tag("vector_cte");
    ctx.metadata.index("hnsw_emb");
    ctx.metadata.estimated_rows = Some(limit as u64);

    // bind the yielded columns; an empty YIELD exposes both
    let yields: Vec<&str> = if call.yield_items.is_empty() {
        vec!["node", "score"]
    } else {
        call.yield_items.iter().map(String::as_str).collect()
    };
    for item in yields {
        match item {
            "node" => ctx.bind(
                "node",
                VarBinding::CteNode {
                    cte: VEC_SEARCH_CTE.to_string(),
                    id_column: "node_id".to_string(),
                },
            ),
            "score" => ctx.bind(
                "score",
                VarBinding::Scalar {
                    sql: format!("{}.score", VEC_SEARCH_CTE),
                },
            ),
            other => {
                return Err(TranslationError::InvalidArgument {
                    what: "YIELD column",
                    detail: format!("'{}' is not yielded by {}", other, VECTOR_SEARCH_PROCEDURE),
                })
            }
        }
    }
    Ok(())
}

fn string_arg(
    expr: &Expression,
    params: &Params,
    what: &'static str,
) -> Result<String, TranslationError> {
    match expr {
        Expression::Literal(Literal::String(s)) => Ok(s.clone()),
        Expression::Parameter(name) => match resolve_param(params, name)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(TranslationError::ParameterType {
                name: name.clone(),
                expected: "a string",
                found: type_name(other).to_string(),
            }),
        },
        _ => Err(TranslationError::InvalidArgument {
            what,
            detail: "expected a string".into(),
        }),
    }
}

fn target_arg(expr: &Expression, params: &Params) -> Result<SearchTarget, TranslationError> {
    match expr {
        Expression::List(items) => {
            let mut vector = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Expression::Literal(Literal::Integer(v)) => vector.push(*v as f64),
                    Expression::Literal(Literal::Float(v)) => vector.push(*v),
                    _ => {
                        return Err(TranslationError::InvalidArgument {
                            what: "search target",
                            detail: "vector elements must be numbers".into(),
                        })
                    }
                }
            }
            Ok(SearchTarget::Vector(vector))
        }
        Expression::Literal(Literal::String(s)) => Ok(SearchTarget::Text(s.clone())),
        Expression::Parameter(name) => match resolve_param(params, name)? {
            Value::Array(items) => {
                let mut vector = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_f64() {
                        Some(v) => vector.push(v),
                        None => {
                            return Err(TranslationError::ParameterType {
                                name: name.clone(),
                                expected: "a list of numbers",
                                found: type_name(item).to_string(),
                            })
                        }
                    }
                }
                Ok(SearchTarget::Vector(vector))
            }
            Value::String(s) => Ok(SearchTarget::Text(s.clone())),
            other => Err(TranslationError::ParameterType {
                name: name.clone(),
                expected: "a vector or a string",
                found: type_name(other).to_string(),
            }),
        },
        _ => Err(TranslationError::InvalidArgument {
            what: "search target",
            detail: "expected a vector literal or a string".into(),
        }),
    }
}

fn limit_arg(expr: &Expression, params: &Params) -> Result<i64, TranslationError> {
    let limit = match expr {
        Expression::Literal(Literal::Integer(v)) => *v,
        Expression::Parameter(name) => {
            let value = resolve_param(params, name)?;
            value
                .as_i64()
                .ok_or_else(|| TranslationError::ParameterType {
                    name: name.clone(),
                    expected: "an integer",
                    found: type_name(value).to_string(),
                })?
        }
        _ => {
            return Err(TranslationError::InvalidArgument {
                what: "limit argument",
                detail: "expected an integer".into(),
            })
        }
    };
    if limit < 1 {
        return Err(TranslationError::InvalidArgument {
            what: "limit argument",
            detail: format!("must be positive, got {}", limit),
        });
    }
    Ok(limit)
}
