//! SQL generation: walks a parsed [`CypherQuery`] in clause order and
//! emits a [`SqlProgram`] for the RDF-style triple store.

use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use crate::config::CompilerConfig;
use crate::cypher::ast::{
    CypherQuery, Expression, PageValue, ReturnClause, ReturnItem, SortOrder, WithClause,
};

mod context;
mod errors;
mod expr_lowering;
mod function_registry;
mod hydration;
mod match_lowering;
mod program;
mod vector_search;
mod write_planner;

pub use context::{ParamSink, TranslationContext, VarBinding};
pub use errors::TranslationError;
pub use function_registry::{get_function_mapping, is_function_supported, sql_function_name};
pub use program::{QueryMetadata, SqlParameters, SqlProgram, SqlStatements};
pub use vector_search::{VECTOR_SEARCH_PROCEDURE, VEC_SEARCH_CTE};

/// Caller-supplied parameter mapping (`$name` → value).
pub type Params = HashMap<String, Value>;

/// Translates a query using the process-wide schema prefix.
pub fn translate_to_sql(
    query: &CypherQuery,
    params: Option<&Params>,
) -> Result<SqlProgram, TranslationError> {
    let mut ctx = TranslationContext::new();
    translate_into(query, params, &mut ctx)
}

/// Translates a query with an explicit compiler configuration.
pub fn translate_to_sql_with_config(
    query: &CypherQuery,
    params: Option<&Params>,
    config: &CompilerConfig,
) -> Result<SqlProgram, TranslationError> {
    let mut ctx = TranslationContext::with_schema_prefix(config.schema_prefix.clone());
    ctx.max_fixed_hops = config.max_fixed_hops;
    translate_into(query, params, &mut ctx)
}

/// Lowers the procedure call for callers that manage their own context.
pub fn translate_procedure_call(
    call: &crate::cypher::ast::ProcedureCall,
    ctx: &mut TranslationContext,
    params: Option<&Params>,
) -> Result<(), TranslationError> {
    let empty = Params::new();
    vector_search::lower_procedure_call(call, ctx, params.unwrap_or(&empty))
}

fn translate_into(
    query: &CypherQuery,
    params: Option<&Params>,
    ctx: &mut TranslationContext,
) -> Result<SqlProgram, TranslationError> {
    let empty = Params::new();
    let params = params.unwrap_or(&empty);

    if let Some(call) = &query.procedure_call {
        vector_search::lower_procedure_call(call, ctx, params)?;
    }
    match_lowering::lower_match_clauses(&query.match_clauses, ctx, params)?;

    if let Some(with_clause) = &query.with_clause {
        apply_with_clause(with_clause, ctx)?;
    }

    if query.is_write() {
        if query.procedure_call.is_some() {
            return Err(TranslationError::Unsupported(
                "procedure calls cannot be combined with writing clauses".into(),
            ));
        }
        if query.return_clause.is_some() {
            return Err(TranslationError::Unsupported(
                "RETURN after a writing clause is not supported".into(),
            ));
        }
        write_planner::plan_writes(query, ctx, params)?;
        debug!("planned transactional program with {} statements", ctx.stages.len());
        return Ok(SqlProgram::transactional(
            ctx.stages.clone(),
            ctx.stage_parameters.clone(),
            ctx.metadata.clone(),
        ));
    }

    // a CTE nothing re-read still feeds the outer SELECT
    for cte in ctx.unconsumed_ctes() {
        ctx.from_clauses.push(cte.clone());
        ctx.consume_cte(&cte);
    }

    let implicit_return;
    let return_clause = match &query.return_clause {
        Some(clause) => clause,
        None => match &query.procedure_call {
            // a bare CALL … YIELD returns its yield items
            Some(call) if !call.yield_items.is_empty() => {
                implicit_return = ReturnClause {
                    distinct: false,
                    items: call
                        .yield_items
                        .iter()
                        .map(|name| ReturnItem {
                            expression: Expression::Variable(name.clone()),
                            alias: None,
                        })
                        .collect(),
                    order_by: Vec::new(),
                    skip: None,
                    limit: None,
                };
                &implicit_return
            }
            _ => {
                return Err(TranslationError::Unsupported(
                    "a reading query requires a RETURN clause".into(),
                ))
            }
        },
    };

    let (limit, skip) = lower_return_clause(return_clause, ctx, params)?;
    if let Some(limit) = limit {
        ctx.metadata.estimated_rows = Some(limit as u64);
    }

    let sql = ctx.build_sql(return_clause.distinct, limit, skip);
    Ok(SqlProgram::single(
        sql,
        ctx.all_parameters(),
        ctx.metadata.clone(),
    ))
}

/// WITH as alias projection: new names bound to already-lowered values.
fn apply_with_clause(
    with_clause: &WithClause,
    ctx: &mut TranslationContext,
) -> Result<(), TranslationError> {
    for item in &with_clause.items {
        match (&item.expression, &item.alias) {
            (Expression::Variable(name), alias) => {
                let binding = ctx.resolve(name)?.clone();
                if let Some(alias) = alias {
                    ctx.bind(alias, binding);
                }
            }
            (Expression::PropertyAccessExp(access), Some(alias)) => {
                let prop_alias = ctx.property_join(&access.base, &access.key)?;
                ctx.bind(
                    alias,
                    VarBinding::Scalar {
                        sql: format!("{}.val", prop_alias),
                    },
                );
            }
            (Expression::PropertyAccessExp(_), None) => {
                return Err(TranslationError::Unsupported(
                    "WITH property projections require an AS alias".into(),
                ))
            }
            _ => {
                return Err(TranslationError::Unsupported(
                    "WITH supports variable and property projections only".into(),
                ))
            }
        }
    }
    Ok(())
}

/// Lowers RETURN items, ORDER BY and pagination; returns (limit, skip).
fn lower_return_clause(
    clause: &ReturnClause,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<(Option<i64>, Option<i64>), TranslationError> {
    ctx.set_sink(ParamSink::Select);
    for item in &clause.items {
        lower_return_item(item, ctx, params)?;
    }

    ctx.set_sink(ParamSink::OrderBy);
    for order_item in &clause.order_by {
        let expr = expr_lowering::lower_expression(&order_item.expression, ctx, params)?;
        let direction = match order_item.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        ctx.order_by_items.push(format!("{} {}", expr, direction));
    }
    ctx.set_sink(ParamSink::Where);

    let skip = clause
        .skip
        .as_ref()
        .map(|value| resolve_page_value(value, params, "SKIP"))
        .transpose()?;
    let limit = clause
        .limit
        .as_ref()
        .map(|value| resolve_page_value(value, params, "LIMIT"))
        .transpose()?;
    Ok((limit, skip))
}

fn lower_return_item(
    item: &ReturnItem,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<(), TranslationError> {
    match &item.expression {
        Expression::Variable(name) => {
            let binding = ctx.resolve(name)?.clone();
            match binding {
                VarBinding::Node { .. } | VarBinding::CteNode { .. } => {
                    if let VarBinding::CteNode { cte, .. } = &binding {
                        ctx.consume_cte(cte);
                    }
                    let id_expr = ctx.id_expr(name)?;
                    let columns = hydration::node_columns(ctx, &id_expr);
                    ctx.select_items.extend(columns);
                }
                VarBinding::Scalar { sql } => {
                    let alias = item.alias.as_deref().unwrap_or(name);
                    ctx.select_items.push(format!("{} AS {}", sql, alias));
                }
                VarBinding::Edge { alias } => {
                    ctx.select_items.extend([
                        format!("{}.s AS source_id", alias),
                        format!("{}.p AS rel_type", alias),
                        format!("{}.o_id AS target_id", alias),
                        format!("{}.qualifiers AS qualifiers", alias),
                    ]);
                }
            }
        }
        Expression::PropertyAccessExp(access) => {
            let prop_alias = ctx.property_join(&access.base, &access.key)?;
            let alias = item.alias.as_deref().unwrap_or(&access.key);
            ctx.select_items
                .push(format!("{}.val AS {}", prop_alias, alias));
        }
        other => {
            let sql = expr_lowering::lower_expression(other, ctx, params)?;
            match &item.alias {
                Some(alias) => ctx.select_items.push(format!("{} AS {}", sql, alias)),
                None => ctx.select_items.push(sql),
            }
        }
    }
    Ok(())
}

/// SKIP/LIMIT operands resolve to non-negative integers at translation
/// time; anything else is a parameter error, never SQL text.
fn resolve_page_value(
    value: &PageValue,
    params: &Params,
    what: &'static str,
) -> Result<i64, TranslationError> {
    match value {
        PageValue::Literal(v) => Ok(*v),
        PageValue::Parameter(name) => {
            let value = expr_lowering::resolve_param(params, name)?;
            match value.as_i64() {
                Some(v) if v >= 0 => Ok(v),
                _ => Err(TranslationError::ParameterType {
                    name: name.clone(),
                    expected: match what {
                        "SKIP" => "a non-negative integer for SKIP",
                        _ => "a non-negative integer for LIMIT",
                    },
                    found: expr_lowering::type_name(value).to_string(),
                }),
            }
        }
    }
}
