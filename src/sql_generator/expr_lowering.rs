//! Structural lowering of Cypher expressions to SQL fragments.
//!
//! Literal handling follows the triple-store semantics: booleans normalize
//! to the integer literals `1`/`0`, numbers inline, strings always bind as
//! parameters. Range comparisons against a property cast both sides to
//! DOUBLE since `rdf_props.val` is stored as text.

use serde_json::{Number, Value};

use crate::cypher::ast::{Expression, Literal, Operator, OperatorApplication};

use super::context::TranslationContext;
use super::errors::TranslationError;
use super::function_registry;
use super::hydration;
use super::Params;

pub fn lower_expression(
    expr: &Expression,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<String, TranslationError> {
    match expr {
        Expression::Literal(lit) => lower_literal(lit, ctx),
        Expression::Variable(name) => lower_variable(name, ctx),
        Expression::Parameter(name) => {
            let value = resolve_scalar_param(params, name)?;
            Ok(ctx.add_parameter(value).to_string())
        }
        Expression::PropertyAccessExp(access) => {
            let alias = ctx.property_join(&access.base, &access.key)?;
            Ok(format!("{}.val", alias))
        }
        Expression::FunctionCallExp(call) => lower_function_call(call, ctx, params),
        Expression::OperatorApplicationExp(op) => lower_operator(op, ctx, params),
        Expression::List(_) => Err(TranslationError::Unsupported(
            "list literals are only allowed on the right side of IN".into(),
        )),
        Expression::Map(_) => Err(TranslationError::Unsupported(
            "map literals are not allowed in expression position".into(),
        )),
    }
}

fn lower_literal(lit: &Literal, ctx: &mut TranslationContext) -> Result<String, TranslationError> {
    Ok(match lit {
        Literal::Integer(v) => v.to_string(),
        Literal::Float(v) => v.to_string(),
        // booleans normalize to integer literals so `b = TRUE` and
        // `b = 1` come out byte-identical
        Literal::Boolean(true) => "1".to_string(),
        Literal::Boolean(false) => "0".to_string(),
        Literal::Null => "NULL".to_string(),
        Literal::String(s) => ctx.add_parameter(Value::String(s.clone())).to_string(),
    })
}

fn lower_variable(name: &str, ctx: &TranslationContext) -> Result<String, TranslationError> {
    use super::context::VarBinding;
    match ctx.resolve(name)? {
        VarBinding::Node { alias } => Ok(format!("{}.node_id", alias)),
        VarBinding::CteNode { cte, id_column } => Ok(format!("{}.{}", cte, id_column)),
        VarBinding::Edge { alias } => Ok(format!("{}.p", alias)),
        VarBinding::Scalar { sql } => Ok(sql.clone()),
    }
}

fn lower_function_call(
    call: &crate::cypher::ast::FunctionCall,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<String, TranslationError> {
    // graph-shaped functions resolve against the bound pattern
    match call.name.to_lowercase().as_str() {
        "id" => {
            let var = single_variable_arg(call, "id")?;
            return ctx.id_expr(var);
        }
        "labels" => {
            let var = single_variable_arg(call, "labels")?;
            let id_expr = ctx.id_expr(var)?;
            return Ok(hydration::labels_subquery(ctx, &id_expr));
        }
        _ => {}
    }

    let sql_name = function_registry::sql_function_name(&call.name);
    let args: Result<Vec<String>, TranslationError> = call
        .args
        .iter()
        .map(|arg| lower_expression(arg, ctx, params))
        .collect();
    Ok(format!("{}({})", sql_name, args?.join(", ")))
}

fn single_variable_arg<'a>(
    call: &'a crate::cypher::ast::FunctionCall,
    what: &'static str,
) -> Result<&'a str, TranslationError> {
    match call.args.as_slice() {
        [Expression::Variable(name)] => Ok(name),
        _ => Err(TranslationError::InvalidArgument {
            what,
            detail: "expects a single node variable".into(),
        }),
    }
}

fn lower_operator(
    op: &OperatorApplication,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<String, TranslationError> {
    match op.operator {
        Operator::And | Operator::Or => {
            let (left, right) = two_operands(op)?;
            let l = lower_expression(left, ctx, params)?;
            let r = lower_expression(right, ctx, params)?;
            let kw = String::from(op.operator);
            Ok(format!("({} {} {})", l, kw, r))
        }
        Operator::Not => {
            let operand = one_operand(op)?;
            let x = lower_expression(operand, ctx, params)?;
            Ok(format!("NOT ({})", x))
        }
        Operator::Negate => {
            let operand = one_operand(op)?;
            let x = lower_expression(operand, ctx, params)?;
            Ok(format!("-({})", x))
        }
        Operator::IsNull => {
            let operand = one_operand(op)?;
            let x = lower_expression(operand, ctx, params)?;
            Ok(format!("{} IS NULL", x))
        }
        Operator::IsNotNull => {
            let operand = one_operand(op)?;
            let x = lower_expression(operand, ctx, params)?;
            Ok(format!("{} IS NOT NULL", x))
        }
        Operator::Contains => {
            let (left, right) = two_operands(op)?;
            let l = lower_expression(left, ctx, params)?;
            let r = lower_expression(right, ctx, params)?;
            Ok(format!("{} LIKE '%' || {} || '%'", l, r))
        }
        Operator::StartsWith => {
            let (left, right) = two_operands(op)?;
            let l = lower_expression(left, ctx, params)?;
            let r = lower_expression(right, ctx, params)?;
            Ok(format!("{} LIKE {} || '%'", l, r))
        }
        Operator::EndsWith => {
            let (left, right) = two_operands(op)?;
            let l = lower_expression(left, ctx, params)?;
            let r = lower_expression(right, ctx, params)?;
            Ok(format!("{} LIKE '%' || {}", l, r))
        }
        Operator::In => lower_in(op, ctx, params),
        Operator::LessThan
        | Operator::LessThanEqual
        | Operator::GreaterThan
        | Operator::GreaterThanEqual => lower_range_comparison(op, ctx, params),
        Operator::Equal
        | Operator::NotEqual
        | Operator::Addition
        | Operator::Subtraction
        | Operator::Multiplication
        | Operator::Division => {
            let (left, right) = two_operands(op)?;
            let l = lower_expression(left, ctx, params)?;
            let r = lower_expression(right, ctx, params)?;
            let kw = String::from(op.operator);
            Ok(format!("{} {} {}", l, kw, r))
        }
    }
}

/// `x IN [a, b, ...]`: every element binds as a parameter.
fn lower_in(
    op: &OperatorApplication,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<String, TranslationError> {
    let (left, right) = two_operands(op)?;
    let l = lower_expression(left, ctx, params)?;

    let values: Vec<Value> = match right {
        Expression::List(items) => items
            .iter()
            .map(|item| in_element_value(item, params))
            .collect::<Result<_, _>>()?,
        Expression::Parameter(name) => match resolve_param(params, name)? {
            Value::Array(items) => items.clone(),
            other => {
                return Err(TranslationError::ParameterType {
                    name: name.clone(),
                    expected: "a list",
                    found: type_name(other).to_string(),
                })
            }
        },
        _ => {
            return Err(TranslationError::Unsupported(
                "IN requires a list literal or list parameter on the right".into(),
            ))
        }
    };

    // an empty IN list can never match
    if values.is_empty() {
        return Ok("1 = 0".to_string());
    }

    let placeholders: Vec<&str> = values
        .into_iter()
        .map(|value| ctx.add_parameter(value))
        .collect();
    Ok(format!("{} IN ({})", l, placeholders.join(", ")))
}

fn in_element_value(expr: &Expression, params: &Params) -> Result<Value, TranslationError> {
    match expr {
        Expression::Literal(lit) => Ok(literal_to_value(lit)),
        Expression::Parameter(name) => resolve_scalar_param(params, name),
        _ => Err(TranslationError::Unsupported(
            "IN list elements must be literals or parameters".into(),
        )),
    }
}

/// `< <= > >=`: property values are stored as text, so a comparison
/// against a number casts both sides to DOUBLE and binds the number.
fn lower_range_comparison(
    op: &OperatorApplication,
    ctx: &mut TranslationContext,
    params: &Params,
) -> Result<String, TranslationError> {
    let (left, right) = two_operands(op)?;
    let numeric = involves_property(left) || involves_property(right);
    let l = lower_comparison_side(left, ctx, params, numeric)?;
    let r = lower_comparison_side(right, ctx, params, numeric)?;
    let kw = String::from(op.operator);
    Ok(format!("{} {} {}", l, kw, r))
}

fn involves_property(expr: &Expression) -> bool {
    matches!(expr, Expression::PropertyAccessExp(_))
}

fn lower_comparison_side(
    expr: &Expression,
    ctx: &mut TranslationContext,
    params: &Params,
    cast_numeric: bool,
) -> Result<String, TranslationError> {
    if cast_numeric {
        match expr {
            Expression::PropertyAccessExp(access) => {
                let alias = ctx.property_join(&access.base, &access.key)?;
                return Ok(format!("CAST({}.val AS DOUBLE)", alias));
            }
            Expression::Literal(Literal::Integer(v)) => {
                let placeholder = ctx.add_parameter(Value::Number((*v).into()));
                return Ok(format!("CAST({} AS DOUBLE)", placeholder));
            }
            Expression::Literal(Literal::Float(v)) => {
                let number = Number::from_f64(*v).ok_or(TranslationError::InvalidArgument {
                    what: "numeric literal",
                    detail: "not a finite number".into(),
                })?;
                let placeholder = ctx.add_parameter(Value::Number(number));
                return Ok(format!("CAST({} AS DOUBLE)", placeholder));
            }
            _ => {}
        }
    }
    lower_expression(expr, ctx, params)
}

fn one_operand(op: &OperatorApplication) -> Result<&Expression, TranslationError> {
    match op.operands.as_slice() {
        [operand] => Ok(operand),
        _ => Err(TranslationError::Unsupported(format!(
            "operator {} expects one operand",
            String::from(op.operator)
        ))),
    }
}

fn two_operands(op: &OperatorApplication) -> Result<(&Expression, &Expression), TranslationError> {
    match op.operands.as_slice() {
        [left, right] => Ok((left, right)),
        _ => Err(TranslationError::Unsupported(format!(
            "operator {} expects two operands",
            String::from(op.operator)
        ))),
    }
}

/// Parameter value for a literal in parameterized position.
pub fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(v) => Value::Number((*v).into()),
        Literal::Float(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
        Literal::Boolean(true) => Value::Number(1.into()),
        Literal::Boolean(false) => Value::Number(0.into()),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Null => Value::Null,
    }
}

pub fn resolve_param<'a>(params: &'a Params, name: &str) -> Result<&'a Value, TranslationError> {
    params
        .get(name)
        .ok_or_else(|| TranslationError::MissingParameter(name.to_string()))
}

/// Resolves a parameter that must be a scalar (string, number, bool, null).
pub fn resolve_scalar_param(params: &Params, name: &str) -> Result<Value, TranslationError> {
    match resolve_param(params, name)? {
        Value::Array(_) | Value::Object(_) => Err(TranslationError::ParameterType {
            name: name.to_string(),
            expected: "a scalar value",
            found: type_name(params.get(name).unwrap_or(&Value::Null)).to_string(),
        }),
        Value::Bool(b) => Ok(Value::Number(if *b { 1 } else { 0 }.into())),
        other => Ok(other.clone()),
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
