//! Precedence-climbing expression parser.
//!
//! Lowest to highest: OR, AND, NOT, comparison (including the string
//! predicates, IN and IS [NOT] NULL), additive, multiplicative, unary
//! minus, property access, primary.

use super::ast::{
    Expression, FunctionCall, Literal, Operator, OperatorApplication, PropertyAccess,
};
use super::errors::ParseError;
use super::tokens::{Keyword, TokenKind};
use super::Parser;

pub fn parse_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    parse_or(parser)
}

fn binary(op: Operator, left: Expression, right: Expression) -> Expression {
    Expression::OperatorApplicationExp(OperatorApplication {
        operator: op,
        operands: vec![left, right],
    })
}

fn unary(op: Operator, operand: Expression) -> Expression {
    Expression::OperatorApplicationExp(OperatorApplication {
        operator: op,
        operands: vec![operand],
    })
}

fn parse_or(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut expr = parse_and(parser)?;
    while parser.parse_keyword(Keyword::Or) {
        let right = parse_and(parser)?;
        expr = binary(Operator::Or, expr, right);
    }
    Ok(expr)
}

fn parse_and(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut expr = parse_not(parser)?;
    while parser.parse_keyword(Keyword::And) {
        let right = parse_not(parser)?;
        expr = binary(Operator::And, expr, right);
    }
    Ok(expr)
}

fn parse_not(parser: &mut Parser) -> Result<Expression, ParseError> {
    if parser.parse_keyword(Keyword::Not) {
        let operand = parse_not(parser)?;
        Ok(unary(Operator::Not, operand))
    } else {
        parse_comparison(parser)
    }
}

fn parse_comparison(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut expr = parse_additive(parser)?;

    // postfix IS NULL / IS NOT NULL
    if parser.parse_keyword(Keyword::Is) {
        let op = if parser.parse_keyword(Keyword::Not) {
            parser.expect_keyword(Keyword::Null)?;
            Operator::IsNotNull
        } else {
            parser.expect_keyword(Keyword::Null)?;
            Operator::IsNull
        };
        return Ok(unary(op, expr));
    }

    let op = match parser.peek_kind() {
        TokenKind::Eq => Some(Operator::Equal),
        TokenKind::Neq => Some(Operator::NotEqual),
        TokenKind::Lt => Some(Operator::LessThan),
        TokenKind::Lte => Some(Operator::LessThanEqual),
        TokenKind::Gt => Some(Operator::GreaterThan),
        TokenKind::Gte => Some(Operator::GreaterThanEqual),
        TokenKind::Keyword(Keyword::In) => Some(Operator::In),
        TokenKind::Keyword(Keyword::Contains) => Some(Operator::Contains),
        TokenKind::Keyword(Keyword::Starts) => Some(Operator::StartsWith),
        TokenKind::Keyword(Keyword::Ends) => Some(Operator::EndsWith),
        _ => None,
    };

    if let Some(op) = op {
        parser.next_token();
        // the multi-word predicates finish with WITH
        if matches!(op, Operator::StartsWith | Operator::EndsWith) {
            parser.expect_keyword(Keyword::With)?;
        }
        let right = parse_additive(parser)?;
        expr = binary(op, expr, right);
    }
    Ok(expr)
}

fn parse_additive(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut expr = parse_multiplicative(parser)?;
    loop {
        let op = match parser.peek_kind() {
            TokenKind::Plus => Operator::Addition,
            TokenKind::Minus => Operator::Subtraction,
            _ => break,
        };
        parser.next_token();
        let right = parse_multiplicative(parser)?;
        expr = binary(op, expr, right);
    }
    Ok(expr)
}

fn parse_multiplicative(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut expr = parse_unary(parser)?;
    loop {
        let op = match parser.peek_kind() {
            TokenKind::Star => Operator::Multiplication,
            TokenKind::Slash => Operator::Division,
            _ => break,
        };
        parser.next_token();
        let right = parse_unary(parser)?;
        expr = binary(op, expr, right);
    }
    Ok(expr)
}

fn parse_unary(parser: &mut Parser) -> Result<Expression, ParseError> {
    if parser.parse_token(&TokenKind::Minus) {
        // fold a negated number literal directly
        let operand = parse_unary(parser)?;
        return Ok(match operand {
            Expression::Literal(Literal::Integer(v)) => {
                Expression::Literal(Literal::Integer(-v))
            }
            Expression::Literal(Literal::Float(v)) => Expression::Literal(Literal::Float(-v)),
            other => unary(Operator::Negate, other),
        });
    }
    parse_postfix(parser)
}

/// Primary expression with optional `.key` property access.
fn parse_postfix(parser: &mut Parser) -> Result<Expression, ParseError> {
    let expr = parse_primary(parser)?;
    if parser.peek_kind() == &TokenKind::Dot {
        let base = match expr {
            Expression::Variable(name) => name,
            _ => return parser.expected("a variable before '.'"),
        };
        parser.next_token();
        let key = parser.expect_ident("a property name after '.'")?;
        return Ok(Expression::PropertyAccessExp(PropertyAccess { base, key }));
    }
    Ok(expr)
}

fn parse_primary(parser: &mut Parser) -> Result<Expression, ParseError> {
    match parser.peek_kind().clone() {
        TokenKind::Integer(v) => {
            parser.next_token();
            Ok(Expression::Literal(Literal::Integer(v)))
        }
        TokenKind::Float(v) => {
            parser.next_token();
            Ok(Expression::Literal(Literal::Float(v)))
        }
        TokenKind::Str(_) => {
            let token = parser.next_token();
            match token.kind {
                TokenKind::Str(s) => Ok(Expression::Literal(Literal::String(s))),
                _ => unreachable!(),
            }
        }
        TokenKind::Parameter(_) => {
            let token = parser.next_token();
            match token.kind {
                TokenKind::Parameter(name) => Ok(Expression::Parameter(name)),
                _ => unreachable!(),
            }
        }
        TokenKind::Keyword(Keyword::True) => {
            parser.next_token();
            Ok(Expression::Literal(Literal::Boolean(true)))
        }
        TokenKind::Keyword(Keyword::False) => {
            parser.next_token();
            Ok(Expression::Literal(Literal::Boolean(false)))
        }
        TokenKind::Keyword(Keyword::Null) => {
            parser.next_token();
            Ok(Expression::Literal(Literal::Null))
        }
        TokenKind::LBracket => parse_list(parser),
        TokenKind::LBrace => parse_map(parser),
        TokenKind::LParen => {
            parser.next_token();
            let expr = parse_expression(parser)?;
            parser.expect_token(&TokenKind::RParen, "')'")?;
            Ok(expr)
        }
        TokenKind::Ident(_) => {
            let name = parser.expect_ident("an identifier")?;
            if parser.parse_token(&TokenKind::LParen) {
                let args = if parser.parse_token(&TokenKind::RParen) {
                    Vec::new()
                } else {
                    let args = parser.parse_comma_separated(parse_expression)?;
                    parser.expect_token(&TokenKind::RParen, "')'")?;
                    args
                };
                Ok(Expression::FunctionCallExp(FunctionCall { name, args }))
            } else {
                Ok(Expression::Variable(name))
            }
        }
        _ => parser.expected("an expression"),
    }
}

fn parse_list(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.expect_token(&TokenKind::LBracket, "'['")?;
    if parser.parse_token(&TokenKind::RBracket) {
        return Ok(Expression::List(Vec::new()));
    }
    let items = parser.parse_comma_separated(parse_expression)?;
    parser.expect_token(&TokenKind::RBracket, "']'")?;
    Ok(Expression::List(items))
}

/// Map literal `{key: value, …}` with identifier keys.
pub fn parse_map(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.expect_token(&TokenKind::LBrace, "'{'")?;
    if parser.parse_token(&TokenKind::RBrace) {
        return Ok(Expression::Map(Vec::new()));
    }
    let entries = parser.parse_comma_separated(|p| {
        let key = p.expect_ident("a map key")?;
        p.expect_token(&TokenKind::Colon, "':'")?;
        let value = parse_expression(p)?;
        Ok((key, value))
    })?;
    parser.expect_token(&TokenKind::RBrace, "'}'")?;
    Ok(Expression::Map(entries))
}
