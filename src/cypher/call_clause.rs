use super::ast::{Expression, ProcedureCall};
use super::errors::ParseError;
use super::expression::parse_expression;
use super::tokens::{Keyword, TokenKind};
use super::Parser;

/// `CALL dottedName '(' argList ')' [YIELD ident (',' ident)*]`
///
/// A brace-delimited map after the last positional argument is the
/// procedure's options map, e.g.
/// `CALL ivg.vector.search('Gene', 'emb', [0.1], 5, {similarity: 'dot_product'})`.
pub fn parse_call_clause(parser: &mut Parser) -> Result<ProcedureCall, ParseError> {
    parser.expect_keyword(Keyword::Call)?;

    let name = parse_dotted_name(parser)?;

    parser.expect_token(&TokenKind::LParen, "'(' after the procedure name")?;
    let mut arguments = if parser.peek_kind() == &TokenKind::RParen {
        Vec::new()
    } else {
        parser.parse_comma_separated(parse_expression)?
    };
    parser.expect_token(&TokenKind::RParen, "')'")?;

    // a trailing map literal is the options map, not a positional argument
    let options = match arguments.last() {
        Some(Expression::Map(_)) => match arguments.pop() {
            Some(Expression::Map(entries)) => entries,
            _ => unreachable!(),
        },
        _ => Vec::new(),
    };

    let yield_items = if parser.parse_keyword(Keyword::Yield) {
        parser.parse_comma_separated(|p| p.expect_ident("a YIELD column name"))?
    } else {
        Vec::new()
    };

    Ok(ProcedureCall {
        name,
        arguments,
        yield_items,
        options,
    })
}

/// Dotted procedure names (e.g. `ivg.vector.search`) parse as one name.
fn parse_dotted_name(parser: &mut Parser) -> Result<String, ParseError> {
    let mut name = parser.expect_ident("a procedure name")?;
    while parser.parse_token(&TokenKind::Dot) {
        name.push('.');
        name.push_str(&parser.expect_ident("a procedure name segment")?);
    }
    Ok(name)
}
