use super::ast::{Expression, SetClause, SetItem};
use super::errors::ParseError;
use super::expression::parse_expression;
use super::tokens::{Keyword, TokenKind};
use super::Parser;

/// `SET var.key = expr (',' var.key = expr)*`
pub fn parse_set_clause(parser: &mut Parser) -> Result<SetClause, ParseError> {
    parser.expect_keyword(Keyword::Set)?;
    let items = parser.parse_comma_separated(parse_set_item)?;
    Ok(SetClause { items })
}

fn parse_set_item(parser: &mut Parser) -> Result<SetItem, ParseError> {
    let target = match parse_expression(parser)? {
        Expression::PropertyAccessExp(access) => access,
        _ => return parser.expected("a property access target (var.key)"),
    };
    parser.expect_token(&TokenKind::Eq, "'='")?;
    let value = parse_expression(parser)?;
    Ok(SetItem { target, value })
}
