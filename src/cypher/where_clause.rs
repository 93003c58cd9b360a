use super::ast::WhereClause;
use super::errors::ParseError;
use super::expression::parse_expression;
use super::tokens::Keyword;
use super::Parser;

/// `WHERE expr`
pub fn parse_where_clause(parser: &mut Parser) -> Result<WhereClause, ParseError> {
    parser.expect_keyword(Keyword::Where)?;
    let condition = parse_expression(parser)?;
    Ok(WhereClause { condition })
}
