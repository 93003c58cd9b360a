use super::ast::{WithClause, WithItem};
use super::errors::ParseError;
use super::expression::parse_expression;
use super::tokens::Keyword;
use super::Parser;

/// `WITH item (',' item)*` where `item := expr [AS ident]`.
///
/// Carried as alias projection only: downstream clauses see the new names
/// bound to the underlying expressions.
pub fn parse_with_clause(parser: &mut Parser) -> Result<WithClause, ParseError> {
    parser.expect_keyword(Keyword::With)?;
    let items = parser.parse_comma_separated(|p| {
        let expression = parse_expression(p)?;
        let alias = if p.parse_keyword(Keyword::As) {
            Some(p.expect_ident("an alias after AS")?)
        } else {
            None
        };
        Ok(WithItem { expression, alias })
    })?;
    Ok(WithClause { items })
}
