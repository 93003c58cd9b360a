use super::ast::{ReturnClause, ReturnItem};
use super::errors::ParseError;
use super::expression::parse_expression;
use super::order_by_and_page_clause::{parse_order_by, parse_limit, parse_skip};
use super::tokens::Keyword;
use super::Parser;

/// `RETURN [DISTINCT] retItem (',' retItem)* [orderBy] [skip] [limit]`
pub fn parse_return_clause(parser: &mut Parser) -> Result<ReturnClause, ParseError> {
    parser.expect_keyword(Keyword::Return)?;
    let distinct = parser.parse_keyword(Keyword::Distinct);

    let items = parser.parse_comma_separated(parse_return_item)?;

    let order_by = if parser.at_keyword(Keyword::Order) {
        parse_order_by(parser)?
    } else {
        Vec::new()
    };
    let skip = if parser.at_keyword(Keyword::Skip) {
        Some(parse_skip(parser)?)
    } else {
        None
    };
    let limit = if parser.at_keyword(Keyword::Limit) {
        Some(parse_limit(parser)?)
    } else {
        None
    };

    Ok(ReturnClause {
        distinct,
        items,
        order_by,
        skip,
        limit,
    })
}

fn parse_return_item(parser: &mut Parser) -> Result<ReturnItem, ParseError> {
    let expression = parse_expression(parser)?;
    let alias = if parser.parse_keyword(Keyword::As) {
        Some(parser.expect_ident("an alias after AS")?)
    } else {
        None
    };
    Ok(ReturnItem { expression, alias })
}
