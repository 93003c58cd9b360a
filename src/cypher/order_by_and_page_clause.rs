use super::ast::{OrderByItem, PageValue, SortOrder};
use super::errors::ParseError;
use super::expression::parse_expression;
use super::tokens::{Keyword, TokenKind};
use super::Parser;

/// `ORDER BY expr [ASC|DESC] (',' expr [ASC|DESC])*`
pub fn parse_order_by(parser: &mut Parser) -> Result<Vec<OrderByItem>, ParseError> {
    parser.expect_keyword(Keyword::Order)?;
    parser.expect_keyword(Keyword::By)?;
    parser.parse_comma_separated(|p| {
        let expression = parse_expression(p)?;
        let order = if p.parse_keyword(Keyword::Desc) {
            SortOrder::Desc
        } else {
            // ASC is the default when no direction is given
            p.parse_keyword(Keyword::Asc);
            SortOrder::Asc
        };
        Ok(OrderByItem { expression, order })
    })
}

/// `SKIP <int literal | $param>`
pub fn parse_skip(parser: &mut Parser) -> Result<PageValue, ParseError> {
    parser.expect_keyword(Keyword::Skip)?;
    parse_page_value(parser)
}

/// `LIMIT <int literal | $param>`
pub fn parse_limit(parser: &mut Parser) -> Result<PageValue, ParseError> {
    parser.expect_keyword(Keyword::Limit)?;
    parse_page_value(parser)
}

fn parse_page_value(parser: &mut Parser) -> Result<PageValue, ParseError> {
    match parser.peek_kind().clone() {
        TokenKind::Integer(v) => {
            parser.next_token();
            Ok(PageValue::Literal(v))
        }
        TokenKind::Parameter(_) => {
            let token = parser.next_token();
            match token.kind {
                TokenKind::Parameter(name) => Ok(PageValue::Parameter(name)),
                _ => unreachable!(),
            }
        }
        _ => parser.expected("an integer literal or parameter"),
    }
}
