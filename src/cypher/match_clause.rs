use super::ast::MatchClause;
use super::errors::ParseError;
use super::path_pattern::parse_path_pattern;
use super::tokens::Keyword;
use super::where_clause::parse_where_clause;
use super::Parser;

/// `[OPTIONAL] MATCH pathPattern (',' pathPattern)* [WHERE expr]`
pub fn parse_match_clause(parser: &mut Parser) -> Result<MatchClause, ParseError> {
    let optional = parser.parse_keyword(Keyword::Optional);
    parser.expect_keyword(Keyword::Match)?;

    let path_patterns = parser.parse_comma_separated(parse_path_pattern)?;

    let where_clause = if parser.at_keyword(Keyword::Where) {
        Some(parse_where_clause(parser)?)
    } else {
        None
    };

    Ok(MatchClause {
        path_patterns,
        optional,
        where_clause,
    })
}
