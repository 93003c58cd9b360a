use super::ast::CreateClause;
use super::errors::ParseError;
use super::path_pattern::parse_path_pattern;
use super::tokens::Keyword;
use super::Parser;

/// `CREATE pathPattern (',' pathPattern)*`
pub fn parse_create_clause(parser: &mut Parser) -> Result<CreateClause, ParseError> {
    parser.expect_keyword(Keyword::Create)?;
    let path_patterns = parser.parse_comma_separated(parse_path_pattern)?;
    Ok(CreateClause { path_patterns })
}
