use super::ast::MergeClause;
use super::errors::ParseError;
use super::path_pattern::parse_path_pattern;
use super::tokens::Keyword;
use super::Parser;

/// `MERGE pathPattern`, one pattern per clause.
pub fn parse_merge_clause(parser: &mut Parser) -> Result<MergeClause, ParseError> {
    parser.expect_keyword(Keyword::Merge)?;
    let path_pattern = parse_path_pattern(parser)?;
    Ok(MergeClause { path_pattern })
}
