use super::ast::DeleteClause;
use super::errors::ParseError;
use super::tokens::Keyword;
use super::Parser;

/// `[DETACH] DELETE var (',' var)*`
pub fn parse_delete_clause(parser: &mut Parser) -> Result<DeleteClause, ParseError> {
    let detach = parser.parse_keyword(Keyword::Detach);
    parser.expect_keyword(Keyword::Delete)?;
    let variables = parser.parse_comma_separated(|p| p.expect_ident("a variable to delete"))?;
    Ok(DeleteClause { detach, variables })
}
