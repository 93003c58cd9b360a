//! Cypher front-end: token model, scanner, AST, and the recursive-descent
//! parser for the supported openCypher subset.

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod tokens;

mod call_clause;
mod create_clause;
mod delete_clause;
mod expression;
mod match_clause;
mod merge_clause;
mod order_by_and_page_clause;
mod path_pattern;
mod return_clause;
mod set_clause;
mod where_clause;
mod with_clause;

use std::collections::HashSet;

pub use errors::{LexError, ParseError};
pub use tokens::{Keyword, Token, TokenKind};

use ast::CypherQuery;

/// Token-stream parser with one token of lookahead.
///
/// Clause modules borrow the parser mutably and consume tokens through the
/// helpers here; the token stream always ends in `Eof`, so peeking never
/// runs off the end.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Eof)
        ));
        Parser { tokens, pos: 0 }
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    /// Consumes the next token if it is the given keyword.
    pub fn parse_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.next_token();
            true
        } else {
            false
        }
    }

    pub fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.parse_keyword(kw) {
            Ok(())
        } else {
            self.expected(kw.as_str())
        }
    }

    /// Consumes the next token if it equals `kind`.
    pub fn parse_token(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.next_token();
            true
        } else {
            false
        }
    }

    pub fn expect_token(&mut self, kind: &TokenKind, what: &str) -> Result<(), ParseError> {
        if self.parse_token(kind) {
            Ok(())
        } else {
            self.expected(what)
        }
    }

    /// Consumes an identifier token and returns its spelling.
    pub fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek_kind() {
            TokenKind::Ident(_) => {
                let token = self.next_token();
                match token.kind {
                    TokenKind::Ident(name) => Ok(name),
                    _ => unreachable!(),
                }
            }
            _ => self.expected(what),
        }
    }

    /// Builds an "expected X, found Y" error at the current token.
    pub fn expected<R>(&self, expected: impl Into<String>) -> Result<R, ParseError> {
        let token = self.peek();
        Err(ParseError::UnexpectedToken {
            expected: expected.into(),
            found: token.kind.to_string(),
            offset: token.offset,
        })
    }

    /// Parse a comma-separated list of 1+ items accepted by `f`.
    pub fn parse_comma_separated<T, F>(&mut self, mut f: F) -> Result<Vec<T>, ParseError>
    where
        F: FnMut(&mut Parser) -> Result<T, ParseError>,
    {
        let mut values = vec![f(self)?];
        while self.parse_token(&TokenKind::Comma) {
            values.push(f(self)?);
        }
        Ok(values)
    }
}

/// Parses a complete Cypher statement into a [`CypherQuery`].
pub fn parse_query(input: &str) -> Result<CypherQuery, ParseError> {
    let tokens = lexer::tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let mut query = CypherQuery::default();

    // reading and writing pattern clauses, in any order
    loop {
        if parser.at_keyword(Keyword::Match) || parser.at_keyword(Keyword::Optional) {
            query
                .match_clauses
                .push(match_clause::parse_match_clause(&mut parser)?);
        } else if parser.at_keyword(Keyword::Create) {
            query
                .create_clauses
                .push(create_clause::parse_create_clause(&mut parser)?);
        } else if parser.at_keyword(Keyword::Merge) {
            query
                .merge_clauses
                .push(merge_clause::parse_merge_clause(&mut parser)?);
        } else if parser.at_keyword(Keyword::Call) {
            let offset = parser.peek().offset;
            let call = call_clause::parse_call_clause(&mut parser)?;
            if query.procedure_call.is_some() {
                return Err(ParseError::MultipleProcedureCalls { offset });
            }
            query.procedure_call = Some(call);
        } else {
            break;
        }
    }

    if parser.at_keyword(Keyword::With) {
        query.with_clause = Some(with_clause::parse_with_clause(&mut parser)?);
    }

    loop {
        if parser.at_keyword(Keyword::Set) {
            let clause = set_clause::parse_set_clause(&mut parser)?;
            match query.set_clause.as_mut() {
                Some(existing) => existing.items.extend(clause.items),
                None => query.set_clause = Some(clause),
            }
        } else if parser.at_keyword(Keyword::Delete) || parser.at_keyword(Keyword::Detach) {
            let clause = delete_clause::parse_delete_clause(&mut parser)?;
            match query.delete_clause.as_mut() {
                Some(existing) => {
                    existing.detach |= clause.detach;
                    existing.variables.extend(clause.variables);
                }
                None => query.delete_clause = Some(clause),
            }
        } else {
            break;
        }
    }

    if parser.at_keyword(Keyword::Return) {
        query.return_clause = Some(return_clause::parse_return_clause(&mut parser)?);
    }

    if query == CypherQuery::default() {
        return parser.expected("a query clause (MATCH, CREATE, MERGE, CALL or RETURN)");
    }

    parser.parse_token(&TokenKind::Semicolon);
    if parser.peek_kind() != &TokenKind::Eof {
        let token = parser.peek();
        return Err(ParseError::TrailingInput {
            found: token.kind.to_string(),
            offset: token.offset,
        });
    }

    check_bindings(&query)?;
    Ok(query)
}

/// Rejects a name bound as both a node variable and a relationship
/// variable, and YIELD names shadowed by pattern variables.
fn check_bindings(query: &CypherQuery) -> Result<(), ParseError> {
    let mut node_vars: HashSet<&str> = HashSet::new();
    let mut rel_vars: HashSet<&str> = HashSet::new();

    if let Some(call) = &query.procedure_call {
        for item in &call.yield_items {
            node_vars.insert(item.as_str());
        }
    }

    let patterns = query
        .match_clauses
        .iter()
        .flat_map(|m| m.path_patterns.iter())
        .chain(query.create_clauses.iter().flat_map(|c| c.path_patterns.iter()))
        .chain(query.merge_clauses.iter().map(|m| &m.path_pattern));

    for path in patterns {
        for node in path.nodes() {
            if let Some(name) = &node.name {
                if rel_vars.contains(name.as_str()) {
                    return Err(ParseError::DuplicateVariable {
                        name: name.clone(),
                        offset: 0,
                    });
                }
                node_vars.insert(name.as_str());
            }
        }
        for (rel, _) in &path.segments {
            if let Some(name) = &rel.name {
                if node_vars.contains(name.as_str()) || !rel_vars.insert(name.as_str()) {
                    return Err(ParseError::DuplicateVariable {
                        name: name.clone(),
                        offset: 0,
                    });
                }
            }
        }
    }
    Ok(())
}
