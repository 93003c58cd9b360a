//! Node and relationship pattern parsing: the parenthesized and bracketed
//! forms of MATCH/CREATE/MERGE.

use super::ast::{
    Direction, Expression, HopRange, NodePattern, PathPattern, RelationshipPattern,
};
use super::errors::ParseError;
use super::expression;
use super::tokens::TokenKind;
use super::Parser;

/// `nodePattern ( relPattern nodePattern )*`
pub fn parse_path_pattern(parser: &mut Parser) -> Result<PathPattern, ParseError> {
    let start = parse_node_pattern(parser)?;
    let mut segments = Vec::new();
    while matches!(parser.peek_kind(), TokenKind::Minus | TokenKind::Lt) {
        let rel = parse_relationship_pattern(parser)?;
        let node = parse_node_pattern(parser)?;
        segments.push((rel, node));
    }
    Ok(PathPattern { start, segments })
}

/// `'(' [ident] (':' label)* [propMap] ')'`
pub fn parse_node_pattern(parser: &mut Parser) -> Result<NodePattern, ParseError> {
    parser.expect_token(&TokenKind::LParen, "'(' starting a node pattern")?;

    let name = match parser.peek_kind() {
        TokenKind::Ident(_) => Some(parser.expect_ident("a variable")?),
        _ => None,
    };

    let mut labels = Vec::new();
    while parser.parse_token(&TokenKind::Colon) {
        labels.push(parser.expect_ident("a label name")?);
    }

    let properties = if parser.peek_kind() == &TokenKind::LBrace {
        parse_property_map(parser)?
    } else {
        Vec::new()
    };

    parser.expect_token(&TokenKind::RParen, "')' closing a node pattern")?;
    Ok(NodePattern {
        name,
        labels,
        properties,
    })
}

/// `-[…]->`, `<-[…]-`, `-[…]-`, with the bracket detail optional.
fn parse_relationship_pattern(parser: &mut Parser) -> Result<RelationshipPattern, ParseError> {
    let incoming_arrow = parser.parse_token(&TokenKind::Lt);
    parser.expect_token(&TokenKind::Minus, "'-'")?;

    let mut rel = if parser.peek_kind() == &TokenKind::LBracket {
        parse_bracket_detail(parser)?
    } else {
        RelationshipPattern {
            name: None,
            rel_type: None,
            direction: Direction::Either,
            hops: None,
            properties: Vec::new(),
        }
    };

    parser.expect_token(&TokenKind::Minus, "'-'")?;
    let outgoing_arrow = parser.parse_token(&TokenKind::Gt);

    rel.direction = match (incoming_arrow, outgoing_arrow) {
        (true, false) => Direction::Incoming,
        (false, true) => Direction::Outgoing,
        (false, false) => Direction::Either,
        (true, true) => return parser.expected("a single arrow direction"),
    };
    Ok(rel)
}

/// `'[' [ident] [':' type] ['*' range] [propMap] ']'`
fn parse_bracket_detail(parser: &mut Parser) -> Result<RelationshipPattern, ParseError> {
    parser.expect_token(&TokenKind::LBracket, "'['")?;

    let name = match parser.peek_kind() {
        TokenKind::Ident(_) => Some(parser.expect_ident("a variable")?),
        _ => None,
    };

    let rel_type = if parser.parse_token(&TokenKind::Colon) {
        Some(parser.expect_ident("a relationship type")?)
    } else {
        None
    };

    let hops = if parser.parse_token(&TokenKind::Star) {
        Some(parse_hop_range(parser)?)
    } else {
        None
    };

    let properties = if parser.peek_kind() == &TokenKind::LBrace {
        parse_property_map(parser)?
    } else {
        Vec::new()
    };

    parser.expect_token(&TokenKind::RBracket, "']'")?;
    Ok(RelationshipPattern {
        name,
        rel_type,
        direction: Direction::Either,
        hops,
        properties,
    })
}

/// Range after `*`: `2`, `1..3`, `..5`, `2..`, or nothing.
fn parse_hop_range(parser: &mut Parser) -> Result<HopRange, ParseError> {
    let min = match parser.peek_kind() {
        TokenKind::Integer(v) => {
            let v = *v;
            if v < 0 {
                return parser.expected("a non-negative hop count");
            }
            parser.next_token();
            Some(v as u32)
        }
        _ => None,
    };

    if parser.parse_token(&TokenKind::Dot) {
        parser.expect_token(&TokenKind::Dot, "'..'")?;
        let max = match parser.peek_kind() {
            TokenKind::Integer(v) => {
                let v = *v;
                if v < 0 {
                    return parser.expected("a non-negative hop count");
                }
                parser.next_token();
                Some(v as u32)
            }
            _ => None,
        };
        return Ok(HopRange { min, max });
    }

    match min {
        Some(hops) => Ok(HopRange::fixed(hops)),
        None => Ok(HopRange::unbounded()),
    }
}

/// `{key: expr, …}` reusing the map-literal grammar.
fn parse_property_map(parser: &mut Parser) -> Result<Vec<(String, Expression)>, ParseError> {
    match expression::parse_map(parser)? {
        Expression::Map(entries) => Ok(entries),
        _ => unreachable!(),
    }
}
