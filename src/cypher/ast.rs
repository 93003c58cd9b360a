use std::fmt;

/// A scalar literal in expression position.
#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    // binary
    Addition,         // +
    Subtraction,      // -
    Multiplication,   // *
    Division,         // /
    Equal,            // =
    NotEqual,         // <>
    LessThan,         // <
    GreaterThan,      // >
    LessThanEqual,    // <=
    GreaterThanEqual, // >=
    And,
    Or,
    In, // IN [...]
    // String predicates
    StartsWith, // STARTS WITH
    EndsWith,   // ENDS WITH
    Contains,   // CONTAINS
    // unary
    Not,
    Negate, // unary -
    // postfix
    IsNull,    // e.g. city IS NULL
    IsNotNull, // e.g. city IS NOT NULL
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        match value {
            Operator::Addition => "+".to_string(),
            Operator::Subtraction => "-".to_string(),
            Operator::Multiplication => "*".to_string(),
            Operator::Division => "/".to_string(),
            Operator::Equal => "=".to_string(),
            Operator::NotEqual => "<>".to_string(),
            Operator::LessThan => "<".to_string(),
            Operator::GreaterThan => ">".to_string(),
            Operator::LessThanEqual => "<=".to_string(),
            Operator::GreaterThanEqual => ">=".to_string(),
            Operator::And => "AND".to_string(),
            Operator::Or => "OR".to_string(),
            Operator::In => "IN".to_string(),
            Operator::StartsWith => "STARTS WITH".to_string(),
            Operator::EndsWith => "ENDS WITH".to_string(),
            Operator::Contains => "CONTAINS".to_string(),
            Operator::Not => "NOT".to_string(),
            Operator::Negate => "-".to_string(),
            Operator::IsNull => "IS NULL".to_string(),
            Operator::IsNotNull => "IS NOT NULL".to_string(),
        }
    }
}

/// An operator applied to its operands. Unary and postfix operators carry a
/// single operand.
#[derive(Debug, PartialEq, Clone)]
pub struct OperatorApplication {
    pub operator: Operator,
    pub operands: Vec<Expression>,
}

/// Static property access `base.key`.
#[derive(Debug, PartialEq, Clone)]
pub struct PropertyAccess {
    pub base: String,
    pub key: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// A literal, such as a number, string, boolean, or null.
    Literal(Literal),

    /// A variable bound by MATCH/CREATE/MERGE/YIELD.
    Variable(String),

    /// A parameter reference, such as `$limit`.
    Parameter(String),

    /// A list literal: a vector of expressions.
    List(Vec<Expression>),

    /// A map literal: {key1: value1, key2: value2}.
    Map(Vec<(String, Expression)>),

    /// A function call, e.g. toLower(n.name).
    FunctionCallExp(FunctionCall),

    /// Property access, e.g. n.name.
    PropertyAccessExp(PropertyAccess),

    /// An operator application, e.g. 1 + 2 or n.age > 4.
    OperatorApplicationExp(OperatorApplication),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Direction {
    Incoming, // `<-`
    Outgoing, // `->`
    Either,   // `-`
}

/// Hop specification on a relationship: `*2`, `*1..3`, `*..5`, `*2..`, `*`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct HopRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl HopRange {
    pub fn fixed(hops: u32) -> Self {
        HopRange {
            min: Some(hops),
            max: Some(hops),
        }
    }

    pub fn unbounded() -> Self {
        HopRange {
            min: None,
            max: None,
        }
    }

    /// Returns the hop count when the range pins an exact length.
    pub fn fixed_hops(&self) -> Option<u32> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => Some(min),
            _ => None,
        }
    }
}

/// `(a:Person {name: 'x'})`
#[derive(Debug, PartialEq, Clone)]
pub struct NodePattern {
    pub name: Option<String>,
    pub labels: Vec<String>,
    pub properties: Vec<(String, Expression)>,
}

/// `-[r:TYPE {since: 2020}]->` and friends.
#[derive(Debug, PartialEq, Clone)]
pub struct RelationshipPattern {
    pub name: Option<String>,
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub hops: Option<HopRange>,
    pub properties: Vec<(String, Expression)>,
}

/// Alternating node and relationship patterns, starting and ending in a
/// node.
#[derive(Debug, PartialEq, Clone)]
pub struct PathPattern {
    pub start: NodePattern,
    pub segments: Vec<(RelationshipPattern, NodePattern)>,
}

impl PathPattern {
    /// All node patterns of the path in source order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodePattern> {
        std::iter::once(&self.start).chain(self.segments.iter().map(|(_, node)| node))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MatchClause {
    pub path_patterns: Vec<PathPattern>,
    pub optional: bool,
    pub where_clause: Option<WhereClause>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct WhereClause {
    pub condition: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReturnItem {
    pub expression: Expression,
    pub alias: Option<String>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for String {
    fn from(value: SortOrder) -> String {
        match value {
            SortOrder::Asc => "ASC".to_string(),
            SortOrder::Desc => "DESC".to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct OrderByItem {
    pub expression: Expression,
    pub order: SortOrder,
}

/// SKIP/LIMIT operand: an integer literal or a parameter reference that
/// resolves to a non-negative integer at translation time.
#[derive(Debug, PartialEq, Clone)]
pub enum PageValue {
    Literal(i64),
    Parameter(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReturnClause {
    pub distinct: bool,
    pub items: Vec<ReturnItem>,
    pub order_by: Vec<OrderByItem>,
    pub skip: Option<PageValue>,
    pub limit: Option<PageValue>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CreateClause {
    pub path_patterns: Vec<PathPattern>,
}

/// MERGE carries exactly one path pattern per clause.
#[derive(Debug, PartialEq, Clone)]
pub struct MergeClause {
    pub path_pattern: PathPattern,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SetItem {
    pub target: PropertyAccess,
    pub value: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SetClause {
    pub items: Vec<SetItem>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DeleteClause {
    pub detach: bool,
    pub variables: Vec<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct WithItem {
    pub expression: Expression,
    pub alias: Option<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct WithClause {
    pub items: Vec<WithItem>,
}

/// `CALL name(args) YIELD cols` with an optional trailing options map after
/// the positional arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct ProcedureCall {
    /// Dotted procedure name, e.g. "ivg.vector.search".
    pub name: String,
    pub arguments: Vec<Expression>,
    pub yield_items: Vec<String>,
    pub options: Vec<(String, Expression)>,
}

impl ProcedureCall {
    pub fn option(&self, key: &str) -> Option<&Expression> {
        self.options
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, expr)| expr)
    }
}

/// A parsed Cypher query: the clause sequence of the supported subset.
///
/// At most one procedure call is allowed; when present it precedes the
/// reading clauses and its YIELD names are usable downstream.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CypherQuery {
    pub procedure_call: Option<ProcedureCall>,
    pub match_clauses: Vec<MatchClause>,
    pub create_clauses: Vec<CreateClause>,
    pub merge_clauses: Vec<MergeClause>,
    pub with_clause: Option<WithClause>,
    pub set_clause: Option<SetClause>,
    pub delete_clause: Option<DeleteClause>,
    pub return_clause: Option<ReturnClause>,
}

impl CypherQuery {
    /// True when the query contains any writing clause.
    pub fn is_write(&self) -> bool {
        !self.create_clauses.is_empty()
            || !self.merge_clauses.is_empty()
            || self.set_clause.is_some()
            || self.delete_clause.is_some()
    }
}
