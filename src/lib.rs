//! vecgraph - Cypher-to-SQL compiler for an RDF-style knowledge graph
//!
//! This crate translates a subset of openCypher (plus the engine's vector
//! search procedure) into parameterized SQL over a relational triple store:
//! - Hand-written lexer and recursive-descent parser
//! - AST-walking SQL generation with node hydration
//! - Transactional write planning (CREATE, MERGE, SET, DELETE)
//! - `CALL ivg.vector.search(...)` lowering to a ranked CTE
//!
//! The compiler is synchronous and pure: it never opens a database session;
//! the emitted [`sql_generator::SqlProgram`] is executed by the caller.

pub mod config;
pub mod cypher;
pub mod schema;
pub mod sql_generator;

pub use cypher::{parse_query, ParseError};
pub use schema::{schema_prefix, set_schema_prefix};
pub use sql_generator::{
    translate_to_sql, translate_to_sql_with_config, Params, SqlProgram, TranslationError,
};
