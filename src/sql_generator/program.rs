use serde::Serialize;
use serde_json::Value;

/// Query execution metadata.
///
/// Tracks optimization decisions and the indexes the emitted joins are
/// shaped for. Informational only; never affects execution semantics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryMetadata {
    pub estimated_rows: Option<u64>,
    pub index_usage: Vec<String>,
    pub optimization_applied: Vec<String>,
}

impl QueryMetadata {
    /// Records an optimization tag once.
    pub fn tag(&mut self, name: &str) {
        if !self.optimization_applied.iter().any(|t| t == name) {
            self.optimization_applied.push(name.to_string());
        }
    }

    /// Records an index hint once.
    pub fn index(&mut self, name: &str) {
        if !self.index_usage.iter().any(|t| t == name) {
            self.index_usage.push(name.to_string());
        }
    }
}

/// The emitted SQL: a single SELECT for reads, an ordered statement list
/// for transactional writes.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SqlStatements {
    Single(String),
    Batch(Vec<String>),
}

/// Positional parameters: one list for a single statement, one list per
/// statement for a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SqlParameters {
    Single(Vec<Value>),
    PerStatement(Vec<Vec<Value>>),
}

/// Output contract of the translator.
///
/// When `is_transactional` is set the caller must execute the statements in
/// order inside one transaction and roll back on any failure.
#[derive(Debug, Clone, Serialize)]
pub struct SqlProgram {
    pub statements: SqlStatements,
    pub parameters: SqlParameters,
    pub is_transactional: bool,
    pub metadata: QueryMetadata,
}

impl SqlProgram {
    pub fn single(sql: String, parameters: Vec<Value>, metadata: QueryMetadata) -> Self {
        SqlProgram {
            statements: SqlStatements::Single(sql),
            parameters: SqlParameters::Single(parameters),
            is_transactional: false,
            metadata,
        }
    }

    pub fn transactional(
        statements: Vec<String>,
        parameters: Vec<Vec<Value>>,
        metadata: QueryMetadata,
    ) -> Self {
        SqlProgram {
            statements: SqlStatements::Batch(statements),
            parameters: SqlParameters::PerStatement(parameters),
            is_transactional: true,
            metadata,
        }
    }

    /// The single SELECT of a read program.
    pub fn sql(&self) -> Option<&str> {
        match &self.statements {
            SqlStatements::Single(sql) => Some(sql),
            SqlStatements::Batch(_) => None,
        }
    }

    /// All statements in execution order.
    pub fn statements(&self) -> Vec<&str> {
        match &self.statements {
            SqlStatements::Single(sql) => vec![sql.as_str()],
            SqlStatements::Batch(stmts) => stmts.iter().map(String::as_str).collect(),
        }
    }

    /// Every statement joined, for whole-program assertions.
    pub fn all_sql(&self) -> String {
        self.statements().join("\n")
    }

    /// Parameter values flattened across statements.
    pub fn all_parameters(&self) -> Vec<&Value> {
        match &self.parameters {
            SqlParameters::Single(params) => params.iter().collect(),
            SqlParameters::PerStatement(lists) => lists.iter().flatten().collect(),
        }
    }
}
