use std::collections::HashMap;

use serde_json::Value;

use crate::schema;

use super::errors::TranslationError;
use super::program::QueryMetadata;

/// What a Cypher variable resolves to in the generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum VarBinding {
    /// A node pattern joined through `nodes` (alias `n0`, `n1`, …).
    Node { alias: String },
    /// A node yielded by a CTE; joins use `{cte}.{id_column}` instead of
    /// re-reading `nodes`.
    CteNode { cte: String, id_column: String },
    /// A relationship pattern joined through `rdf_edges` (alias `e0`, …).
    Edge { alias: String },
    /// A scalar column, e.g. `VecSearch.score` or a WITH projection.
    Scalar { sql: String },
}

/// Which section of the SELECT a parameter's placeholder lands in.
///
/// Placeholders bind positionally, so the buffer must follow the textual
/// order of the statement (CTEs, SELECT list, JOINs, WHERE, ORDER BY),
/// not the order the translator happens to visit clauses in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamSink {
    Select,
    Join,
    #[default]
    Where,
    OrderBy,
}

#[derive(Debug, Clone)]
struct Cte {
    name: String,
    body: String,
    parameters: Vec<Value>,
    consumed: bool,
}

/// Default ceiling for fixed-hop relationship expansion.
pub const DEFAULT_MAX_FIXED_HOPS: u32 = 4;

/// Mutable state for one translate call.
///
/// Accumulates SQL fragments, the positional parameter buffers and, for
/// write programs, the ordered stage list. Never share a context between
/// translations.
#[derive(Debug, Default)]
pub struct TranslationContext {
    pub schema_prefix: String,

    /// Largest `*k` a relationship pattern may request.
    pub max_fixed_hops: u32,

    bindings: HashMap<String, VarBinding>,

    pub select_items: Vec<String>,
    pub from_clauses: Vec<String>,
    pub join_clauses: Vec<String>,
    pub where_conditions: Vec<String>,
    pub order_by_items: Vec<String>,

    select_parameters: Vec<Value>,
    join_parameters: Vec<Value>,
    where_parameters: Vec<Value>,
    order_by_parameters: Vec<Value>,
    sink: ParamSink,

    /// One SQL statement per entry for transactional writes.
    pub stages: Vec<String>,
    pub stage_parameters: Vec<Vec<Value>>,

    ctes: Vec<Cte>,
    /// Shared LEFT JOIN aliases per (variable, property key).
    property_joins: HashMap<(String, String), String>,

    node_counter: usize,
    edge_counter: usize,
    label_counter: usize,
    prop_counter: usize,

    pub metadata: QueryMetadata,
}

impl TranslationContext {
    /// Context using the process-wide schema prefix.
    pub fn new() -> Self {
        Self::with_schema_prefix(schema::schema_prefix())
    }

    pub fn with_schema_prefix(prefix: impl Into<String>) -> Self {
        TranslationContext {
            schema_prefix: prefix.into(),
            max_fixed_hops: DEFAULT_MAX_FIXED_HOPS,
            ..Default::default()
        }
    }

    /// Schema-qualified table reference.
    pub fn table(&self, name: &str) -> String {
        schema::qualified(&self.schema_prefix, name)
    }

    pub fn next_node_alias(&mut self) -> String {
        let alias = format!("n{}", self.node_counter);
        self.node_counter += 1;
        alias
    }

    pub fn next_edge_alias(&mut self) -> String {
        let alias = format!("e{}", self.edge_counter);
        self.edge_counter += 1;
        alias
    }

    pub fn next_label_alias(&mut self) -> String {
        let alias = format!("l{}", self.label_counter);
        self.label_counter += 1;
        alias
    }

    pub fn next_prop_alias(&mut self) -> String {
        let alias = format!("p{}", self.prop_counter);
        self.prop_counter += 1;
        alias
    }

    pub fn bind(&mut self, name: &str, binding: VarBinding) {
        self.bindings.insert(name.to_string(), binding);
    }

    pub fn binding(&self, name: &str) -> Option<&VarBinding> {
        self.bindings.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&VarBinding, TranslationError> {
        self.bindings
            .get(name)
            .ok_or_else(|| TranslationError::UnboundVariable(name.to_string()))
    }

    /// SQL expression for the node id of a bound node variable.
    pub fn id_expr(&self, name: &str) -> Result<String, TranslationError> {
        match self.resolve(name)? {
            VarBinding::Node { alias } => Ok(format!("{}.node_id", alias)),
            VarBinding::CteNode { cte, id_column } => Ok(format!("{}.{}", cte, id_column)),
            _ => Err(TranslationError::Unsupported(format!(
                "'{}' does not refer to a node",
                name
            ))),
        }
    }

    /// Routes expression parameters into the section being lowered.
    pub fn set_sink(&mut self, sink: ParamSink) {
        self.sink = sink;
    }

    /// Appends a parameter to the current section and returns its
    /// placeholder.
    pub fn add_parameter(&mut self, value: Value) -> &'static str {
        match self.sink {
            ParamSink::Select => self.select_parameters.push(value),
            ParamSink::Join => self.join_parameters.push(value),
            ParamSink::Where => self.where_parameters.push(value),
            ParamSink::OrderBy => self.order_by_parameters.push(value),
        }
        "?"
    }

    /// Appends a parameter bound inside JOIN text, regardless of the
    /// current sink.
    pub fn add_join_parameter(&mut self, value: Value) -> &'static str {
        self.join_parameters.push(value);
        "?"
    }

    /// Shared LEFT JOIN against `rdf_props` for a `var.key` reference.
    ///
    /// The first reference emits the join (with the key parameterized);
    /// later references reuse the alias so one query never joins the same
    /// property twice.
    pub fn property_join(&mut self, var: &str, key: &str) -> Result<String, TranslationError> {
        let lookup = (var.to_string(), key.to_string());
        if let Some(alias) = self.property_joins.get(&lookup) {
            self.metadata.tag("property_join_sharing");
            return Ok(alias.clone());
        }
        let id_expr = self.id_expr(var)?;
        let alias = self.next_prop_alias();
        let props = self.table(schema::RDF_PROPS);
        self.add_join_parameter(Value::String(key.to_string()));
        self.join_clauses.push(format!(
            "LEFT JOIN {} AS {} ON {}.s = {} AND {}.key = ?",
            props, alias, alias, id_expr, alias
        ));
        self.metadata.index("pk_props");
        self.property_joins.insert(lookup, alias.clone());
        Ok(alias)
    }

    /// Registers a named CTE with its body and the parameters bound inside
    /// it. CTE parameters precede the main-query parameters positionally.
    pub fn add_cte(&mut self, name: &str, body: String, parameters: Vec<Value>) {
        self.ctes.push(Cte {
            name: name.to_string(),
            body,
            parameters,
            consumed: false,
        });
    }

    pub fn has_cte(&self, name: &str) -> bool {
        self.ctes.iter().any(|cte| cte.name == name)
    }

    /// Marks a CTE as referenced by the main query.
    pub fn consume_cte(&mut self, name: &str) {
        if let Some(cte) = self.ctes.iter_mut().find(|cte| cte.name == name) {
            cte.consumed = true;
        }
    }

    /// CTEs whose columns no clause has consumed yet.
    pub fn unconsumed_ctes(&self) -> Vec<String> {
        self.ctes
            .iter()
            .filter(|cte| !cte.consumed)
            .map(|cte| cte.name.clone())
            .collect()
    }

    /// Adds a statement to a transactional program.
    pub fn push_stage(&mut self, sql: String, parameters: Vec<Value>) {
        self.stages.push(sql);
        self.stage_parameters.push(parameters);
    }

    /// Parameters in placeholder order: CTE bodies, then SELECT list,
    /// JOINs, WHERE, ORDER BY.
    pub fn all_parameters(&self) -> Vec<Value> {
        let mut all: Vec<Value> = self
            .ctes
            .iter()
            .flat_map(|cte| cte.parameters.iter().cloned())
            .collect();
        all.extend(self.select_parameters.iter().cloned());
        all.extend(self.join_parameters.iter().cloned());
        all.extend(self.where_parameters.iter().cloned());
        all.extend(self.order_by_parameters.iter().cloned());
        all
    }

    /// Parameters bound inside the match-derived fragments (JOIN text then
    /// WHERE text), in placeholder order. Write planning replays these for
    /// every statement that embeds the match subquery.
    pub fn subquery_parameters(&self) -> Vec<Value> {
        let mut all = self.join_parameters.clone();
        all.extend(self.where_parameters.iter().cloned());
        all
    }

    /// Assembles the single SELECT from the accumulated fragments.
    pub fn build_sql(&self, distinct: bool, limit: Option<i64>, skip: Option<i64>) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !self.ctes.is_empty() {
            let rendered: Vec<String> = self
                .ctes
                .iter()
                .map(|cte| format!("{} AS (\n{}\n)", cte.name, cte.body))
                .collect();
            parts.push(format!("WITH {}", rendered.join(",\n")));
        }

        let distinct_kw = if distinct { "DISTINCT " } else { "" };
        parts.push(format!(
            "SELECT {}{}",
            distinct_kw,
            self.select_items.join(", ")
        ));

        if !self.from_clauses.is_empty() {
            parts.push(format!("FROM {}", self.from_clauses.join(", ")));
        }
        parts.extend(self.join_clauses.iter().cloned());

        if !self.where_conditions.is_empty() {
            parts.push(format!("WHERE {}", self.where_conditions.join(" AND ")));
        }

        if !self.order_by_items.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_items.join(", ")));
        }

        if let Some(limit) = limit {
            parts.push(format!("LIMIT {}", limit));
        }
        if let Some(skip) = skip {
            parts.push(format!("OFFSET {}", skip));
        }

        parts.join("\n")
    }

    /// Renders the accumulated match lowering as a correlatable id
    /// subquery, used by write planning to resolve matched nodes.
    pub fn build_id_subquery(&self, id_expr: &str) -> String {
        let mut parts: Vec<String> = vec![format!("SELECT {}", id_expr)];
        if !self.from_clauses.is_empty() {
            parts.push(format!("FROM {}", self.from_clauses.join(", ")));
        }
        parts.extend(self.join_clauses.iter().cloned());
        if !self.where_conditions.is_empty() {
            parts.push(format!("WHERE {}", self.where_conditions.join(" AND ")));
        }
        parts.join("\n")
    }
}
