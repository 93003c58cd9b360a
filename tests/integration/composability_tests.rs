//! Composition of the vector-search CTE with downstream clauses.

use serde_json::json;

use crate::{compile, normalize, owned_params};

#[test]
fn match_on_yielded_node_references_cte() {
    let program = compile(
        "CALL ivg.vector.search('Gene', 'embedding', [0.1, 0.2], 5) YIELD node, score \
         MATCH (node)-[:ASSOCIATED_WITH]->(d:Disease) \
         RETURN d.name, score",
    );
    let sql = program.sql().unwrap();
    // the match starts from the CTE, not a fresh scan of `nodes`
    assert!(normalize(sql).contains("FROM VecSearch"));
    assert!(sql.contains("JOIN rdf_edges AS e0 ON e0.s = VecSearch.node_id"));
    assert!(!normalize(sql).contains("FROM nodes"));
    assert!(sql.contains("VecSearch.score AS score"));
}

#[test]
fn yielded_node_composes_with_where() {
    let program = compile(
        "CALL ivg.vector.search('Gene', 'embedding', [0.1], 5) YIELD node, score \
         MATCH (node) WHERE node.name CONTAINS 'kinase' \
         RETURN node, score",
    );
    let sql = program.sql().unwrap();
    assert!(sql.contains("LEFT JOIN rdf_props AS p0 ON p0.s = VecSearch.node_id"));
    assert!(sql.contains("LIKE '%' || ? || '%'"));
}

#[test]
fn bare_call_returns_yield_items_implicitly() {
    let program = compile("CALL ivg.vector.search('Gene', 'emb', [0.1], 5) YIELD node, score");
    let sql = program.sql().unwrap();
    assert!(sql.contains("VecSearch.node_id AS node_id"));
    assert!(sql.contains("VecSearch.score AS score"));
    assert!(normalize(sql).contains("FROM VecSearch"));
}

#[test]
fn score_usable_in_order_by() {
    let program = compile(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5) YIELD node, score \
         RETURN node, score ORDER BY score DESC",
    );
    let sql = program.sql().unwrap();
    assert!(sql.trim_end().ends_with("ORDER BY VecSearch.score DESC"));
}

#[test]
fn cte_parameters_precede_match_parameters() {
    let program = compile(
        "CALL ivg.vector.search('Gene', 'embedding', [0.1], 5) YIELD node, score \
         MATCH (node)-[:ASSOCIATED_WITH]->(d:Disease) \
         RETURN d, score",
    );
    assert_eq!(
        owned_params(&program),
        vec![
            json!("[0.1]"),
            json!("Gene"),
            json!("ASSOCIATED_WITH"),
            json!("Disease")
        ]
    );
}

#[test]
fn vector_search_with_paging_on_outer_query() {
    let program = compile(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 50) YIELD node, score \
         RETURN node, score LIMIT 10",
    );
    let sql = normalize(program.sql().unwrap());
    assert!(sql.contains("SELECT TOP 50"));
    assert!(sql.ends_with("LIMIT 10"));
    assert_eq!(program.metadata.estimated_rows, Some(10));
}
