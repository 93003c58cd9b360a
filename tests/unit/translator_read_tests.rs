//! Read-path translation: MATCH/WHERE/RETURN lowering against the triple
//! store schema.

use serde_json::json;
use vecgraph::TranslationError;

use crate::{normalize, owned_params, translate, translate_with, try_translate_with};

#[test]
fn label_filter_joins_rdf_labels() {
    let program = translate("MATCH (n:Drug) RETURN n");
    let sql = program.sql().unwrap();
    assert!(sql.contains("FROM nodes AS n0"));
    assert!(sql.contains("JOIN rdf_labels AS l0 ON l0.s = n0.node_id AND l0.label = ?"));
    assert_eq!(owned_params(&program), vec![json!("Drug")]);
}

#[test]
fn bare_variable_hydrates_three_columns() {
    let program = translate("MATCH (n:Drug) RETURN n");
    let sql = program.sql().unwrap();
    assert!(sql.contains("n0.node_id AS node_id"));
    assert!(sql.contains("AS node_labels"));
    assert!(sql.contains("AS node_props"));
    assert!(sql.contains("JSON_ARRAYAGG"));
    assert!(!program.is_transactional);
}

#[test]
fn true_literal_translates_to_one() {
    let program = translate("MATCH (n:Drug) WHERE n.is_primary = TRUE RETURN n");
    assert!(program.sql().unwrap().contains("= 1"));
}

#[test]
fn false_literal_translates_to_zero() {
    let program = translate("MATCH (n:Drug) WHERE n.active = FALSE RETURN n");
    assert!(program.sql().unwrap().contains("= 0"));
}

#[test]
fn lowercase_booleans_accepted() {
    let program = translate("MATCH (n:Drug) WHERE n.enabled = true RETURN n");
    assert!(program.sql().unwrap().contains("= 1"));
    let program = translate("MATCH (n:Drug) WHERE n.enabled = false RETURN n");
    assert!(program.sql().unwrap().contains("= 0"));
}

#[test]
fn boolean_with_and_translates_both() {
    let program =
        translate("MATCH (n:Drug) WHERE n.active = TRUE AND n.approved = TRUE RETURN n");
    assert_eq!(program.sql().unwrap().matches("= 1").count(), 2);
}

#[test]
fn boolean_identity_with_integer_literal() {
    let from_bool = translate("MATCH (n:Drug) WHERE n.active = TRUE RETURN n");
    let from_int = translate("MATCH (n:Drug) WHERE n.active = 1 RETURN n");
    assert_eq!(from_bool.sql(), from_int.sql());
    assert_eq!(owned_params(&from_bool), owned_params(&from_int));
}

#[test]
fn is_null_and_is_not_null() {
    let program = translate("MATCH (n:Drug) WHERE n.deleted IS NULL RETURN n");
    assert!(program.sql().unwrap().contains("IS NULL"));
    let program = translate("MATCH (n:Drug) WHERE n.deleted IS NOT NULL RETURN n");
    assert!(program.sql().unwrap().contains("IS NOT NULL"));
}

#[test]
fn not_wraps_condition() {
    let program = translate("MATCH (n:Drug) WHERE NOT n.deleted = TRUE RETURN n");
    assert!(program.sql().unwrap().contains("NOT ("));
}

#[test]
fn string_predicates_use_like() {
    let program = translate_with(
        "MATCH (n:Drug) WHERE n.name CONTAINS $t RETURN n",
        json!({"t": "asp"}),
    );
    assert!(program.sql().unwrap().contains("LIKE '%' || ? || '%'"));

    let program = translate("MATCH (n:Drug) WHERE n.name STARTS WITH 'a' RETURN n");
    assert!(program.sql().unwrap().contains("LIKE ? || '%'"));

    let program = translate("MATCH (n:Drug) WHERE n.name ENDS WITH 'z' RETURN n");
    assert!(program.sql().unwrap().contains("LIKE '%' || ?"));
}

#[test]
fn in_list_parameterizes_every_element() {
    let program = translate("MATCH (n:Drug) WHERE n.code IN ['a', 'b', 'c'] RETURN n");
    assert!(program.sql().unwrap().contains("IN (?, ?, ?)"));
    assert_eq!(
        owned_params(&program),
        vec![json!("Drug"), json!("code"), json!("a"), json!("b"), json!("c")]
    );
}

#[test]
fn in_with_list_parameter() {
    let program = translate_with(
        "MATCH (n:Drug) WHERE n.code IN $codes RETURN n",
        json!({"codes": ["x", "y"]}),
    );
    assert!(program.sql().unwrap().contains("IN (?, ?)"));
}

#[test]
fn numeric_range_comparison_casts_to_double() {
    let program = translate("MATCH (n:Drug) WHERE n.dose > 30 RETURN n");
    let sql = program.sql().unwrap();
    assert!(sql.contains("CAST(p0.val AS DOUBLE) > CAST(? AS DOUBLE)"));
    assert_eq!(
        owned_params(&program),
        vec![json!("Drug"), json!("dose"), json!(30)]
    );
}

#[test]
fn property_join_is_shared_across_clauses() {
    let program = translate("MATCH (n:Drug) WHERE n.name = 'aspirin' RETURN n.name");
    let sql = program.sql().unwrap();
    assert_eq!(sql.matches("LEFT JOIN rdf_props").count(), 1);
    assert!(program
        .metadata
        .optimization_applied
        .contains(&"property_join_sharing".to_string()));
}

#[test]
fn property_access_returns_single_column() {
    let program = translate("MATCH (n:Drug) RETURN n.name");
    assert!(program.sql().unwrap().contains("p0.val AS name"));
}

#[test]
fn outgoing_relationship_joins_edges() {
    let program = translate("MATCH (a:Person)-[:KNOWS]->(b:Person) RETURN b");
    let sql = program.sql().unwrap();
    assert!(sql.contains("JOIN rdf_edges AS e0 ON e0.s = n0.node_id AND e0.p = ?"));
    assert!(sql.contains("JOIN nodes AS n1 ON n1.node_id = e0.o_id"));
    assert_eq!(
        owned_params(&program),
        vec![json!("Person"), json!("KNOWS"), json!("Person")]
    );
}

#[test]
fn incoming_relationship_mirrors_direction() {
    let program = translate("MATCH (a)<-[:KNOWS]-(b) RETURN a");
    let sql = program.sql().unwrap();
    assert!(sql.contains("e0.o_id = n0.node_id"));
    assert!(sql.contains("n1.node_id = e0.s"));
}

#[test]
fn undirected_relationship_reads_union_cte() {
    let program = translate("MATCH (a)-[:KNOWS]-(b) RETURN a");
    let sql = program.sql().unwrap();
    assert!(sql.contains("WITH UndirectedEdges AS ("));
    assert!(sql.contains("UNION ALL"));
    assert!(sql.contains("SELECT o_id AS s, p, s AS o_id FROM rdf_edges"));
    assert!(sql.contains("JOIN UndirectedEdges AS e0"));
}

#[test]
fn fixed_two_hop_chains_edge_joins() {
    let program = translate("MATCH (a)-[:KNOWS*2]->(b) RETURN b");
    let sql = program.sql().unwrap();
    assert!(sql.contains("JOIN rdf_edges AS e0 ON e0.s = n0.node_id"));
    assert!(sql.contains("JOIN rdf_edges AS e1 ON e1.s = e0.o_id"));
    assert!(sql.contains("n1.node_id = e1.o_id"));
    // the hop type binds once per expanded edge
    assert_eq!(
        owned_params(&program),
        vec![json!("KNOWS"), json!("KNOWS")]
    );
}

#[test]
fn unbounded_range_is_refused() {
    let ast = vecgraph::parse_query("MATCH (a)-[:KNOWS*]->(b) RETURN b").unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert!(matches!(err, TranslationError::VariableLengthRange { .. }));
}

#[test]
fn open_range_is_refused() {
    let ast = vecgraph::parse_query("MATCH (a)-[:KNOWS*1..3]->(b) RETURN b").unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert!(matches!(err, TranslationError::VariableLengthRange { .. }));
}

#[test]
fn oversized_fixed_hop_is_refused() {
    let ast = vecgraph::parse_query("MATCH (a)-[:KNOWS*9]->(b) RETURN b").unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert!(matches!(err, TranslationError::VariableLengthRange { .. }));
}

#[test]
fn optional_match_emits_left_joins() {
    let program = translate("MATCH (a:Person) OPTIONAL MATCH (a)-[:KNOWS]->(b) RETURN b");
    let sql = program.sql().unwrap();
    assert!(sql.contains("LEFT JOIN rdf_edges AS e0"));
    assert!(sql.contains("LEFT JOIN nodes AS n1"));
}

#[test]
fn unbound_variable_in_return_fails() {
    let ast = vecgraph::parse_query("MATCH (n:Drug) RETURN m").unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert_eq!(err, TranslationError::UnboundVariable("m".into()));
}

#[test]
fn unbound_variable_in_where_fails() {
    let ast = vecgraph::parse_query("MATCH (n:Drug) WHERE m.x = 1 RETURN n").unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert_eq!(err, TranslationError::UnboundVariable("m".into()));
}

#[test]
fn distinct_is_emitted() {
    let program = translate("MATCH (n:Drug) RETURN DISTINCT n.name");
    assert!(program.sql().unwrap().starts_with("SELECT DISTINCT"));
}

#[test]
fn order_by_defaults_ascending() {
    let program = translate("MATCH (n:Drug) RETURN n.name ORDER BY n.name");
    assert!(program.sql().unwrap().contains("ORDER BY p0.val ASC"));
}

#[test]
fn order_by_descending() {
    let program = translate("MATCH (n:Drug) RETURN n.name ORDER BY n.name DESC");
    assert!(program.sql().unwrap().contains("ORDER BY p0.val DESC"));
}

#[test]
fn cross_pattern_match_uses_comma_join() {
    let program = translate("MATCH (a:Drug), (b:Gene) RETURN a, b");
    let sql = normalize(program.sql().unwrap());
    assert!(sql.contains("FROM nodes AS n0, nodes AS n1"));
}

#[test]
fn inline_property_map_desugars_to_props_join() {
    let program = translate("MATCH (n:Drug {name: 'aspirin'}) RETURN n");
    let sql = program.sql().unwrap();
    assert!(sql.contains("JOIN rdf_props AS p0 ON p0.s = n0.node_id AND p0.key = ? AND p0.val = ?"));
    assert_eq!(
        owned_params(&program),
        vec![json!("Drug"), json!("name"), json!("aspirin")]
    );
}

#[test]
fn with_projection_binds_alias() {
    let program = translate("MATCH (n:Drug) WITH n.name AS name RETURN name");
    assert!(program.sql().unwrap().contains("p0.val AS name"));
}

#[test]
fn edge_variable_returns_edge_columns() {
    let program = translate("MATCH (a)-[r:KNOWS]->(b) RETURN r");
    let sql = program.sql().unwrap();
    assert!(sql.contains("e0.s AS source_id"));
    assert!(sql.contains("e0.p AS rel_type"));
    assert!(sql.contains("e0.o_id AS target_id"));
}

#[test]
fn reading_query_requires_return() {
    let ast = vecgraph::parse_query("MATCH (n:Drug)").unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert!(matches!(err, TranslationError::Unsupported(_)));
}

#[test]
fn metadata_records_label_pushdown_and_rows() {
    let program = translate("MATCH (n:Drug) RETURN n LIMIT 7");
    assert!(program
        .metadata
        .optimization_applied
        .contains(&"label_pushdown".to_string()));
    assert!(program
        .metadata
        .index_usage
        .contains(&"pk_labels".to_string()));
    assert_eq!(program.metadata.estimated_rows, Some(7));
}

#[test]
fn relationship_property_filter_is_unsupported() {
    let ast = vecgraph::parse_query("MATCH (a)-[:KNOWS {since: 2020}]->(b) RETURN a").unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert!(matches!(err, TranslationError::Unsupported(_)));
}

#[test]
fn missing_where_parameter_fails() {
    let err = try_translate_with("MATCH (n:Drug) WHERE n.name = $name RETURN n", json!({}))
        .unwrap_err();
    assert_eq!(err, TranslationError::MissingParameter("name".into()));
}
