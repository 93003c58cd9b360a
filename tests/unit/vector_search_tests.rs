//! `CALL ivg.vector.search(...)` lowering: VecSearch CTE shape, modes,
//! options and error cases.

use serde_json::json;
use vecgraph::TranslationError;

use crate::{owned_params, translate};

#[test]
fn mode1_produces_vecsearch_cte() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'embedding', [0.1, 0.2], 5) YIELD node, score \
         RETURN node, score",
    );
    let sql = program.sql().unwrap();
    assert!(sql.contains("VecSearch AS ("));
    assert!(sql.contains("VECTOR_COSINE"));
    assert!(sql.contains("TO_VECTOR(?)"));
    assert!(sql.contains("kg_NodeEmbeddings"));
}

#[test]
fn mode1_label_filter_is_bound() {
    let program = translate(
        "CALL ivg.vector.search('Drug', 'embedding', [0.5], 3) YIELD node, score \
         RETURN node, score",
    );
    assert!(program.sql().unwrap().contains("WHERE l.label = ?"));
    assert!(owned_params(&program).contains(&json!("Drug")));
}

#[test]
fn mode1_limit_in_cte() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 10) YIELD node, score RETURN node, score",
    );
    assert!(program.sql().unwrap().contains("SELECT TOP 10"));
}

#[test]
fn vector_serializes_as_json() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'emb', [1.0, 0.0, 0.0], 2) YIELD node, score \
         RETURN node, score",
    );
    assert_eq!(
        owned_params(&program),
        vec![json!("[1.0,0.0,0.0]"), json!("Gene")]
    );
}

#[test]
fn integer_vector_elements_become_floats() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'emb', [1, 0, 0], 2) YIELD node, score RETURN node, score",
    );
    assert_eq!(owned_params(&program)[0], json!("[1.0,0.0,0.0]"));
}

#[test]
fn dot_product_similarity() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5, {similarity: 'dot_product'}) \
         YIELD node, score RETURN node, score",
    );
    let sql = program.sql().unwrap();
    assert!(sql.contains("VECTOR_DOT_PRODUCT"));
    assert!(!sql.contains("VECTOR_COSINE"));
}

#[test]
fn score_selected_as_scalar() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5) YIELD node, score RETURN node, score",
    );
    let sql = program.sql().unwrap();
    // score passes through without hydration, node expands with labels/props
    assert!(sql.contains("VecSearch.score AS score"));
    assert!(sql.contains("node_labels"));
}

#[test]
fn order_by_score_desc_inside_cte() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5) YIELD node, score RETURN node, score",
    );
    let sql = program.sql().unwrap().to_string();
    let cte_start = sql.find("VecSearch AS (").unwrap() + "VecSearch AS (".len();
    let cte_end = sql[cte_start..].find("\n)").unwrap() + cte_start;
    let cte_body = &sql[cte_start..cte_end];
    assert!(cte_body.contains("ORDER BY score DESC"));
}

#[test]
fn unknown_similarity_raises() {
    let ast = vecgraph::parse_query(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5, {similarity: 'bad_value'}) \
         YIELD node, score RETURN node, score",
    )
    .unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert_eq!(err, TranslationError::UnknownSimilarity("bad_value".into()));
}

#[test]
fn too_few_args_raises() {
    let ast = vecgraph::parse_query(
        "CALL ivg.vector.search('Gene', 'emb', [0.1]) YIELD node, score RETURN node, score",
    )
    .unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert_eq!(err, TranslationError::ProcedureArity(3));
}

#[test]
fn mode2_missing_embedding_config_raises() {
    let ast = vecgraph::parse_query(
        "CALL ivg.vector.search('Gene', 'emb', 'some text', 5) YIELD node, score \
         RETURN node, score",
    )
    .unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert_eq!(err, TranslationError::MissingEmbeddingConfig);
}

#[test]
fn mode2_uses_embedding_function() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'emb', 'flu symptoms', 5, {embedding_config: 'my_config'}) \
         YIELD node, score RETURN node, score",
    );
    let sql = program.sql().unwrap();
    assert!(sql.contains("EMBEDDING(?, ?)"));
    let params = owned_params(&program);
    assert!(params.contains(&json!("flu symptoms")));
    assert!(params.contains(&json!("my_config")));
}

#[test]
fn unknown_procedure_raises() {
    let ast = vecgraph::parse_query("CALL db.labels() YIELD label RETURN label").unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert_eq!(err, TranslationError::UnknownProcedure("db.labels".into()));
}

#[test]
fn unknown_yield_column_raises() {
    let ast = vecgraph::parse_query(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5) YIELD node, distance RETURN node",
    )
    .unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert!(matches!(err, TranslationError::InvalidArgument { .. }));
}

#[test]
fn non_positive_limit_raises() {
    let ast = vecgraph::parse_query(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 0) YIELD node, score RETURN node",
    )
    .unwrap();
    let err = vecgraph::translate_to_sql(&ast, None).unwrap_err();
    assert!(matches!(err, TranslationError::InvalidArgument { .. }));
}

#[test]
fn vector_metadata_is_tagged() {
    let program = translate(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5) YIELD node, score RETURN node, score",
    );
    assert!(program
        .metadata
        .optimization_applied
        .contains(&"vector_cte".to_string()));
    assert!(program
        .metadata
        .index_usage
        .contains(&"hnsw_emb".to_string()));
}
