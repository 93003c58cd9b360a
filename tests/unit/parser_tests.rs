//! Parser unit tests: clause structure, pattern shapes, and error cases.

use vecgraph::cypher::ast::{
    Direction, Expression, HopRange, Literal, Operator, PageValue, SortOrder,
};
use vecgraph::cypher::ParseError;
use vecgraph::parse_query;

#[test]
fn basic_match_parsed() {
    let q = parse_query("MATCH (n:Drug) RETURN n").unwrap();
    assert_eq!(q.match_clauses.len(), 1);
    let clause = &q.match_clauses[0];
    assert!(!clause.optional);
    assert_eq!(clause.path_patterns.len(), 1);
    let start = &clause.path_patterns[0].start;
    assert_eq!(start.name.as_deref(), Some("n"));
    assert_eq!(start.labels, vec!["Drug".to_string()]);
    assert_eq!(q.return_clause.as_ref().unwrap().items.len(), 1);
}

#[test]
fn optional_match_flag() {
    let q = parse_query("MATCH (a) OPTIONAL MATCH (a)-[:KNOWS]->(b) RETURN a").unwrap();
    assert_eq!(q.match_clauses.len(), 2);
    assert!(!q.match_clauses[0].optional);
    assert!(q.match_clauses[1].optional);
}

#[test]
fn match_where_is_attached_to_clause() {
    let q = parse_query("MATCH (n:Drug) WHERE n.active = TRUE RETURN n").unwrap();
    let clause = &q.match_clauses[0];
    let where_clause = clause.where_clause.as_ref().unwrap();
    match &where_clause.condition {
        Expression::OperatorApplicationExp(op) => {
            assert_eq!(op.operator, Operator::Equal);
            assert_eq!(
                op.operands[1],
                Expression::Literal(Literal::Boolean(true))
            );
        }
        other => panic!("unexpected condition: {:?}", other),
    }
}

#[test]
fn relationship_directions() {
    let q = parse_query("MATCH (a)-[:KNOWS]->(b) RETURN a").unwrap();
    let (rel, _) = &q.match_clauses[0].path_patterns[0].segments[0];
    assert_eq!(rel.direction, Direction::Outgoing);
    assert_eq!(rel.rel_type.as_deref(), Some("KNOWS"));

    let q = parse_query("MATCH (a)<-[:KNOWS]-(b) RETURN a").unwrap();
    let (rel, _) = &q.match_clauses[0].path_patterns[0].segments[0];
    assert_eq!(rel.direction, Direction::Incoming);

    let q = parse_query("MATCH (a)-[:KNOWS]-(b) RETURN a").unwrap();
    let (rel, _) = &q.match_clauses[0].path_patterns[0].segments[0];
    assert_eq!(rel.direction, Direction::Either);
}

#[test]
fn relationship_variable_and_bare_dashes() {
    let q = parse_query("MATCH (a)-[r:KNOWS]->(b) RETURN r").unwrap();
    let (rel, _) = &q.match_clauses[0].path_patterns[0].segments[0];
    assert_eq!(rel.name.as_deref(), Some("r"));

    let q = parse_query("MATCH (a)--(b) RETURN a").unwrap();
    let (rel, _) = &q.match_clauses[0].path_patterns[0].segments[0];
    assert_eq!(rel.direction, Direction::Either);
    assert!(rel.rel_type.is_none());
}

#[test]
fn inline_property_map_parsed() {
    let q = parse_query("MATCH (n:Drug {name: 'aspirin', dose: 5}) RETURN n").unwrap();
    let start = &q.match_clauses[0].path_patterns[0].start;
    assert_eq!(start.properties.len(), 2);
    assert_eq!(start.properties[0].0, "name");
    assert_eq!(
        start.properties[0].1,
        Expression::Literal(Literal::String("aspirin".into()))
    );
    assert_eq!(
        start.properties[1].1,
        Expression::Literal(Literal::Integer(5))
    );
}

#[test]
fn hop_ranges_parsed() {
    let q = parse_query("MATCH (a)-[:KNOWS*2]->(b) RETURN a").unwrap();
    let (rel, _) = &q.match_clauses[0].path_patterns[0].segments[0];
    assert_eq!(rel.hops, Some(HopRange::fixed(2)));

    let q = parse_query("MATCH (a)-[:KNOWS*1..3]->(b) RETURN a").unwrap();
    let (rel, _) = &q.match_clauses[0].path_patterns[0].segments[0];
    assert_eq!(
        rel.hops,
        Some(HopRange {
            min: Some(1),
            max: Some(3)
        })
    );

    let q = parse_query("MATCH (a)-[:KNOWS*]->(b) RETURN a").unwrap();
    let (rel, _) = &q.match_clauses[0].path_patterns[0].segments[0];
    assert_eq!(rel.hops, Some(HopRange::unbounded()));
}

#[test]
fn skip_limit_parameters_parsed() {
    let q = parse_query("MATCH (n) RETURN n SKIP $o LIMIT $l").unwrap();
    let ret = q.return_clause.unwrap();
    assert_eq!(ret.skip, Some(PageValue::Parameter("o".into())));
    assert_eq!(ret.limit, Some(PageValue::Parameter("l".into())));
}

#[test]
fn order_by_directions() {
    let q = parse_query("MATCH (n) RETURN n ORDER BY n.name DESC, n.age").unwrap();
    let ret = q.return_clause.unwrap();
    assert_eq!(ret.order_by.len(), 2);
    assert_eq!(ret.order_by[0].order, SortOrder::Desc);
    assert_eq!(ret.order_by[1].order, SortOrder::Asc);
}

#[test]
fn distinct_and_alias() {
    let q = parse_query("MATCH (n) RETURN DISTINCT n.name AS name").unwrap();
    let ret = q.return_clause.unwrap();
    assert!(ret.distinct);
    assert_eq!(ret.items[0].alias.as_deref(), Some("name"));
}

#[test]
fn basic_call_parsed() {
    let q = parse_query(
        "CALL ivg.vector.search('Gene', 'embedding', [0.1, 0.2], 5) YIELD node, score",
    )
    .unwrap();
    let pc = q.procedure_call.unwrap();
    assert_eq!(pc.name, "ivg.vector.search");
    assert_eq!(pc.arguments.len(), 4);
    assert_eq!(pc.yield_items, vec!["node".to_string(), "score".to_string()]);
}

#[test]
fn options_map_parsed() {
    let q = parse_query(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5, {similarity: 'dot_product'}) YIELD node, score",
    )
    .unwrap();
    let pc = q.procedure_call.unwrap();
    assert_eq!(pc.arguments.len(), 4);
    assert_eq!(
        pc.option("similarity"),
        Some(&Expression::Literal(Literal::String("dot_product".into())))
    );
}

#[test]
fn no_options_defaults_empty() {
    let q = parse_query("CALL ivg.vector.search('Gene', 'emb', [0.1], 5) YIELD node, score")
        .unwrap();
    assert!(q.procedure_call.unwrap().options.is_empty());
}

#[test]
fn call_with_subsequent_return() {
    let q = parse_query(
        "CALL ivg.vector.search('Gene', 'emb', [0.1], 5) YIELD node, score RETURN node, score",
    )
    .unwrap();
    assert!(q.procedure_call.is_some());
    assert!(q.return_clause.is_some());
}

#[test]
fn vector_args_are_list() {
    let q = parse_query(
        "CALL ivg.vector.search('Gene', 'emb', [0.1, 0.2, 0.3], 5) YIELD node, score",
    )
    .unwrap();
    let pc = q.procedure_call.unwrap();
    match &pc.arguments[2] {
        Expression::List(items) => assert_eq!(items.len(), 3),
        other => panic!("expected a list argument, got {:?}", other),
    }
}

#[test]
fn create_merge_set_delete_parsed() {
    let q = parse_query("CREATE (p:Protein {id: 'P:1'})").unwrap();
    assert_eq!(q.create_clauses.len(), 1);

    let q = parse_query("MERGE (p:Protein {id: 'P:1'})").unwrap();
    assert_eq!(q.merge_clauses.len(), 1);

    let q = parse_query("MATCH (n) WHERE n.id = 'x' SET n.name = 'y'").unwrap();
    let set_clause = q.set_clause.unwrap();
    assert_eq!(set_clause.items.len(), 1);
    assert_eq!(set_clause.items[0].target.base, "n");
    assert_eq!(set_clause.items[0].target.key, "name");

    let q = parse_query("MATCH (n) WHERE n.id = 'x' DETACH DELETE n").unwrap();
    let delete_clause = q.delete_clause.unwrap();
    assert!(delete_clause.detach);
    assert_eq!(delete_clause.variables, vec!["n".to_string()]);
}

#[test]
fn with_clause_parsed() {
    let q = parse_query("MATCH (n) WITH n.name AS name RETURN name").unwrap();
    let with_clause = q.with_clause.unwrap();
    assert_eq!(with_clause.items.len(), 1);
    assert_eq!(with_clause.items[0].alias.as_deref(), Some("name"));
}

#[test]
fn string_predicates_parsed() {
    let q = parse_query(
        "MATCH (n) WHERE n.name STARTS WITH 'a' AND n.name ENDS WITH 'z' RETURN n",
    )
    .unwrap();
    assert!(q.match_clauses[0].where_clause.is_some());

    let q = parse_query("MATCH (n) WHERE n.name CONTAINS 'asp' RETURN n").unwrap();
    match &q.match_clauses[0].where_clause.as_ref().unwrap().condition {
        Expression::OperatorApplicationExp(op) => assert_eq!(op.operator, Operator::Contains),
        other => panic!("unexpected condition: {:?}", other),
    }
}

#[test]
fn malformed_queries_do_not_panic() {
    let malformed = vec![
        "",
        "MATCH",
        "MATCH (",
        "MATCH )",
        "MATCH (n",
        "MATCH n)",
        "MATCH (n)-",
        "MATCH (n)-[",
        "MATCH (n)-[]",
        "MATCH (n)-[]-",
        "RETURN",
        "WHERE",
        "MATCH (n) RETURN n WHERE",
        "MATCH (n) BOGUS n",
        "CALL",
        "CALL ivg.",
        "SET n.k",
    ];
    for query in malformed {
        assert!(parse_query(query).is_err(), "should fail: {:?}", query);
    }
}

#[test]
fn parse_error_carries_offset() {
    let err = parse_query("MATCH (n RETURN n").unwrap_err();
    match err {
        ParseError::UnexpectedToken { offset, .. } => assert_eq!(offset, 9),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn trailing_input_rejected() {
    let err = parse_query("MATCH (n) RETURN n MATCH (m)").unwrap_err();
    assert!(matches!(err, ParseError::TrailingInput { .. }));
}

#[test]
fn second_procedure_call_rejected() {
    let err = parse_query(
        "CALL ivg.vector.search('G', 'e', [0.1], 1) YIELD node, score \
         CALL ivg.vector.search('G', 'e', [0.1], 1) YIELD node, score RETURN node",
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::MultipleProcedureCalls { .. }));
}

#[test]
fn variable_bound_as_node_and_edge_rejected() {
    let err = parse_query("MATCH (a)-[a:KNOWS]->(b) RETURN a").unwrap_err();
    assert!(matches!(err, ParseError::DuplicateVariable { .. }));
}

#[test]
fn keywords_accepted_in_any_case() {
    assert!(parse_query("match (n) return n").is_ok());
    assert!(parse_query("Match (n) Where n.x = true Return n").is_ok());
}
