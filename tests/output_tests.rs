// tests for table rendering

use asksql::QueryResult;
use asksql::output::table;
use serde_json::json;

#[test]
fn test_table() {
    let result = QueryResult {
        columns: vec!["id".to_string(), "name".to_string()],
        rows: vec![vec![json!(1), json!("alice")], vec![json!(22), json!(null)]],
        row_count: 2,
    };

    assert_eq!(
        table(&result),
        "id | name\n---+------\n1  | alice\n22 | null\n"
    );
}

#[test]
fn test_empty_table() {
    let result = QueryResult {
        columns: vec![],
        rows: vec![],
        row_count: 0,
    };
    assert_eq!(table(&result), "no results\n");
}

#[test]
fn test_long_values_are_cut() {
    let long = "x".repeat(60);
    let result = QueryResult {
        columns: vec!["note".to_string()],
        rows: vec![vec![json!(long)]],
        row_count: 1,
    };

    let rendered = table(&result);
    let last = rendered.lines().last().unwrap();
    assert_eq!(last.chars().count(), 40);
    assert!(last.ends_with("..."));
}
