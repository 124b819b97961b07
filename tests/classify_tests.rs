// tests for statement lexing and the ceiling helpers

use std::collections::BTreeSet;

use asksql::gate::{ceiling, classify, requested_top};
use asksql::{GateConfig, SqlDialect};

fn vocabulary() -> BTreeSet<String> {
    let config = GateConfig::default();
    config.allowed.union(&config.denied).cloned().collect()
}

#[test]
fn test_keyword_set() {
    let c = classify(
        "SELECT a FROM t WHERE dropped_at > 1 AND status = 'delete'",
        SqlDialect::Generic,
        &vocabulary(),
    )
    .unwrap();

    assert_eq!(c.leading_keyword.as_deref(), Some("select"));
    assert!(c.keywords.contains("select"));
    assert!(c.keywords.contains("from"));
    assert!(c.keywords.contains("where"));
    assert!(!c.keywords.contains("drop"));
    assert!(!c.keywords.contains("dropped_at"));
    assert!(!c.keywords.contains("delete"));
}

#[test]
fn test_comments_are_not_keywords() {
    let c = classify(
        "/* drop */ SELECT 1 -- delete everything",
        SqlDialect::Generic,
        &vocabulary(),
    )
    .unwrap();

    assert_eq!(c.leading_keyword.as_deref(), Some("select"));
    assert!(!c.keywords.contains("drop"));
    assert!(!c.keywords.contains("delete"));
}

#[test]
fn test_leading_identifier_is_not_a_keyword() {
    let c = classify("customers_report", SqlDialect::Generic, &vocabulary()).unwrap();
    assert_eq!(c.leading_keyword, None);
    assert_eq!(c.statement_count, 1);
}

#[test]
fn test_statement_count() {
    let vocabulary = vocabulary();
    let count = |sql| {
        classify(sql, SqlDialect::Generic, &vocabulary)
            .unwrap()
            .statement_count
    };

    assert_eq!(count(""), 0);
    assert_eq!(count(" ; ; "), 0);
    assert_eq!(count("SELECT 1"), 1);
    assert_eq!(count("SELECT 1;"), 1);
    assert_eq!(count("SELECT 1; -- trailing note"), 1);
    assert_eq!(count("SELECT 1; SELECT 2"), 2);
    assert_eq!(count("SELECT ';' AS semi"), 1);
}

#[test]
fn test_dialect_quoting() {
    let c = classify("SELECT `drop` FROM t", SqlDialect::Mysql, &vocabulary()).unwrap();
    assert!(!c.keywords.contains("drop"));

    let c = classify("SELECT $$a;b$$", SqlDialect::Postgres, &vocabulary()).unwrap();
    assert_eq!(c.statement_count, 1);
}

#[test]
fn test_vocabulary_words_are_keywords() {
    let mut vocabulary = BTreeSet::new();
    vocabulary.insert("frobnicate".to_string());

    let c = classify("frobnicate everything", SqlDialect::Generic, &vocabulary).unwrap();
    assert_eq!(c.leading_keyword.as_deref(), Some("frobnicate"));
}

#[test]
fn test_unterminated_literal() {
    assert!(classify("SELECT 'oops", SqlDialect::Generic, &vocabulary()).is_err());
}

#[test]
fn test_requested_top() {
    assert_eq!(requested_top("top 5 customers by balance"), Some(5));
    assert_eq!(requested_top("show the TOP 12 branches"), Some(12));
    assert_eq!(requested_top("top 0 rows"), None);
    assert_eq!(requested_top("stop 5 things"), None);
    assert_eq!(requested_top("top customers"), None);
    assert_eq!(requested_top("laptop 5"), None);
}

#[test]
fn test_ceiling() {
    let ceiling = |sql| ceiling(sql, SqlDialect::Generic).unwrap();

    assert_eq!(ceiling("SELECT * FROM t LIMIT 10;"), Some(10));
    assert_eq!(ceiling("SELECT * FROM t\nlimit 7"), Some(7));
    assert_eq!(
        ceiling("SELECT * FROM (SELECT * FROM t LIMIT 1) s LIMIT 30"),
        Some(30)
    );
    assert_eq!(ceiling("SELECT * FROM t"), None);
    assert_eq!(ceiling("SELECT * FROM t LIMIT ALL"), None);
    assert_eq!(ceiling("SELECT * FROM t LIMIT 10, 30"), Some(30));
}

#[test]
fn test_ceiling_ignores_comments_literals_and_subqueries() {
    let ceiling = |sql| ceiling(sql, SqlDialect::Generic).unwrap();

    assert_eq!(ceiling("SELECT * FROM t -- LIMIT 10"), None);
    assert_eq!(ceiling("SELECT * FROM t /* limit 3 */"), None);
    assert_eq!(ceiling("SELECT * FROM t WHERE note = 'limit 7'"), None);
    assert_eq!(
        ceiling("SELECT * FROM t WHERE id IN (SELECT id FROM u LIMIT 5)"),
        None
    );
}
