// tests for pulling a statement out of model output

use asksql::gate::{extract, separator};

#[test]
fn test_plain_statement_gets_terminator() {
    assert_eq!(
        extract("SELECT id FROM users", "").as_deref(),
        Some("SELECT id FROM users;")
    );
}

#[test]
fn test_surrounding_whitespace() {
    assert_eq!(
        extract("\n\n   SELECT 1;   \n", "").as_deref(),
        Some("SELECT 1;")
    );
}

#[test]
fn test_fenced_block_with_narration() {
    let candidate = "Here you go:\n\n```sql\nSELECT name, balance\nFROM accounts\nORDER BY balance DESC\n```\n\nThis lists accounts by balance.";
    assert_eq!(
        extract(candidate, "").as_deref(),
        Some("SELECT name, balance\nFROM accounts\nORDER BY balance DESC;")
    );
}

#[test]
fn test_fence_marker_any_case() {
    let candidate = "```SQL\nselect 1\n```";
    assert_eq!(extract(candidate, "").as_deref(), Some("select 1;"));
}

#[test]
fn test_narration_before_statement() {
    let candidate = "The query you want is: SELECT * FROM customers WHERE city = 'Ankara'";
    assert_eq!(
        extract(candidate, "").as_deref(),
        Some("SELECT * FROM customers WHERE city = 'Ankara';")
    );
}

#[test]
fn test_keyword_must_be_whole_word() {
    let candidate = "I selected these rows:\nSELECT 1";
    assert_eq!(extract(candidate, "").as_deref(), Some("SELECT 1;"));
}

#[test]
fn test_with_starts_a_statement() {
    let candidate = "with t as (select 1 as x) select x from t";
    assert_eq!(
        extract(candidate, "").as_deref(),
        Some("with t as (select 1 as x) select x from t;")
    );
}

#[test]
fn test_keeps_first_statement_only() {
    assert_eq!(
        extract("SELECT 1; SELECT 2; DROP TABLE t;", "").as_deref(),
        Some("SELECT 1;")
    );
}

#[test]
fn test_separator_inside_literal_does_not_cut() {
    assert_eq!(
        extract("SELECT 'a;b' FROM t; DROP TABLE t;", "").as_deref(),
        Some("SELECT 'a;b' FROM t;")
    );
}

#[test]
fn test_narration_after_separator_is_dropped() {
    let candidate = "SELECT * FROM t; Here's what it does: it's a full scan.";
    assert_eq!(extract(candidate, "").as_deref(), Some("SELECT * FROM t;"));
}

#[test]
fn test_question_echo_is_removed() {
    let question = "Show customers with the highest balance";
    let candidate = "show customers with the highest balance\nSELECT * FROM customers ORDER BY balance DESC";
    assert_eq!(
        extract(candidate, question).as_deref(),
        Some("SELECT * FROM customers ORDER BY balance DESC;")
    );
}

#[test]
fn test_question_that_prefixes_the_statement_is_kept() {
    assert_eq!(
        extract(
            "SELECT name FROM customers WHERE id = 1",
            "SELECT name FROM customers"
        )
        .as_deref(),
        Some("SELECT name FROM customers WHERE id = 1;")
    );
    assert_eq!(
        extract("SELECT name FROM customers", "sel").as_deref(),
        Some("SELECT name FROM customers;")
    );
}

#[test]
fn test_echo_must_fill_its_own_line() {
    let candidate = "list customers SELECT * FROM customers";
    assert_eq!(
        extract(candidate, "list").as_deref(),
        Some("SELECT * FROM customers;")
    );

    let candidate = "List\n  SELECT * FROM customers";
    assert_eq!(
        extract(candidate, "list").as_deref(),
        Some("SELECT * FROM customers;")
    );
}

#[test]
fn test_nothing_to_extract() {
    assert_eq!(extract("", ""), None);
    assert_eq!(extract("   ", ""), None);
    assert_eq!(extract("Sorry, I can't help here.", ""), None);
    assert_eq!(extract("DROP TABLE users;", ""), None);
}

#[test]
fn test_separator_positions() {
    assert_eq!(separator("SELECT 1; SELECT 2"), Some(8));
    assert_eq!(separator("SELECT 1"), None);
    assert_eq!(separator("SELECT 'it''s;' ;"), Some(16));
    assert_eq!(separator("SELECT \"a;b\" ;"), Some(13));
    assert_eq!(separator("SELECT 1 -- ;\n;"), Some(14));
    assert_eq!(separator("SELECT 1 /* ; */ ;"), Some(17));
    assert_eq!(separator("SELECT $$;$$ ;"), Some(13));
    assert_eq!(separator("SELECT $fn$;$fn$ ;"), Some(17));
    assert_eq!(separator("SELECT $1; x"), Some(9));
}

#[test]
fn test_unterminated_literal_has_no_separator() {
    assert_eq!(separator("SELECT 'abc; DROP"), None);
}
