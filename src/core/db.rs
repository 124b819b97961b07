// database connection and query execution
// supports postgres, sqlite, and mysql

use std::time::Duration;

use serde::Serialize;
use sqlx::{AnyPool, Column, Row, any::AnyPoolOptions};
use tracing::{info, warn};

use super::{ShapedStatement, SqlDialect};
use crate::Error;

pub struct Db {
    pool: AnyPool,
    dialect: Dialect,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Postgres,
    Sqlite,
    Mysql,
}

impl Db {
    /// `timeout` bounds every statement run through [`Db::run`].
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, Error> {
        sqlx::any::install_default_drivers();

        // figure out which database we're talking to
        let dialect = detect_dialect(url);

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;

        Ok(Self {
            pool,
            dialect,
            timeout,
        })
    }

    pub fn dialect_name(&self) -> &'static str {
        match self.dialect {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
        }
    }

    /// Tokenizer dialect matching the connected database.
    pub fn gate_dialect(&self) -> SqlDialect {
        match self.dialect {
            Dialect::Postgres => SqlDialect::Postgres,
            Dialect::Sqlite => SqlDialect::Sqlite,
            Dialect::Mysql => SqlDialect::Mysql,
        }
    }

    // get table and column info so the model knows what to query
    pub async fn schema(&self) -> Result<String, Error> {
        let rows = match self.dialect {
            Dialect::Postgres => self.postgres_schema().await?,
            Dialect::Sqlite => self.sqlite_schema().await?,
            Dialect::Mysql => self.mysql_schema().await?,
        };

        Ok(format_schema(self.dialect_name(), rows))
    }

    async fn postgres_schema(&self) -> Result<Vec<(String, String, String)>, Error> {
        let rows = sqlx::query_as(
            r#"SELECT table_name::text, column_name::text, data_type::text
               FROM information_schema.columns
               WHERE table_schema = 'public'
               ORDER BY table_name, ordinal_position"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn sqlite_schema(&self) -> Result<Vec<(String, String, String)>, Error> {
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for (table,) in tables {
            let query = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
            let cols: Vec<(i32, String, String, i32, Option<String>, i32)> =
                sqlx::query_as(&query).fetch_all(&self.pool).await?;

            for (_, name, dtype, _, _, _) in cols {
                result.push((table.clone(), name, dtype));
            }
        }

        Ok(result)
    }

    async fn mysql_schema(&self) -> Result<Vec<(String, String, String)>, Error> {
        let rows = sqlx::query_as(
            r#"SELECT table_name, column_name, data_type
               FROM information_schema.columns
               WHERE table_schema = DATABASE()
               ORDER BY table_name, ordinal_position"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Run a gated statement and return the rows as json.
    ///
    /// The statement runs in a transaction that is always rolled back and is
    /// cut off after the configured timeout.
    pub async fn run(&self, statement: &ShapedStatement) -> Result<QueryResult, Error> {
        let timeout_ms = self.timeout.as_millis();
        let mut tx = self.pool.begin().await?;

        // let postgres stop long queries on its own side too
        if self.dialect == Dialect::Postgres {
            sqlx::query(&format!("SET LOCAL statement_timeout = {timeout_ms}"))
                .execute(&mut *tx)
                .await?;
        }

        let fetched = tokio::time::timeout(
            self.timeout,
            sqlx::query(statement.as_str()).fetch_all(&mut *tx),
        )
        .await;

        let rows = match fetched {
            Ok(rows) => rows?,
            Err(_) => {
                warn!(timeout_ms, "query timed out");
                return Err(Error::Timeout(timeout_ms));
            }
        };
        tx.rollback().await?;

        let result = to_result(&rows);
        info!(rows = result.row_count, "query executed");
        Ok(result)
    }
}

fn to_result(rows: &[sqlx::any::AnyRow]) -> QueryResult {
    let Some(first) = rows.first() else {
        return QueryResult {
            columns: vec![],
            rows: vec![],
            row_count: 0,
        };
    };

    let columns: Vec<String> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let json_rows: Vec<Vec<serde_json::Value>> = rows
        .iter()
        .map(|row| {
            (0..columns.len())
                .map(|i| row_value_to_json(row, i))
                .collect()
        })
        .collect();

    let row_count = json_rows.len();

    QueryResult {
        columns,
        rows: json_rows,
        row_count,
    }
}

// figure out dialect from connection string
fn detect_dialect(url: &str) -> Dialect {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Dialect::Postgres
    } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
        Dialect::Mysql
    } else {
        Dialect::Sqlite
    }
}

// one line per table: "- accounts: account_no (integer), balance (numeric)"
fn format_schema(dialect: &str, rows: Vec<(String, String, String)>) -> String {
    let mut lines = vec![format!("DATABASE SCHEMA ({dialect}):")];
    let mut current_table: Option<String> = None;
    let mut columns: Vec<String> = Vec::new();

    for (table, column, dtype) in rows {
        if current_table.as_deref() != Some(table.as_str())
            && let Some(done) = current_table.replace(table)
        {
            lines.push(format!("- {done}: {}", columns.join(", ")));
            columns.clear();
        }
        columns.push(format!("{column} ({dtype})"));
    }

    if let Some(done) = current_table {
        lines.push(format!("- {done}: {}", columns.join(", ")));
    }

    lines.join("\n")
}

// convert database values to json (handling type mismatches gracefully)
fn row_value_to_json(row: &sqlx::any::AnyRow, index: usize) -> serde_json::Value {
    use sqlx::ValueRef;

    // null check first
    if row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true) {
        return serde_json::Value::Null;
    }

    // try types in order of how common they are
    if let Ok(v) = row.try_get::<String, _>(index) {
        return serde_json::Value::String(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<i32, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return serde_json::Number::from_f64(v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return serde_json::Value::Bool(v);
    }

    // some postgres types just don't work with the any driver
    serde_json::Value::String("<unsupported>".to_string())
}
