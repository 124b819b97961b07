// output formatting - pretty tables or raw json

use crate::core::{QueryResult, ShapedStatement};

const MAX_WIDTH: usize = 40;

pub struct Output;

impl Output {
    // nice table format for humans
    pub fn pretty(statement: &ShapedStatement, result: &QueryResult) {
        Self::statement(statement);
        println!("rows: {}\n", result.row_count);
        print!("{}", table(result));
    }

    pub fn statement(statement: &ShapedStatement) {
        println!("sql:\n{statement}\n");
        match statement.limit() {
            Some(limit) => println!("limit: {limit}"),
            None => println!("limit: none (aggregate)"),
        }
    }

    // raw json for scripts
    pub fn raw(statement: &ShapedStatement, result: Option<&QueryResult>) {
        let value = serde_json::json!({
            "sql": statement.as_str(),
            "result": result,
        });
        println!("{}", serde_json::to_string(&value).unwrap_or_default());
    }
}

/// Render rows as an aligned text table, one line per row.
pub fn table(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return "no results\n".to_string();
    }

    // figure out column widths, capped so things don't get crazy
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &result.rows {
        for (width, val) in widths.iter_mut().zip(row) {
            *width = (*width).max(format_value(val).chars().count());
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_WIDTH);
    }

    let mut out = String::new();

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, width)| format!("{:width$}", c, width = *width))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&sep.join("-+-"));
    out.push('\n');

    for row in &result.rows {
        let formatted: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, width)| format!("{:width$}", truncate(&format_value(v)), width = *width))
            .collect();
        out.push_str(formatted.join(" | ").trim_end());
        out.push('\n');
    }

    out
}

fn truncate(s: &str) -> String {
    if s.chars().count() > MAX_WIDTH {
        let head: String = s.chars().take(MAX_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn format_value(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => val.to_string(),
    }
}
