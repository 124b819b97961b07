// sql gate - decides whether generated sql may run and bounds what it returns
//
// candidate text -> extract -> classify + policy -> row ceiling -> ShapedStatement
// everything here is pure: no io, no shared state, safe to call from any task

mod classify;
mod extract;
mod limit;

pub use classify::{Classification, Lexeme, SqlDialect, classify, lexeme};
pub use extract::{extract, separator};
pub use limit::{ceiling, enforce, requested_top};

use std::collections::BTreeSet;
use std::fmt;

use miette::Diagnostic;
use sqlparser::tokenizer::TokenizerError;
use thiserror::Error;
use tracing::{debug, warn};

use crate::Error;
use crate::config::GateConfig;

/// Why a statement was refused. Always terminal for the request.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Empty SQL")]
    #[diagnostic(code(asksql::gate::empty))]
    EmptyInput,

    #[error("Extraction failed: no SELECT or WITH statement in generated text")]
    #[diagnostic(code(asksql::gate::extraction))]
    ExtractionFailed,

    #[error("Blocked: SQL could not be read ({0})")]
    #[diagnostic(code(asksql::gate::malformed))]
    Malformed(String),

    #[error("Blocked: multiple SQL statements are not allowed")]
    #[diagnostic(code(asksql::gate::multiple))]
    MultipleStatements,

    #[error("Blocked: could not determine SQL type")]
    #[diagnostic(code(asksql::gate::unknown_type))]
    UnknownStatementType,

    #[error("Blocked: statement type not allowed (got: {0})")]
    #[diagnostic(code(asksql::gate::statement_type), help("only read-only queries can run"))]
    DisallowedStatementType(String),

    #[error("Blocked: non read-only SQL keyword detected ({0})")]
    #[diagnostic(code(asksql::gate::keyword))]
    DisallowedKeyword(String),
}

/// A single read-only statement with its row ceiling applied.
///
/// Only [`Gate`] can build one, so holding a `ShapedStatement` means the text
/// passed the policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedStatement {
    sql: String,
    limit: Option<u64>,
}

impl ShapedStatement {
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// The ceiling the statement carries, `None` for exempt aggregates.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn into_string(self) -> String {
        self.sql
    }
}

impl fmt::Display for ShapedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

pub struct Gate {
    config: GateConfig,
    // allowed + denied words, treated as keywords by the lexer
    vocabulary: BTreeSet<String>,
}

impl Default for Gate {
    fn default() -> Self {
        let config = GateConfig::default();
        let vocabulary = vocabulary(&config);
        Self { config, vocabulary }
    }
}

impl Gate {
    pub fn new(config: GateConfig) -> Result<Self, Error> {
        config.validate()?;
        let vocabulary = vocabulary(&config);
        Ok(Self { config, vocabulary })
    }

    /// Run the read-only policy over a statement.
    pub fn check(&self, sql: &str) -> Result<Classification, Rejection> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(Rejection::EmptyInput);
        }

        let classification = classify(sql, self.config.dialect, &self.vocabulary)
            .map_err(|e| Rejection::Malformed(e.to_string()))?;
        debug!(?classification, "classified statement");

        if classification.statement_count > 1 {
            return Err(Rejection::MultipleStatements);
        }

        let Some(leading) = classification.leading_keyword.as_deref() else {
            return Err(Rejection::UnknownStatementType);
        };
        if !self.config.allowed.contains(leading) {
            return Err(Rejection::DisallowedStatementType(leading.to_string()));
        }

        if let Some(denied) = classification
            .keywords
            .iter()
            .find(|keyword| self.config.denied.contains(*keyword))
        {
            return Err(Rejection::DisallowedKeyword(denied.clone()));
        }

        Ok(classification)
    }

    /// Check a statement and apply the row ceiling.
    pub fn shape(&self, sql: &str, question: &str) -> Result<ShapedStatement, Rejection> {
        self.check(sql)?;

        let malformed = |e: TokenizerError| Rejection::Malformed(e.to_string());
        let sql = enforce(sql, question, &self.config).map_err(malformed)?;
        let limit = ceiling(&sql, self.config.dialect).map_err(malformed)?;
        Ok(ShapedStatement { sql, limit })
    }

    /// Full pass over raw model output: extract, check, shape.
    pub fn process(&self, question: &str, candidate: &str) -> Result<ShapedStatement, Rejection> {
        let result = if candidate.trim().is_empty() {
            Err(Rejection::EmptyInput)
        } else {
            extract(candidate, question)
                .ok_or(Rejection::ExtractionFailed)
                .and_then(|statement| self.shape(&statement, question))
        };

        match &result {
            Ok(shaped) => debug!(sql = %shaped, limit = ?shaped.limit(), "statement shaped"),
            Err(rejection) => warn!(reason = %rejection, "statement rejected"),
        }

        result
    }
}

fn vocabulary(config: &GateConfig) -> BTreeSet<String> {
    config.allowed.union(&config.denied).cloned().collect()
}
