// gate configuration - row ceilings and the statement policy

use std::collections::BTreeSet;

use crate::Error;
use crate::core::SqlDialect;

pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 200;

pub const ALLOWED_STATEMENTS: &[&str] = &["select", "with"];

pub const DENIED_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "truncate", "create", "grant", "revoke",
    "vacuum", "analyze", "call", "do", "copy",
];

/// How a "top N" request in the question relates to `max_limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TopN {
    /// N is clamped to `max_limit` like any other ceiling.
    #[default]
    Clamped,
    /// N is used as given, even above `max_limit`.
    Uncapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub default_limit: u64,
    pub max_limit: u64,
    /// Leading keywords a statement may start with.
    pub allowed: BTreeSet<String>,
    /// Keywords that may not appear anywhere in a statement.
    pub denied: BTreeSet<String>,
    pub dialect: SqlDialect,
    pub top_n: TopN,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            allowed: lowercase(ALLOWED_STATEMENTS.iter().copied()),
            denied: lowercase(DENIED_KEYWORDS.iter().copied()),
            dialect: SqlDialect::default(),
            top_n: TopN::default(),
        }
    }
}

impl GateConfig {
    pub fn with_limits(mut self, default_limit: u64, max_limit: u64) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_top_n(mut self, top_n: TopN) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_allowed<'a>(mut self, allowed: impl IntoIterator<Item = &'a str>) -> Self {
        self.allowed = lowercase(allowed);
        self
    }

    pub fn with_denied<'a>(mut self, denied: impl IntoIterator<Item = &'a str>) -> Self {
        self.denied = lowercase(denied);
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.default_limit == 0 {
            return Err(Error::Config("default limit must be at least 1".to_string()));
        }
        if self.default_limit > self.max_limit {
            return Err(Error::Config(format!(
                "default limit {} exceeds max limit {}",
                self.default_limit, self.max_limit
            )));
        }
        if self.allowed.is_empty() {
            return Err(Error::Config("no statement types are allowed".to_string()));
        }
        if let Some(both) = self.allowed.intersection(&self.denied).next() {
            return Err(Error::Config(format!("'{both}' is both allowed and denied")));
        }
        Ok(())
    }
}

fn lowercase<'a>(words: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    words.into_iter().map(|w| w.trim().to_lowercase()).collect()
}
