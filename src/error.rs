use miette::Diagnostic;
use thiserror::Error;

use crate::core::Rejection;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rejected(#[from] Rejection),

    #[error("Database error: {0}")]
    #[diagnostic(code(asksql::db))]
    Database(#[from] sqlx::Error),

    #[error("Query timed out after {0} ms")]
    #[diagnostic(code(asksql::db::timeout))]
    Timeout(u128),

    #[error("Backend error: {0}")]
    #[diagnostic(code(asksql::backend))]
    Backend(String),

    #[error("Missing API key. Set one of: ANTHROPIC_API_KEY, CLAUDE_API_KEY, or CLAUDE_KEY")]
    #[diagnostic(code(asksql::config::api_key), help("or pass --api-key"))]
    MissingApiKey,

    #[error("Missing configuration: {0} is not set")]
    #[diagnostic(code(asksql::config::missing))]
    MissingConfig(&'static str),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(asksql::config))]
    Config(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(asksql::http))]
    Http(#[from] reqwest::Error),

    #[error("Server error: {0}")]
    #[diagnostic(code(asksql::server))]
    Server(String),
}

/// First line of a message, for showing backend or database errors to a user.
pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default().trim_end()
}
