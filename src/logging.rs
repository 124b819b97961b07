//! Structured logging setup.
//!
//! Environment variables:
//! - `RUST_LOG`: filter directives (default `info`)
//! - `LOG_FORMAT`: `pretty` (default), `json`, or `compact`
//!
//! Logs go to stderr so query output on stdout stays clean.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init() {
    let format = LogFormat::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("hyper=warn".parse().expect("valid directive"))
        .add_directive("sqlx=warn".parse().expect("valid directive"))
        .add_directive("tower=warn".parse().expect("valid directive"));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(?format, "logging initialized");
    }
}
