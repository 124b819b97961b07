// asksql library - natural language to gated, read-only sql

pub mod cli;
pub mod config;
mod core;
mod error;
pub mod logging;
pub mod output;
mod server;

pub use config::{GateConfig, TopN};
pub use crate::core::{
    Ai, Backend, BackendKind, Classification, Db, Gate, Lexeme, QueryResult, Rejection,
    ShapedStatement, SqlDialect, gate, mock,
};
pub use error::{Error, first_line};
pub use server::Server;
