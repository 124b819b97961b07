// core logic - model backends, the sql gate, and the database

mod ai;
mod db;
pub mod gate;
pub mod mock;
mod prompt;

pub use ai::{Ai, Backend, BackendKind};
pub use db::{Db, QueryResult};
pub use gate::{Classification, Gate, Lexeme, Rejection, ShapedStatement, SqlDialect};
