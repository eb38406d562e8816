//! Quarry SQL
//!
//! Parsing for the SQL dialect understood by the in-memory execution service:
//! - Statement parsing (CREATE TABLE, DROP TABLE, INSERT, SELECT)
//! - Expression parsing (arithmetic, comparison, boolean logic, IS NULL)
//! - Error handling with location information

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::*;
pub use error::*;
pub use parser::{parse_script, parse_stmt, Parser};
