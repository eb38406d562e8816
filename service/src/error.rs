//! Statement execution errors.

use quarry_core::{Fault, ResultCode};
use quarry_sql::ParseError;
use thiserror::Error;

/// Result type for planning and execution.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while planning or executing a statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{0}")]
    Syntax(#[from] ParseError),

    #[error("database '{name}' does not exist")]
    UndefinedDatabase { name: String },

    #[error("table '{name}' does not exist")]
    UndefinedTable { name: String },

    #[error("column '{name}' does not exist")]
    UndefinedColumn { name: String },

    #[error("table '{name}' already exists")]
    DuplicateTable { name: String },

    #[error("column '{name}' specified more than once")]
    DuplicateColumn { name: String },

    #[error("datatype mismatch: {message}")]
    DatatypeMismatch { message: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("insufficient privilege: {message}")]
    InsufficientPrivilege { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl EngineError {
    pub fn undefined_database(name: impl Into<String>) -> Self {
        Self::UndefinedDatabase { name: name.into() }
    }

    pub fn undefined_table(name: impl Into<String>) -> Self {
        Self::UndefinedTable { name: name.into() }
    }

    pub fn undefined_column(name: impl Into<String>) -> Self {
        Self::UndefinedColumn { name: name.into() }
    }

    pub fn duplicate_table(name: impl Into<String>) -> Self {
        Self::DuplicateTable { name: name.into() }
    }

    pub fn duplicate_column(name: impl Into<String>) -> Self {
        Self::DuplicateColumn { name: name.into() }
    }

    pub fn datatype_mismatch(message: impl Into<String>) -> Self {
        Self::DatatypeMismatch {
            message: message.into(),
        }
    }

    pub fn insufficient_privilege(message: impl Into<String>) -> Self {
        Self::InsufficientPrivilege {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Result code reported for this error.
    pub fn code(&self) -> ResultCode {
        match self {
            EngineError::Syntax(_) => ResultCode::SyntaxError,
            EngineError::UndefinedDatabase { .. } => ResultCode::UndefinedDatabase,
            EngineError::UndefinedTable { .. } => ResultCode::UndefinedTable,
            EngineError::UndefinedColumn { .. } => ResultCode::UndefinedColumn,
            EngineError::DuplicateTable { .. } => ResultCode::DuplicateTable,
            EngineError::DuplicateColumn { .. } => ResultCode::DuplicateColumn,
            EngineError::DatatypeMismatch { .. } => ResultCode::DatatypeMismatch,
            EngineError::DivisionByZero => ResultCode::DivisionByZero,
            EngineError::InsufficientPrivilege { .. } => ResultCode::InsufficientPrivilege,
            EngineError::Internal { .. } => ResultCode::InternalError,
        }
    }

    /// Name of the object the error is about, if any.
    fn target(&self) -> Option<&str> {
        match self {
            EngineError::UndefinedDatabase { name }
            | EngineError::UndefinedTable { name }
            | EngineError::UndefinedColumn { name }
            | EngineError::DuplicateTable { name }
            | EngineError::DuplicateColumn { name } => Some(name),
            _ => None,
        }
    }
}

impl From<EngineError> for Fault {
    fn from(err: EngineError) -> Self {
        let fault = Fault::new(err.code(), err.to_string());
        match err.target() {
            Some(target) => fault.with_target(target),
            None => fault,
        }
    }
}
