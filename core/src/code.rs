//! Result codes and query execution states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Return code attached to every coordinator response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    Ok,
    InternalError,
    NotImplemented,
    InvalidSession,
    NoSuchSessionVariable,
    InvalidArgument,
    SyntaxError,
    UndefinedDatabase,
    UndefinedTable,
    UndefinedColumn,
    DuplicateDatabase,
    DuplicateTable,
    DuplicateColumn,
    InsufficientPrivilege,
    CannotDropCurrentDatabase,
    DatatypeMismatch,
    DivisionByZero,
    QueryNotFound,
    QueryFailed,
    QueryKilled,
    ClientConnectionNotAvailable,
}

impl ResultCode {
    /// Returns true for the success code.
    pub fn is_ok(&self) -> bool {
        matches!(self, ResultCode::Ok)
    }

    /// Wire name of the code.
    pub fn name(&self) -> &'static str {
        match self {
            ResultCode::Ok => "OK",
            ResultCode::InternalError => "INTERNAL_ERROR",
            ResultCode::NotImplemented => "NOT_IMPLEMENTED",
            ResultCode::InvalidSession => "INVALID_SESSION",
            ResultCode::NoSuchSessionVariable => "NO_SUCH_SESSION_VARIABLE",
            ResultCode::InvalidArgument => "INVALID_ARGUMENT",
            ResultCode::SyntaxError => "SYNTAX_ERROR",
            ResultCode::UndefinedDatabase => "UNDEFINED_DATABASE",
            ResultCode::UndefinedTable => "UNDEFINED_TABLE",
            ResultCode::UndefinedColumn => "UNDEFINED_COLUMN",
            ResultCode::DuplicateDatabase => "DUPLICATE_DATABASE",
            ResultCode::DuplicateTable => "DUPLICATE_TABLE",
            ResultCode::DuplicateColumn => "DUPLICATE_COLUMN",
            ResultCode::InsufficientPrivilege => "INSUFFICIENT_PRIVILEGE",
            ResultCode::CannotDropCurrentDatabase => "CANNOT_DROP_CURRENT_DATABASE",
            ResultCode::DatatypeMismatch => "DATATYPE_MISMATCH",
            ResultCode::DivisionByZero => "DIVISION_BY_ZERO",
            ResultCode::QueryNotFound => "QUERY_NOT_FOUND",
            ResultCode::QueryFailed => "QUERY_FAILED",
            ResultCode::QueryKilled => "QUERY_KILLED",
            ResultCode::ClientConnectionNotAvailable => "CLIENT_CONNECTION_NOT_AVAILABLE",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Execution state of a submitted query, owned by the coordinator.
///
/// `Submitted -> Running -> {Succeeded | Failed | Killed}`. A query may skip
/// straight from `Submitted` to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryState {
    Submitted,
    Running,
    Succeeded,
    Failed,
    Killed,
}

impl QueryState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Killed
        )
    }

    /// Whether `self -> next` is a legal step of the lifecycle.
    pub fn can_transition_to(&self, next: QueryState) -> bool {
        match self {
            QueryState::Submitted => next != QueryState::Submitted,
            QueryState::Running => !matches!(next, QueryState::Submitted | QueryState::Running),
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryState::Submitted => "QUERY_SUBMITTED",
            QueryState::Running => "QUERY_RUNNING",
            QueryState::Succeeded => "QUERY_SUCCEEDED",
            QueryState::Failed => "QUERY_FAILED",
            QueryState::Killed => "QUERY_KILLED",
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
