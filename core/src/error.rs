//! Error types shared by the Quarry client crates.

use thiserror::Error;

use crate::{QueryId, ResultCode};

/// A failure reported by a remote service.
///
/// Carries the return code, the name of the object the fault is about
/// (database, table, variable or query id), and a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct Fault {
    pub code: ResultCode,
    pub target: Option<String>,
    pub message: String,
}

impl Fault {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            target: None,
            message: message.into(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ResultCode::InternalError, message)
    }

    pub fn invalid_session(session: impl Into<String>) -> Self {
        let session = session.into();
        Self::new(
            ResultCode::InvalidSession,
            format!("invalid session '{}'", session),
        )
        .with_target(session)
    }

    pub fn duplicate_database(name: &str) -> Self {
        Self::new(
            ResultCode::DuplicateDatabase,
            format!("database '{}' already exists", name),
        )
        .with_target(name)
    }

    pub fn undefined_database(name: &str) -> Self {
        Self::new(
            ResultCode::UndefinedDatabase,
            format!("database '{}' does not exist", name),
        )
        .with_target(name)
    }

    pub fn cannot_drop_current_database(name: &str) -> Self {
        Self::new(
            ResultCode::CannotDropCurrentDatabase,
            format!("cannot drop the current database '{}'", name),
        )
        .with_target(name)
    }

    pub fn insufficient_privilege(name: &str) -> Self {
        Self::new(
            ResultCode::InsufficientPrivilege,
            format!("insufficient privilege on '{}'", name),
        )
        .with_target(name)
    }

    pub fn duplicate_table(name: &str) -> Self {
        Self::new(
            ResultCode::DuplicateTable,
            format!("table '{}' already exists", name),
        )
        .with_target(name)
    }

    pub fn undefined_table(name: &str) -> Self {
        Self::new(
            ResultCode::UndefinedTable,
            format!("table '{}' does not exist", name),
        )
        .with_target(name)
    }

    pub fn no_such_session_variable(name: &str) -> Self {
        Self::new(
            ResultCode::NoSuchSessionVariable,
            format!("no such session variable '{}'", name),
        )
        .with_target(name)
    }

    pub fn query_not_found(query_id: &QueryId) -> Self {
        Self::new(
            ResultCode::QueryNotFound,
            format!("query '{}' not found", query_id),
        )
        .with_target(query_id.to_string())
    }

    pub fn connection_not_available(endpoint: &str) -> Self {
        Self::new(
            ResultCode::ClientConnectionNotAvailable,
            format!("cannot connect to '{}'", endpoint),
        )
        .with_target(endpoint)
    }
}

/// Result type for remote service calls.
pub type FaultResult<T> = Result<T, Fault>;

/// Client-visible errors.
///
/// Exactly one variant is produced per failed call. Local validation failures
/// are `InvalidArgument`; remote faults map onto their dedicated variant or
/// fall back to `Internal`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Local pre-flight validation failed; nothing was sent.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("database '{name}' already exists")]
    DuplicateDatabase { name: String },

    #[error("database '{name}' does not exist")]
    UndefinedDatabase { name: String },

    #[error("insufficient privilege: {message}")]
    InsufficientPrivilege { message: String },

    #[error("cannot drop the current database '{name}'")]
    CannotDropCurrentDatabase { name: String },

    #[error("table '{name}' already exists")]
    DuplicateTable { name: String },

    #[error("table '{name}' does not exist")]
    UndefinedTable { name: String },

    #[error("query not found: {query_id}")]
    QueryNotFound { query_id: String },

    #[error("no such session variable: {name}")]
    NoSuchSessionVariable { name: String },

    /// The owning session has been closed.
    #[error("session is already closed")]
    SessionClosed,

    /// A query was rejected or ended in FAILED.
    #[error("query {} failed with {code}: {message}", display_query_id(.query_id))]
    QueryFailed {
        query_id: Option<QueryId>,
        code: ResultCode,
        message: String,
    },

    #[error("query {query_id} was killed")]
    QueryKilled { query_id: QueryId },

    /// A blocking wait was cancelled through its cancel handle.
    #[error("wait for query {query_id} was cancelled")]
    Cancelled { query_id: QueryId },

    /// A blocking wait exhausted its poll budget.
    #[error("query {query_id} did not finish after {attempts} polls")]
    Timeout { query_id: QueryId, attempts: u32 },

    /// Any fault without a dedicated variant.
    #[error("internal error ({code}): {message}")]
    Internal { code: ResultCode, message: String },
}

fn display_query_id(query_id: &Option<QueryId>) -> String {
    query_id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "<unassigned>".to_string())
}

impl ClientError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: ResultCode::InternalError,
            message: message.into(),
        }
    }

    pub fn query_failed(
        query_id: Option<QueryId>,
        code: ResultCode,
        message: impl Into<String>,
    ) -> Self {
        Self::QueryFailed {
            query_id,
            code,
            message: message.into(),
        }
    }

    pub fn query_not_found(query_id: &QueryId) -> Self {
        Self::QueryNotFound {
            query_id: query_id.to_string(),
        }
    }

    /// The result code equivalent of this error.
    pub fn code(&self) -> ResultCode {
        match self {
            ClientError::InvalidArgument { .. } => ResultCode::InvalidArgument,
            ClientError::DuplicateDatabase { .. } => ResultCode::DuplicateDatabase,
            ClientError::UndefinedDatabase { .. } => ResultCode::UndefinedDatabase,
            ClientError::InsufficientPrivilege { .. } => ResultCode::InsufficientPrivilege,
            ClientError::CannotDropCurrentDatabase { .. } => {
                ResultCode::CannotDropCurrentDatabase
            }
            ClientError::DuplicateTable { .. } => ResultCode::DuplicateTable,
            ClientError::UndefinedTable { .. } => ResultCode::UndefinedTable,
            ClientError::QueryNotFound { .. } => ResultCode::QueryNotFound,
            ClientError::NoSuchSessionVariable { .. } => ResultCode::NoSuchSessionVariable,
            ClientError::SessionClosed => ResultCode::InvalidSession,
            ClientError::QueryFailed { code, .. } => *code,
            ClientError::QueryKilled { .. } => ResultCode::QueryKilled,
            ClientError::Cancelled { .. } | ClientError::Timeout { .. } => {
                ResultCode::QueryFailed
            }
            ClientError::Internal { code, .. } => *code,
        }
    }

    /// Returns true if the error was raised before any remote call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidArgument { .. } | ClientError::SessionClosed
        )
    }
}

impl From<Fault> for ClientError {
    fn from(fault: Fault) -> Self {
        let Fault {
            code,
            target,
            message,
        } = fault;
        let target = target.unwrap_or_default();
        match code {
            ResultCode::DuplicateDatabase => ClientError::DuplicateDatabase { name: target },
            ResultCode::UndefinedDatabase => ClientError::UndefinedDatabase { name: target },
            ResultCode::InsufficientPrivilege => ClientError::InsufficientPrivilege { message },
            ResultCode::CannotDropCurrentDatabase => {
                ClientError::CannotDropCurrentDatabase { name: target }
            }
            ResultCode::DuplicateTable => ClientError::DuplicateTable { name: target },
            ResultCode::UndefinedTable => ClientError::UndefinedTable { name: target },
            ResultCode::QueryNotFound => ClientError::QueryNotFound { query_id: target },
            ResultCode::NoSuchSessionVariable => {
                ClientError::NoSuchSessionVariable { name: target }
            }
            ResultCode::InvalidArgument => ClientError::InvalidArgument { message },
            ResultCode::QueryFailed => ClientError::QueryFailed {
                query_id: target.parse::<QueryId>().ok(),
                code,
                message,
            },
            ResultCode::QueryKilled => match target.parse::<QueryId>() {
                Ok(query_id) => ClientError::QueryKilled { query_id },
                Err(_) => ClientError::Internal { code, message },
            },
            code => ClientError::Internal { code, message },
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
