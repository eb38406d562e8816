//! Common error messages used across Quarry components.
//!
//! These constants keep local validation messages identical between the
//! session, catalog and query clients.

/// Error: database name is empty.
pub const ERR_EMPTY_DATABASE_NAME: &str = "database name is empty";

/// Error: database name contains characters outside `[A-Za-z0-9_-]`.
pub const ERR_INVALID_DATABASE_NAME: &str =
    "database name may only contain letters, digits, '_' and '-'";

/// Error: table name is empty.
pub const ERR_EMPTY_TABLE_NAME: &str = "table name is empty";

/// Error: session variable name is empty.
pub const ERR_EMPTY_VARIABLE_NAME: &str = "session variable name is empty";

/// Error: the null query id was supplied where a live query is required.
pub const ERR_NULL_QUERY_ID: &str = "query id is null";

/// Error: a closed result set was read.
pub const ERR_RESULT_SET_CLOSED: &str = "result set is closed";
