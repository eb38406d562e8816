//! Service boundary consumed by the Quarry clients.
//!
//! Three logical services make up a coordinator: sessions, the catalog, and
//! query execution. Every call returns a [`FaultResult`]; a non-OK return
//! state travels as a [`Fault`](quarry_core::Fault).

use quarry_core::{
    FaultResult, KeyValueSet, QueryId, QueryState, ResultCode, Row, Schema, SessionId,
};
use serde::{Deserialize, Serialize};

/// Session lifecycle and session variables.
pub trait SessionService: Send + Sync {
    /// Open a session. `base_database` must exist when given.
    fn create_session(
        &self,
        user: &str,
        base_database: Option<&str>,
        variables: &KeyValueSet,
    ) -> FaultResult<SessionId>;

    fn close_session(&self, session: &SessionId) -> FaultResult<()>;

    fn select_database(&self, session: &SessionId, database: &str) -> FaultResult<()>;

    fn current_database(&self, session: &SessionId) -> FaultResult<String>;

    fn get_session_variables(&self, session: &SessionId) -> FaultResult<KeyValueSet>;

    /// Merge variables into the session and return the resulting set.
    fn update_session_variables(
        &self,
        session: &SessionId,
        variables: &KeyValueSet,
    ) -> FaultResult<KeyValueSet>;

    /// Remove variables from the session and return the resulting set.
    fn unset_session_variables(
        &self,
        session: &SessionId,
        names: &[String],
    ) -> FaultResult<KeyValueSet>;
}

/// Databases and tables.
pub trait CatalogService: Send + Sync {
    fn create_database(&self, session: &SessionId, name: &str) -> FaultResult<()>;

    fn exist_database(&self, session: &SessionId, name: &str) -> FaultResult<bool>;

    /// Drop a database. Checked in order: existence, the caller's current
    /// database, then protected system databases.
    fn drop_database(&self, session: &SessionId, name: &str) -> FaultResult<()>;

    fn get_all_database_names(&self, session: &SessionId) -> FaultResult<Vec<String>>;

    fn exist_table(&self, session: &SessionId, database: &str, table: &str)
        -> FaultResult<bool>;

    fn get_all_table_names(&self, session: &SessionId, database: &str)
        -> FaultResult<Vec<String>>;

    fn get_table_schema(
        &self,
        session: &SessionId,
        database: &str,
        table: &str,
    ) -> FaultResult<Schema>;

    fn drop_table(&self, session: &SessionId, database: &str, table: &str) -> FaultResult<()>;
}

/// Query submission and tracking.
pub trait QueryService: Send + Sync {
    /// Submit SQL text. Statement-level failures are reported in the response
    /// code; only session-level problems are returned as a fault.
    fn submit_query(&self, session: &SessionId, sql: &str) -> FaultResult<SubmitQueryResponse>;

    fn get_query_status(&self, session: &SessionId, query_id: &QueryId)
        -> FaultResult<QueryStatus>;

    /// Fetch up to `limit` rows starting at `offset` of a succeeded query.
    fn fetch_result(
        &self,
        session: &SessionId,
        query_id: &QueryId,
        offset: usize,
        limit: usize,
    ) -> FaultResult<ResultBatch>;

    /// Kill a running query and return its resulting state.
    fn kill_query(&self, session: &SessionId, query_id: &QueryId) -> FaultResult<QueryState>;

    /// Release a query and its buffered result.
    fn close_query(&self, session: &SessionId, query_id: &QueryId) -> FaultResult<()>;
}

/// A full coordinator exposes all three services.
pub trait Coordinator: SessionService + CatalogService + QueryService {}

impl<T> Coordinator for T where T: SessionService + CatalogService + QueryService {}

/// Response to a query submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitQueryResponse {
    /// Null for statements that never became a tracked query.
    pub query_id: QueryId,
    pub state: QueryState,
    pub result_code: ResultCode,
    pub message: Option<String>,
}

impl SubmitQueryResponse {
    /// A statement that completed synchronously.
    pub fn completed() -> Self {
        Self {
            query_id: QueryId::null(),
            state: QueryState::Succeeded,
            result_code: ResultCode::Ok,
            message: None,
        }
    }

    /// A statement rejected before it was tracked.
    pub fn rejected(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            query_id: QueryId::null(),
            state: QueryState::Failed,
            result_code: code,
            message: Some(message.into()),
        }
    }

    /// A statement accepted for asynchronous execution.
    pub fn accepted(query_id: QueryId, state: QueryState) -> Self {
        Self {
            query_id,
            state,
            result_code: ResultCode::Ok,
            message: None,
        }
    }
}

/// Status of a tracked query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStatus {
    pub query_id: QueryId,
    pub state: QueryState,
    /// `Ok` unless the query failed or was killed.
    pub error_code: ResultCode,
    pub error_message: Option<String>,
    /// Fraction of work done, in `[0.0, 1.0]`.
    pub progress: f32,
}

/// A page of result rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBatch {
    pub schema: Schema,
    pub rows: Vec<Row>,
    /// True when no rows remain after this page.
    pub end_of_result: bool,
}
