//! The query client.

use std::sync::Arc;

use log::debug;
use quarry_core::{ClientError, ClientResult, KeyValueSet, QueryId, QueryState};
use quarry_service::{QueryService, QueryStatus, SubmitQueryResponse};
use quarry_session::SessionConnection;

use crate::cancel::CancelHandle;
use crate::poll;
use crate::result_set::ResultSet;

/// Submits SQL through a session and retrieves its results.
///
/// [`execute_query`](Self::execute_query) and
/// [`get_query_status`](Self::get_query_status) never block beyond a single
/// round trip. Only [`execute_query_and_get_result`](Self::execute_query_and_get_result)
/// and [`wait_for_completion`](Self::wait_for_completion) poll, and both stop
/// after the configured number of attempts or when the
/// [`cancel_handle`](Self::cancel_handle) fires.
#[derive(Debug, Clone)]
pub struct QueryClient {
    connection: Arc<SessionConnection>,
    cancel: CancelHandle,
}

impl QueryClient {
    pub fn new(connection: Arc<SessionConnection>) -> Self {
        Self {
            connection,
            cancel: CancelHandle::new(),
        }
    }

    pub fn connection(&self) -> &Arc<SessionConnection> {
        &self.connection
    }

    /// Handle that stops this client's running blocking waits from another
    /// thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Submit SQL and return without waiting for it to finish.
    ///
    /// A statement the server cannot run is still a successful submission:
    /// the response carries its result code and a null query id.
    pub fn execute_query(&self, sql: &str) -> ClientResult<SubmitQueryResponse> {
        let response = self
            .connection
            .call("submit_query", |svc, sid| svc.submit_query(sid, sql))?;
        debug!(
            "submitted query {} ({}, {})",
            response.query_id, response.state, response.result_code
        );
        Ok(response)
    }

    /// Current state of a query. Null and malformed ids are rejected here;
    /// ids the server does not know are rejected there.
    pub fn get_query_status(&self, query_id: &QueryId) -> ClientResult<QueryStatus> {
        self.check_query_id(query_id)?;
        self.connection.call("get_query_status", |svc, sid| {
            svc.get_query_status(sid, query_id)
        })
    }

    /// Submit SQL, wait for it and open its result.
    ///
    /// A non-OK result code or a terminal state other than succeeded is
    /// raised. Statements that produce no rows yield an empty result.
    pub fn execute_query_and_get_result(&self, sql: &str) -> ClientResult<ResultSet> {
        let cancel = self.cancel.token();
        let response = self.execute_query(sql)?;
        if !response.result_code.is_ok() {
            let query_id = (!response.query_id.is_null()).then(|| response.query_id.clone());
            let message = response
                .message
                .unwrap_or_else(|| response.result_code.name().to_string());
            return Err(ClientError::query_failed(query_id, response.result_code, message));
        }
        if response.query_id.is_null() {
            return Ok(ResultSet::empty(self.connection.clone()));
        }

        let status = poll::wait_for_terminal(&self.connection, &response.query_id, &cancel)?;
        self.open_result(status)
    }

    /// Result of a query that has already finished.
    pub fn get_query_result(&self, query_id: &QueryId) -> ClientResult<ResultSet> {
        let status = self.get_query_status(query_id)?;
        if !status.state.is_terminal() {
            return Err(ClientError::invalid_argument(format!(
                "query {} has not finished ({})",
                query_id, status.state
            )));
        }
        self.open_result(status)
    }

    /// Poll until the query is terminal and return its final status.
    pub fn wait_for_completion(&self, query_id: &QueryId) -> ClientResult<QueryStatus> {
        let cancel = self.cancel.token();
        self.check_query_id(query_id)?;
        poll::wait_for_terminal(&self.connection, query_id, &cancel)
    }

    /// Ask the server to kill a query and return its resulting state.
    pub fn kill_query(&self, query_id: &QueryId) -> ClientResult<QueryState> {
        self.check_query_id(query_id)?;
        self.connection
            .call("kill_query", |svc, sid| svc.kill_query(sid, query_id))
    }

    /// Release a query and its buffered result on the server.
    pub fn close_query(&self, query_id: &QueryId) -> ClientResult<()> {
        self.check_query_id(query_id)?;
        self.connection
            .call("close_query", |svc, sid| svc.close_query(sid, query_id))
    }

    pub fn select_database(&self, name: &str) -> ClientResult<()> {
        self.connection.select_database(name)
    }

    pub fn current_database(&self) -> String {
        self.connection.current_database()
    }

    pub fn get_session_variable(&self, name: &str) -> ClientResult<String> {
        self.connection.get_variable(name)
    }

    pub fn exist_session_variable(&self, name: &str) -> ClientResult<bool> {
        self.connection.exist_variable(name)
    }

    pub fn get_all_session_variables(&self) -> ClientResult<KeyValueSet> {
        self.connection.get_all_variables()
    }

    pub fn update_session_variables(&self, variables: &KeyValueSet) -> ClientResult<KeyValueSet> {
        self.connection.update_variables(variables)
    }

    pub fn unset_session_variables(&self, names: &[&str]) -> ClientResult<KeyValueSet> {
        self.connection.unset_variables(names)
    }

    /// Close the underlying session.
    pub fn close(&self) {
        self.connection.close();
    }

    fn check_query_id(&self, query_id: &QueryId) -> ClientResult<()> {
        self.connection.ensure_open()?;
        if !query_id.is_well_formed() {
            return Err(ClientError::query_not_found(query_id));
        }
        Ok(())
    }

    fn open_result(&self, status: QueryStatus) -> ClientResult<ResultSet> {
        match status.state {
            QueryState::Succeeded => ResultSet::open(self.connection.clone(), status.query_id),
            QueryState::Killed => Err(ClientError::QueryKilled {
                query_id: status.query_id,
            }),
            state => {
                let message = status
                    .error_message
                    .unwrap_or_else(|| format!("query ended {}", state));
                Err(ClientError::query_failed(
                    Some(status.query_id),
                    status.error_code,
                    message,
                ))
            }
        }
    }
}
