//! Combined catalog and query client.

use std::sync::Arc;

use log::debug;
use quarry_catalog::CatalogAdminClient;
use quarry_core::{ClientResult, KeyValueSet, QueryId, QueryState, Schema};
use quarry_query::{CancelHandle, QueryClient, QueryStatus, ResultSet, SubmitQueryResponse};
use quarry_service::ServiceTracker;
use quarry_session::{ClientConfig, SessionConnection};

/// A session with the coordinator and the two clients working through it.
///
/// Both clients share the session, so a database selected through one is
/// seen by the other. [`close`](Self::close) can be called any number of
/// times, including after a failed operation.
#[derive(Debug)]
pub struct QuarryClient {
    connection: Arc<SessionConnection>,
    catalog: CatalogAdminClient,
    query: QueryClient,
}

impl QuarryClient {
    /// Connect using a configuration set. `quarry.client.*` keys configure
    /// the client; the rest become session variables.
    pub fn connect(
        tracker: &dyn ServiceTracker,
        base_database: Option<&str>,
        properties: KeyValueSet,
    ) -> ClientResult<Self> {
        let connection = SessionConnection::open(tracker, base_database, properties)?;
        Ok(Self::from_connection(Arc::new(connection)))
    }

    pub fn connect_with_config(
        tracker: &dyn ServiceTracker,
        base_database: Option<&str>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let connection =
            SessionConnection::open_with_config(tracker, base_database, config, KeyValueSet::new())?;
        Ok(Self::from_connection(Arc::new(connection)))
    }

    /// Build both clients over an already open session.
    pub fn from_connection(connection: Arc<SessionConnection>) -> Self {
        debug!("client ready on session {}", connection.session_id());
        Self {
            catalog: CatalogAdminClient::new(connection.clone()),
            query: QueryClient::new(connection.clone()),
            connection,
        }
    }

    pub fn connection(&self) -> &Arc<SessionConnection> {
        &self.connection
    }

    pub fn catalog(&self) -> &CatalogAdminClient {
        &self.catalog
    }

    pub fn query(&self) -> &QueryClient {
        &self.query
    }

    // ==================== CATALOG ====================

    pub fn create_database(&self, name: &str) -> ClientResult<()> {
        self.catalog.create_database(name)
    }

    pub fn exist_database(&self, name: &str) -> ClientResult<bool> {
        self.catalog.exist_database(name)
    }

    pub fn drop_database(&self, name: &str) -> ClientResult<()> {
        self.catalog.drop_database(name)
    }

    pub fn get_all_database_names(&self) -> ClientResult<Vec<String>> {
        self.catalog.get_all_database_names()
    }

    pub fn exist_table(&self, name: &str) -> ClientResult<bool> {
        self.catalog.exist_table(name)
    }

    pub fn get_table_list(&self, database: Option<&str>) -> ClientResult<Vec<String>> {
        self.catalog.get_table_list(database)
    }

    pub fn get_table_schema(&self, name: &str) -> ClientResult<Schema> {
        self.catalog.get_table_schema(name)
    }

    pub fn drop_table(&self, name: &str) -> ClientResult<()> {
        self.catalog.drop_table(name)
    }

    // ==================== QUERIES ====================

    pub fn execute_query(&self, sql: &str) -> ClientResult<SubmitQueryResponse> {
        self.query.execute_query(sql)
    }

    pub fn get_query_status(&self, query_id: &QueryId) -> ClientResult<QueryStatus> {
        self.query.get_query_status(query_id)
    }

    pub fn execute_query_and_get_result(&self, sql: &str) -> ClientResult<ResultSet> {
        self.query.execute_query_and_get_result(sql)
    }

    pub fn get_query_result(&self, query_id: &QueryId) -> ClientResult<ResultSet> {
        self.query.get_query_result(query_id)
    }

    pub fn wait_for_completion(&self, query_id: &QueryId) -> ClientResult<QueryStatus> {
        self.query.wait_for_completion(query_id)
    }

    pub fn kill_query(&self, query_id: &QueryId) -> ClientResult<QueryState> {
        self.query.kill_query(query_id)
    }

    pub fn close_query(&self, query_id: &QueryId) -> ClientResult<()> {
        self.query.close_query(query_id)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.query.cancel_handle()
    }

    // ==================== SESSION ====================

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

    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    /// Release the session. Later calls on either client fail with
    /// `SessionClosed`.
    pub fn close(&self) {
        self.connection.close();
    }
}
