//! In-process coordinator.
//!
//! One authoritative registry holds the catalog, open sessions and tracked
//! queries behind a single lock. Tracked queries advance one lifecycle step
//! per status poll, after the configured execution latency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use parking_lot::Mutex;
use quarry_core::{
    is_valid_database_name, messages, Fault, FaultResult, KeyValueSet, QueryId, QueryState,
    ResultCode, Schema, SessionId, CURRENT_DATABASE_VAR, DEFAULT_DATABASE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::{
    CatalogService, QueryService, QueryStatus, ResultBatch, SessionService, SubmitQueryResponse,
};
use crate::catalog::Catalog;
use crate::error::EngineError;
use crate::executor::{Executor, QueryOutput};
use crate::plan::{Plan, QueryPlanner};

/// Coordinator settings.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Status polls a tracked query spends before it executes.
    pub execution_latency: u32,
    /// Seed for session identifiers; random when unset.
    pub seed: Option<u64>,
    /// Context string of issued query ids; random when unset.
    pub instance_id: Option<String>,
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_execution_latency(mut self, polls: u32) -> Self {
        self.execution_latency = polls;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }
}

#[derive(Debug)]
struct SessionState {
    user: String,
    current_database: String,
    variables: KeyValueSet,
}

#[derive(Debug)]
struct TrackedQuery {
    owner: SessionId,
    plan: Plan,
    state: QueryState,
    latency: u32,
    remaining_polls: u32,
    output: Option<QueryOutput>,
    error: Option<EngineError>,
}

impl TrackedQuery {
    fn new(owner: SessionId, plan: Plan, latency: u32) -> Self {
        Self {
            owner,
            plan,
            state: QueryState::Submitted,
            latency,
            remaining_polls: latency,
            output: None,
            error: None,
        }
    }

    fn transition(&mut self, next: QueryState) {
        debug_assert!(self.state.can_transition_to(next));
        self.state = next;
    }

    /// Run the plan and settle on a terminal state.
    fn complete(&mut self, catalog: &mut Catalog) {
        match Executor::new(catalog).execute(&self.plan) {
            Ok(output) => {
                self.output = Some(output);
                self.transition(QueryState::Succeeded);
            }
            Err(err) => {
                self.error = Some(err);
                self.transition(QueryState::Failed);
            }
        }
    }

    /// Advance one step of the lifecycle.
    fn poll(&mut self, catalog: &mut Catalog) {
        if self.state.is_terminal() {
            return;
        }
        if self.remaining_polls > 0 {
            self.remaining_polls -= 1;
            if self.state == QueryState::Submitted {
                self.transition(QueryState::Running);
            }
        } else {
            self.complete(catalog);
        }
    }

    fn progress(&self) -> f32 {
        match self.state {
            QueryState::Submitted => 0.0,
            QueryState::Running => {
                (self.latency - self.remaining_polls) as f32 / (self.latency + 1) as f32
            }
            _ => 1.0,
        }
    }

    fn status(&self, query_id: &QueryId) -> QueryStatus {
        let (error_code, error_message) = match self.state {
            QueryState::Failed => match &self.error {
                Some(err) => (err.code(), Some(err.to_string())),
                None => (ResultCode::InternalError, None),
            },
            QueryState::Killed => (
                ResultCode::QueryKilled,
                Some(format!("query {} was killed", query_id)),
            ),
            _ => (ResultCode::Ok, None),
        };
        QueryStatus {
            query_id: query_id.clone(),
            state: self.state,
            error_code,
            error_message,
            progress: self.progress(),
        }
    }
}

struct CoordinatorState {
    catalog: Catalog,
    sessions: HashMap<SessionId, SessionState>,
    queries: HashMap<QueryId, TrackedQuery>,
    next_seq: i32,
    rng: StdRng,
}

impl CoordinatorState {
    fn session(&self, id: &SessionId) -> FaultResult<&SessionState> {
        self.sessions
            .get(id)
            .ok_or_else(|| Fault::invalid_session(id.as_str()))
    }

    fn session_mut(&mut self, id: &SessionId) -> FaultResult<&mut SessionState> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| Fault::invalid_session(id.as_str()))
    }

    fn next_session_id(&mut self) -> SessionId {
        loop {
            let id = SessionId::new(format!("{:016x}", self.rng.gen::<u64>()));
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }

    /// Plan and run a statement immediately, regardless of latency.
    fn run_now(
        &mut self,
        current_database: &str,
        stmt: &quarry_sql::Stmt,
    ) -> Result<(), EngineError> {
        let plan = QueryPlanner::new(&self.catalog, current_database).plan(stmt)?;
        Executor::new(&mut self.catalog).execute(&plan)?;
        Ok(())
    }
}

/// Find a query owned by `session`. Malformed, unknown and foreign ids all
/// read as not found.
fn find_query<'a>(
    queries: &'a mut HashMap<QueryId, TrackedQuery>,
    session: &SessionId,
    query_id: &QueryId,
) -> FaultResult<&'a mut TrackedQuery> {
    if !query_id.is_well_formed() {
        return Err(Fault::query_not_found(query_id));
    }
    match queries.get_mut(query_id) {
        Some(query) if &query.owner == session => Ok(query),
        _ => Err(Fault::query_not_found(query_id)),
    }
}

/// An in-process implementation of every coordinator service.
pub struct InMemoryCoordinator {
    instance_id: String,
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
    requests: AtomicU64,
}

impl Default for InMemoryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCoordinator {
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let instance_id = config
            .instance_id
            .clone()
            .unwrap_or_else(|| format!("{:08x}", rng.gen::<u32>()));
        Self {
            instance_id,
            config,
            state: Mutex::new(CoordinatorState {
                catalog: Catalog::new(),
                sessions: HashMap::new(),
                queries: HashMap::new(),
                next_seq: 0,
                rng,
            }),
            requests: AtomicU64::new(0),
        }
    }

    /// Context string carried by every query id this coordinator issues.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Number of service calls received so far.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Number of tracked queries that have not been closed.
    pub fn tracked_query_count(&self) -> usize {
        self.state.lock().queries.len()
    }

    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

// ==================== SESSIONS ====================

impl SessionService for InMemoryCoordinator {
    fn create_session(
        &self,
        user: &str,
        base_database: Option<&str>,
        variables: &KeyValueSet,
    ) -> FaultResult<SessionId> {
        self.record_request();
        let mut state = self.state.lock();

        let base = base_database
            .map(str::to_string)
            .or_else(|| variables.get(CURRENT_DATABASE_VAR).cloned());
        if let Some(db) = &base {
            if !state.catalog.exists_database(db) {
                return Err(Fault::undefined_database(db));
            }
        }

        let mut vars = variables.clone();
        vars.remove(CURRENT_DATABASE_VAR);
        // Without a base database the session works in the default database
        // but the variable stays unset until a database is selected.
        let current_database = match base {
            Some(db) => {
                vars.insert(CURRENT_DATABASE_VAR.to_string(), db.clone());
                db
            }
            None => DEFAULT_DATABASE.to_string(),
        };

        let id = state.next_session_id();
        info!(
            "opened session {} for user '{}' in database '{}'",
            id, user, current_database
        );
        state.sessions.insert(
            id.clone(),
            SessionState {
                user: user.to_string(),
                current_database,
                variables: vars,
            },
        );
        Ok(id)
    }

    fn close_session(&self, session: &SessionId) -> FaultResult<()> {
        self.record_request();
        let mut state = self.state.lock();
        let closed = state
            .sessions
            .remove(session)
            .ok_or_else(|| Fault::invalid_session(session.as_str()))?;
        state.queries.retain(|_, q| &q.owner != session);
        info!("closed session {} of user '{}'", session, closed.user);
        Ok(())
    }

    fn select_database(&self, session: &SessionId, database: &str) -> FaultResult<()> {
        self.record_request();
        let mut state = self.state.lock();
        state.session(session)?;
        if !state.catalog.exists_database(database) {
            return Err(Fault::undefined_database(database));
        }
        let entry = state.session_mut(session)?;
        entry.current_database = database.to_string();
        entry
            .variables
            .insert(CURRENT_DATABASE_VAR.to_string(), database.to_string());
        Ok(())
    }

    fn current_database(&self, session: &SessionId) -> FaultResult<String> {
        self.record_request();
        let state = self.state.lock();
        Ok(state.session(session)?.current_database.clone())
    }

    fn get_session_variables(&self, session: &SessionId) -> FaultResult<KeyValueSet> {
        self.record_request();
        let state = self.state.lock();
        Ok(state.session(session)?.variables.clone())
    }

    fn update_session_variables(
        &self,
        session: &SessionId,
        variables: &KeyValueSet,
    ) -> FaultResult<KeyValueSet> {
        self.record_request();
        let mut state = self.state.lock();
        state.session(session)?;
        if variables.keys().any(|name| name.is_empty()) {
            return Err(Fault::new(
                ResultCode::InvalidArgument,
                messages::ERR_EMPTY_VARIABLE_NAME,
            ));
        }
        // Setting CURRENT_DATABASE is a database selection.
        if let Some(db) = variables.get(CURRENT_DATABASE_VAR) {
            if !state.catalog.exists_database(db) {
                return Err(Fault::undefined_database(db));
            }
        }
        let entry = state.session_mut(session)?;
        for (name, value) in variables {
            if name == CURRENT_DATABASE_VAR {
                entry.current_database = value.clone();
            }
            entry.variables.insert(name.clone(), value.clone());
        }
        Ok(entry.variables.clone())
    }

    fn unset_session_variables(
        &self,
        session: &SessionId,
        names: &[String],
    ) -> FaultResult<KeyValueSet> {
        self.record_request();
        let mut state = self.state.lock();
        let entry = state.session_mut(session)?;
        for name in names {
            entry.variables.remove(name);
        }
        Ok(entry.variables.clone())
    }
}

// ==================== CATALOG ====================

impl CatalogService for InMemoryCoordinator {
    fn create_database(&self, session: &SessionId, name: &str) -> FaultResult<()> {
        self.record_request();
        let mut state = self.state.lock();
        state.session(session)?;
        if !is_valid_database_name(name) {
            return Err(Fault::new(
                ResultCode::InvalidArgument,
                format!("{}: '{}'", messages::ERR_INVALID_DATABASE_NAME, name),
            )
            .with_target(name));
        }
        if !state.catalog.create_database(name) {
            return Err(Fault::duplicate_database(name));
        }
        info!("created database '{}'", name);
        Ok(())
    }

    fn exist_database(&self, session: &SessionId, name: &str) -> FaultResult<bool> {
        self.record_request();
        let state = self.state.lock();
        state.session(session)?;
        Ok(state.catalog.exists_database(name))
    }

    fn drop_database(&self, session: &SessionId, name: &str) -> FaultResult<()> {
        self.record_request();
        let mut state = self.state.lock();
        let current = state.session(session)?.current_database.clone();
        if !state.catalog.exists_database(name) {
            return Err(Fault::undefined_database(name));
        }
        if current == name {
            return Err(Fault::cannot_drop_current_database(name));
        }
        if Catalog::is_system_database(name) {
            return Err(Fault::insufficient_privilege(name));
        }
        state.catalog.drop_database(name);
        info!("dropped database '{}'", name);
        Ok(())
    }

    fn get_all_database_names(&self, session: &SessionId) -> FaultResult<Vec<String>> {
        self.record_request();
        let state = self.state.lock();
        state.session(session)?;
        Ok(state.catalog.database_names())
    }

    fn exist_table(&self, session: &SessionId, database: &str, table: &str) -> FaultResult<bool> {
        self.record_request();
        let state = self.state.lock();
        state.session(session)?;
        Ok(state.catalog.exists_table(database, table)?)
    }

    fn get_all_table_names(&self, session: &SessionId, database: &str) -> FaultResult<Vec<String>> {
        self.record_request();
        let state = self.state.lock();
        state.session(session)?;
        Ok(state.catalog.table_names(database)?)
    }

    fn get_table_schema(
        &self,
        session: &SessionId,
        database: &str,
        table: &str,
    ) -> FaultResult<Schema> {
        self.record_request();
        let state = self.state.lock();
        state.session(session)?;
        Ok(state.catalog.table_schema(database, table)?)
    }

    fn drop_table(&self, session: &SessionId, database: &str, table: &str) -> FaultResult<()> {
        self.record_request();
        let mut state = self.state.lock();
        state.session(session)?;
        state.catalog.drop_table(database, table, false)?;
        info!("dropped table '{}.{}'", database, table);
        Ok(())
    }
}

// ==================== QUERIES ====================

impl QueryService for InMemoryCoordinator {
    fn submit_query(&self, session: &SessionId, sql: &str) -> FaultResult<SubmitQueryResponse> {
        self.record_request();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let current = state.session(session)?.current_database.clone();
        debug!("session {} submitted: {}", session, sql);

        if sql.trim().is_empty() {
            return Ok(SubmitQueryResponse::rejected(
                ResultCode::InternalError,
                "empty query",
            ));
        }

        let rejected = |err: EngineError| SubmitQueryResponse::rejected(err.code(), err.to_string());

        let stmts = match quarry_sql::parse_script(sql) {
            Ok(stmts) => stmts,
            Err(err) => return Ok(rejected(err.into())),
        };
        let Some((last, leading)) = stmts.split_last() else {
            return Ok(SubmitQueryResponse::rejected(
                ResultCode::InternalError,
                "empty query",
            ));
        };

        // Leading statements of a script run synchronously in order.
        for stmt in leading {
            if let Err(err) = state.run_now(&current, stmt) {
                return Ok(rejected(err));
            }
        }

        let plan = match QueryPlanner::new(&state.catalog, &current).plan(last) {
            Ok(plan) => plan,
            Err(err) => return Ok(rejected(err)),
        };

        if plan.is_ddl() {
            return Ok(match Executor::new(&mut state.catalog).execute(&plan) {
                Ok(_) => SubmitQueryResponse::completed(),
                Err(err) => rejected(err),
            });
        }

        state.next_seq += 1;
        let query_id = QueryId::new(self.instance_id.clone(), state.next_seq);
        let mut query = TrackedQuery::new(session.clone(), plan, self.config.execution_latency);
        if query.latency == 0 {
            query.complete(&mut state.catalog);
        }
        debug!("query {} is {}", query_id, query.state);
        let response = SubmitQueryResponse::accepted(query_id.clone(), query.state);
        state.queries.insert(query_id, query);
        Ok(response)
    }

    fn get_query_status(
        &self,
        session: &SessionId,
        query_id: &QueryId,
    ) -> FaultResult<QueryStatus> {
        self.record_request();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.session(session)?;
        let query = find_query(&mut state.queries, session, query_id)?;
        query.poll(&mut state.catalog);
        Ok(query.status(query_id))
    }

    fn fetch_result(
        &self,
        session: &SessionId,
        query_id: &QueryId,
        offset: usize,
        limit: usize,
    ) -> FaultResult<ResultBatch> {
        self.record_request();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.session(session)?;
        if limit == 0 {
            return Err(Fault::new(
                ResultCode::InvalidArgument,
                "fetch limit must be positive",
            ));
        }
        let query = find_query(&mut state.queries, session, query_id)?;
        match (query.state, &query.output) {
            (QueryState::Succeeded, Some(output)) => {
                let start = offset.min(output.rows.len());
                let end = offset.saturating_add(limit).min(output.rows.len());
                Ok(ResultBatch {
                    schema: output.schema.clone(),
                    rows: output.rows[start..end].to_vec(),
                    end_of_result: end >= output.rows.len(),
                })
            }
            (QueryState::Failed, _) => Err(Fault::new(
                ResultCode::QueryFailed,
                format!(
                    "query {} failed: {}",
                    query_id,
                    query
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_default()
                ),
            )
            .with_target(query_id.to_string())),
            (QueryState::Killed, _) => Err(Fault::new(
                ResultCode::QueryKilled,
                format!("query {} was killed", query_id),
            )
            .with_target(query_id.to_string())),
            (state, _) => Err(Fault::new(
                ResultCode::InvalidArgument,
                format!("query {} has not finished ({})", query_id, state),
            )
            .with_target(query_id.to_string())),
        }
    }

    fn kill_query(&self, session: &SessionId, query_id: &QueryId) -> FaultResult<QueryState> {
        self.record_request();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.session(session)?;
        let query = find_query(&mut state.queries, session, query_id)?;
        if !query.state.is_terminal() {
            query.transition(QueryState::Killed);
            info!("killed query {}", query_id);
        }
        Ok(query.state)
    }

    fn close_query(&self, session: &SessionId, query_id: &QueryId) -> FaultResult<()> {
        self.record_request();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.session(session)?;
        find_query(&mut state.queries, session, query_id)?;
        state.queries.remove(query_id);
        debug!("closed query {}", query_id);
        Ok(())
    }
}
