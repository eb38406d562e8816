//! Client-side handle of a coordinator session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;
use quarry_core::{
    messages, validate_database_name, ClientError, ClientResult, FaultResult, KeyValueSet,
    SessionId, CURRENT_DATABASE_VAR,
};
use quarry_service::{Coordinator, ServiceTracker, SessionService};

use crate::config::ClientConfig;

/// An open session with the coordinator.
///
/// Shared by the catalog and query clients. Closing is idempotent and
/// releases the remote session exactly once; dropping the last handle
/// closes it too.
pub struct SessionConnection {
    service: Arc<dyn Coordinator>,
    endpoint: String,
    session_id: SessionId,
    config: ClientConfig,
    /// Last database the server confirmed.
    current_database: RwLock<String>,
    closed: AtomicBool,
}

impl std::fmt::Debug for SessionConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConnection")
            .field("endpoint", &self.endpoint)
            .field("session_id", &self.session_id)
            .field("current_database", &*self.current_database.read())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl SessionConnection {
    /// Open a session from a configuration set. `quarry.client.*` keys
    /// configure the client; all other keys become session variables.
    pub fn open(
        tracker: &dyn ServiceTracker,
        base_database: Option<&str>,
        properties: KeyValueSet,
    ) -> ClientResult<Self> {
        if let Some(db) = base_database {
            validate_database_name(db)?;
        }
        let (config, variables) = ClientConfig::from_properties(&properties)?;
        Self::open_with_config(tracker, base_database, config, variables)
    }

    /// Open a session with an explicit configuration.
    pub fn open_with_config(
        tracker: &dyn ServiceTracker,
        base_database: Option<&str>,
        config: ClientConfig,
        variables: KeyValueSet,
    ) -> ClientResult<Self> {
        if let Some(db) = base_database {
            validate_database_name(db)?;
        }
        config.validate()?;

        let endpoint = tracker.endpoint();
        debug!("connecting to coordinator at {}", endpoint);
        let service = tracker.connect()?;
        let session_id = service.create_session(&config.user, base_database, &variables)?;
        let current_database = match service.current_database(&session_id) {
            Ok(db) => db,
            Err(fault) => {
                // Do not leak the session we just created.
                let _ = service.close_session(&session_id);
                return Err(fault.into());
            }
        };
        info!(
            "session {} opened on {} as '{}' in database '{}'",
            session_id, endpoint, config.user, current_database
        );

        Ok(Self {
            service,
            endpoint,
            session_id,
            config,
            current_database: RwLock::new(current_database),
            closed: AtomicBool::new(false),
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session's current database as last confirmed by the server.
    pub fn current_database(&self) -> String {
        self.current_database.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn ensure_open(&self) -> ClientResult<()> {
        if self.is_closed() {
            return Err(ClientError::SessionClosed);
        }
        Ok(())
    }

    /// Issue a remote call on behalf of this session.
    ///
    /// Fails with `SessionClosed` without contacting the server once the
    /// session is closed; remote faults map onto the client taxonomy.
    pub fn call<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&dyn Coordinator, &SessionId) -> FaultResult<T>,
    ) -> ClientResult<T> {
        self.ensure_open()?;
        debug!("session {}: {}", self.session_id, operation);
        f(self.service.as_ref(), &self.session_id).map_err(ClientError::from)
    }

    /// Switch the session's current database.
    pub fn select_database(&self, name: &str) -> ClientResult<()> {
        validate_database_name(name)?;
        self.call("select_database", |svc, sid| svc.select_database(sid, name))?;
        *self.current_database.write() = name.to_string();
        info!("session {} selected database '{}'", self.session_id, name);
        Ok(())
    }

    /// Value of a session variable.
    pub fn get_variable(&self, name: &str) -> ClientResult<String> {
        check_variable_name(name)?;
        self.get_all_variables()?
            .remove(name)
            .ok_or_else(|| ClientError::NoSuchSessionVariable {
                name: name.to_string(),
            })
    }

    pub fn exist_variable(&self, name: &str) -> ClientResult<bool> {
        check_variable_name(name)?;
        Ok(self.get_all_variables()?.contains_key(name))
    }

    pub fn get_all_variables(&self) -> ClientResult<KeyValueSet> {
        self.call("get_session_variables", |svc, sid| {
            svc.get_session_variables(sid)
        })
    }

    /// Merge variables into the session. Setting `CURRENT_DATABASE` selects
    /// that database.
    pub fn update_variables(&self, variables: &KeyValueSet) -> ClientResult<KeyValueSet> {
        for name in variables.keys() {
            check_variable_name(name)?;
        }
        if let Some(db) = variables.get(CURRENT_DATABASE_VAR) {
            validate_database_name(db)?;
        }
        let updated = self.call("update_session_variables", |svc, sid| {
            svc.update_session_variables(sid, variables)
        })?;
        if let Some(db) = variables.get(CURRENT_DATABASE_VAR) {
            *self.current_database.write() = db.clone();
        }
        Ok(updated)
    }

    pub fn unset_variables(&self, names: &[&str]) -> ClientResult<KeyValueSet> {
        for name in names {
            check_variable_name(name)?;
        }
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        self.call("unset_session_variables", |svc, sid| {
            svc.unset_session_variables(sid, &names)
        })
    }

    /// Release the remote session. Safe to call any number of times.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.service.close_session(&self.session_id) {
            Ok(()) => info!("session {} closed", self.session_id),
            Err(fault) => warn!("failed to close session {}: {}", self.session_id, fault),
        }
    }
}

impl Drop for SessionConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_variable_name(name: &str) -> ClientResult<()> {
    if name.is_empty() {
        return Err(ClientError::invalid_argument(
            messages::ERR_EMPTY_VARIABLE_NAME,
        ));
    }
    Ok(())
}
