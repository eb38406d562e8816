//! Catalog administration over a coordinator session.

use std::sync::Arc;

use log::debug;
use quarry_core::{messages, validate_database_name, ClientError, ClientResult, Schema};
use quarry_service::CatalogService;
use quarry_session::SessionConnection;

/// Creates, inspects and drops databases and tables.
///
/// Every name is checked locally before any request is sent, so an invalid
/// name never reaches the coordinator. The client keeps no copy of the
/// catalog: each call asks the server.
#[derive(Debug, Clone)]
pub struct CatalogAdminClient {
    connection: Arc<SessionConnection>,
}

impl CatalogAdminClient {
    pub fn new(connection: Arc<SessionConnection>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Arc<SessionConnection> {
        &self.connection
    }

    /// Create a database. Fails with `DuplicateDatabase` if it exists.
    pub fn create_database(&self, name: &str) -> ClientResult<()> {
        validate_database_name(name)?;
        self.connection
            .call("create_database", |svc, sid| svc.create_database(sid, name))?;
        debug!("created database '{}'", name);
        Ok(())
    }

    /// Whether a database exists. Names are case-sensitive.
    pub fn exist_database(&self, name: &str) -> ClientResult<bool> {
        validate_database_name(name)?;
        self.connection
            .call("exist_database", |svc, sid| svc.exist_database(sid, name))
    }

    /// Drop a database.
    ///
    /// The coordinator reports, in this order: `UndefinedDatabase` when it
    /// does not exist, `CannotDropCurrentDatabase` when it is this session's
    /// current database, `InsufficientPrivilege` for system databases.
    pub fn drop_database(&self, name: &str) -> ClientResult<()> {
        validate_database_name(name)?;
        self.connection
            .call("drop_database", |svc, sid| svc.drop_database(sid, name))?;
        debug!("dropped database '{}'", name);
        Ok(())
    }

    pub fn get_all_database_names(&self) -> ClientResult<Vec<String>> {
        self.connection.call("get_all_database_names", |svc, sid| {
            svc.get_all_database_names(sid)
        })
    }

    /// Whether a table exists. `name` may be qualified as `db.table`.
    pub fn exist_table(&self, name: &str) -> ClientResult<bool> {
        let (database, table) = self.resolve_table(name)?;
        self.connection.call("exist_table", |svc, sid| {
            svc.exist_table(sid, &database, table)
        })
    }

    /// Table names of `database`, or of the current database.
    pub fn get_table_list(&self, database: Option<&str>) -> ClientResult<Vec<String>> {
        let database = match database {
            Some(db) => {
                validate_database_name(db)?;
                db.to_string()
            }
            None => self.connection.current_database(),
        };
        self.connection.call("get_all_table_names", |svc, sid| {
            svc.get_all_table_names(sid, &database)
        })
    }

    pub fn get_table_schema(&self, name: &str) -> ClientResult<Schema> {
        let (database, table) = self.resolve_table(name)?;
        self.connection.call("get_table_schema", |svc, sid| {
            svc.get_table_schema(sid, &database, table)
        })
    }

    pub fn drop_table(&self, name: &str) -> ClientResult<()> {
        let (database, table) = self.resolve_table(name)?;
        self.connection
            .call("drop_table", |svc, sid| svc.drop_table(sid, &database, table))?;
        debug!("dropped table '{}.{}'", database, table);
        Ok(())
    }

    /// Close the underlying session.
    pub fn close(&self) {
        self.connection.close();
    }

    /// Split `db.table` into its parts; unqualified names live in the
    /// current database.
    fn resolve_table<'a>(&self, name: &'a str) -> ClientResult<(String, &'a str)> {
        let (database, table) = match name.split_once('.') {
            Some((db, table)) => {
                validate_database_name(db)?;
                (db.to_string(), table)
            }
            None => (self.connection.current_database(), name),
        };
        if table.is_empty() {
            return Err(ClientError::invalid_argument(messages::ERR_EMPTY_TABLE_NAME));
        }
        Ok((database, table))
    }
}
