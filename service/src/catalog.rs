//! In-memory catalog storage.
//!
//! Database names are case-sensitive. Table names are stored as written after
//! identifier folding, and looked up exactly first, then case-insensitively.

use std::collections::BTreeMap;

use quarry_core::{Column, DataType, Row, Schema, DEFAULT_DATABASE, INFORMATION_SCHEMA};

use crate::error::{EngineError, EngineResult};

/// A stored table.
#[derive(Debug, Clone)]
pub(crate) struct Table {
    pub name: String,
    pub schema: Schema,
    pub rows: Vec<Row>,
}

/// A database and its tables.
#[derive(Debug, Clone, Default)]
pub(crate) struct Database {
    tables: BTreeMap<String, Table>,
}

impl Database {
    fn resolve_key(&self, name: &str) -> Option<String> {
        if self.tables.contains_key(name) {
            return Some(name.to_string());
        }
        self.tables
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        let key = self.resolve_key(name)?;
        self.tables.get(&key)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        let key = self.resolve_key(name)?;
        self.tables.get_mut(&key)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn insert_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    fn remove_table(&mut self, name: &str) -> Option<Table> {
        let key = self.resolve_key(name)?;
        self.tables.remove(&key)
    }
}

/// Read-only views exposed under `information_schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SystemView {
    Databases,
    Tables,
}

impl SystemView {
    pub const ALL: [SystemView; 2] = [SystemView::Databases, SystemView::Tables];

    pub fn name(&self) -> &'static str {
        match self {
            SystemView::Databases => "databases",
            SystemView::Tables => "tables",
        }
    }

    pub fn resolve(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(name))
    }

    pub fn schema(&self) -> Schema {
        match self {
            SystemView::Databases => Schema::new(vec![Column::new("database_name", DataType::Text)]),
            SystemView::Tables => Schema::new(vec![
                Column::new("table_schema", DataType::Text),
                Column::new("table_name", DataType::Text),
            ]),
        }
    }

    /// Materialize the view against the current catalog.
    pub fn rows(&self, catalog: &Catalog) -> Vec<Row> {
        match self {
            SystemView::Databases => catalog
                .database_names()
                .into_iter()
                .map(|name| quarry_core::row![name])
                .collect(),
            SystemView::Tables => catalog
                .database_names()
                .into_iter()
                .flat_map(|db| {
                    catalog
                        .table_names(&db)
                        .unwrap_or_default()
                        .into_iter()
                        .map(move |table| quarry_core::row![db.clone(), table])
                })
                .collect(),
        }
    }
}

/// The database registry.
#[derive(Debug, Clone)]
pub(crate) struct Catalog {
    databases: BTreeMap<String, Database>,
}

impl Catalog {
    /// A catalog holding `default` and `information_schema`.
    pub fn new() -> Self {
        let mut databases = BTreeMap::new();
        databases.insert(DEFAULT_DATABASE.to_string(), Database::default());
        databases.insert(INFORMATION_SCHEMA.to_string(), Database::default());
        Self { databases }
    }

    pub fn is_system_database(name: &str) -> bool {
        name == INFORMATION_SCHEMA
    }

    pub fn exists_database(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }

    pub fn database_names(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }

    pub fn database(&self, name: &str) -> EngineResult<&Database> {
        self.databases
            .get(name)
            .ok_or_else(|| EngineError::undefined_database(name))
    }

    pub fn database_mut(&mut self, name: &str) -> EngineResult<&mut Database> {
        self.databases
            .get_mut(name)
            .ok_or_else(|| EngineError::undefined_database(name))
    }

    /// Returns false if the database already existed.
    pub fn create_database(&mut self, name: &str) -> bool {
        if self.databases.contains_key(name) {
            return false;
        }
        self.databases.insert(name.to_string(), Database::default());
        true
    }

    /// Returns false if the database did not exist.
    pub fn drop_database(&mut self, name: &str) -> bool {
        self.databases.remove(name).is_some()
    }

    pub fn table_names(&self, database: &str) -> EngineResult<Vec<String>> {
        if Self::is_system_database(database) {
            return Ok(SystemView::ALL.iter().map(|v| v.name().to_string()).collect());
        }
        Ok(self.database(database)?.table_names())
    }

    pub fn exists_table(&self, database: &str, table: &str) -> EngineResult<bool> {
        if Self::is_system_database(database) {
            return Ok(SystemView::resolve(table).is_some());
        }
        Ok(self.database(database)?.table(table).is_some())
    }

    pub fn table_schema(&self, database: &str, table: &str) -> EngineResult<Schema> {
        if Self::is_system_database(database) {
            return SystemView::resolve(table)
                .map(|v| v.schema())
                .ok_or_else(|| EngineError::undefined_table(qualified(database, table)));
        }
        self.database(database)?
            .table(table)
            .map(|t| t.schema.clone())
            .ok_or_else(|| EngineError::undefined_table(qualified(database, table)))
    }

    pub fn create_table(
        &mut self,
        database: &str,
        table: &str,
        schema: Schema,
        if_not_exists: bool,
    ) -> EngineResult<()> {
        if Self::is_system_database(database) {
            return Err(EngineError::insufficient_privilege(format!(
                "cannot create tables in '{}'",
                database
            )));
        }
        let db = self.database_mut(database)?;
        if db.table(table).is_some() {
            if if_not_exists {
                return Ok(());
            }
            return Err(EngineError::duplicate_table(qualified(database, table)));
        }
        db.insert_table(Table {
            name: table.to_string(),
            schema,
            rows: Vec::new(),
        });
        Ok(())
    }

    pub fn drop_table(&mut self, database: &str, table: &str, if_exists: bool) -> EngineResult<()> {
        if Self::is_system_database(database) {
            return Err(EngineError::insufficient_privilege(format!(
                "cannot drop tables in '{}'",
                database
            )));
        }
        let db = self.database_mut(database)?;
        match db.remove_table(table) {
            Some(_) => Ok(()),
            None if if_exists => Ok(()),
            None => Err(EngineError::undefined_table(qualified(database, table))),
        }
    }
}

pub(crate) fn qualified(database: &str, table: &str) -> String {
    format!("{}.{}", database, table)
}
