// crates/datashed-store/src/admin.rs
// ============================================================================
// Module: Store Lifecycle and Introspection
// Description: Create, list, describe, and delete sandboxed store files.
// Purpose: Enforce the metadata contract at creation and confirmed deletion.
// Dependencies: datashed-core, rusqlite, crate::engine, crate::metadata
// ============================================================================

//! ## Overview
//! Creation is the only path that materializes a store file, and it refuses
//! to run until the submitted schema draft satisfies the metadata contract
//! in full. Deletion is two-step: a call without confirmation returns what
//! *would* be deleted, and only a confirmed call removes the file and its
//! journal sidecars. Introspection merges live `PRAGMA` output with the
//! stored descriptions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use datashed_core::DatabaseName;
use datashed_core::EngineError;
use datashed_core::SchemaDraft;
use datashed_core::TableDefinition;
use datashed_core::validate_schema;
use serde::Deserialize;
use serde::Serialize;

use crate::engine::Engine;
use crate::engine::execution_error;
use crate::engine::quote_identifier;
use crate::engine::validate_identifier;
use crate::metadata;

// ============================================================================
// SECTION: Report Types
// ============================================================================

/// Result of creating one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReport {
    /// Name of the created database.
    pub database: DatabaseName,
    /// Store file path inside the sandbox.
    pub path: PathBuf,
    /// Tables created, in draft order.
    pub tables_created: Vec<String>,
}

/// Result of a delete request.
///
/// # Invariants
/// - `ConfirmationRequired` means nothing was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The request lacked confirmation; the store is untouched.
    ConfirmationRequired {
        /// Name of the database that would be deleted.
        database: DatabaseName,
        /// Store file that would be removed.
        path: PathBuf,
    },
    /// The store file and its sidecars were removed.
    Deleted {
        /// Name of the deleted database.
        database: DatabaseName,
        /// Removed store file path.
        path: PathBuf,
    },
}

/// One row of the database listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSummary {
    /// Database name derived from the store file name.
    pub name: DatabaseName,
    /// Store file path.
    pub path: PathBuf,
    /// Store file size in bytes.
    pub size_bytes: u64,
}

/// Full description of one database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Database name.
    pub name: DatabaseName,
    /// Store file path.
    pub path: PathBuf,
    /// Store file size in bytes.
    pub size_bytes: u64,
    /// Stored database description.
    pub database_description: String,
    /// Contract creation time in unix milliseconds.
    pub created_at_ms: i64,
    /// Last contract update time in unix milliseconds.
    pub updated_at_ms: i64,
    /// Per-table detail, ordered by table name.
    pub tables: Vec<TableInfo>,
}

/// Live detail for one table, merged with stored descriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name.
    pub table_name: String,
    /// Stored table description, when the contract has one.
    pub description: Option<String>,
    /// Current row count.
    pub row_count: u64,
    /// Column detail in declaration order.
    pub columns: Vec<ColumnInfo>,
    /// Index detail.
    pub indexes: Vec<IndexInfo>,
    /// Outgoing foreign keys.
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared SQL type text.
    pub declared_type: String,
    /// Whether the column carries `NOT NULL`.
    pub not_null: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Declared default value, verbatim.
    pub default_value: Option<String>,
    /// Stored column description, when the contract has one.
    pub description: Option<String>,
}

/// One index on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name.
    pub name: String,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// Indexed column names in index order.
    pub columns: Vec<String>,
}

/// One outgoing foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    /// Referenced table.
    pub referenced_table: String,
    /// Referencing column in this table.
    pub from_column: String,
    /// Referenced column, when declared.
    pub to_column: Option<String>,
    /// Declared `ON UPDATE` action.
    pub on_update: String,
    /// Declared `ON DELETE` action.
    pub on_delete: String,
}

// ============================================================================
// SECTION: Lifecycle Operations
// ============================================================================

impl Engine {
    /// Creates a database from a validated schema draft.
    ///
    /// # Invariants
    /// - No file exists until the draft passes the metadata contract and
    ///   identifier hardening; a rejected draft leaves no trace.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyExists`] when a store file already
    /// exists for the name, [`EngineError::Validation`] with the complete
    /// violation list when the draft breaks the contract,
    /// [`EngineError::InvalidOperation`] when a table or column name fails
    /// identifier hardening, and [`EngineError::Execution`] when DDL fails.
    pub fn create_database(
        &self,
        name: &DatabaseName,
        draft: &SchemaDraft,
    ) -> Result<CreateReport, EngineError> {
        // Pre-check so duplicates report before validation; the authoritative
        // check runs under the registry lock in `create_exclusive`.
        if self.registry().exists(name)? {
            return Err(EngineError::AlreadyExists(format!("database '{name}' already exists")));
        }
        validate_schema(draft)?;
        for table in &draft.tables {
            validate_identifier("table", &table.table_name)?;
            for column in &table.columns {
                validate_identifier("column", &column.name)?;
            }
        }

        let handle = self.registry().create_exclusive(name)?;
        let result = {
            let mut guard = handle.lock_write()?;
            let tx = guard.transaction().map_err(|err| execution_error(&err))?;
            for table in &draft.tables {
                tx.execute_batch(&create_table_sql(table))
                    .map_err(|err| execution_error(&err))?;
            }
            metadata::write_contract(&tx, &draft.database_description, &draft.tables)?;
            tx.commit().map_err(|err| execution_error(&err))
        };
        if let Err(err) = result {
            // Creation is all-or-nothing: do not leave a half-built file.
            let path = self.registry().evict(name)?;
            let _ = std::fs::remove_file(path);
            return Err(err);
        }

        Ok(CreateReport {
            database: name.clone(),
            path: handle.path().to_path_buf(),
            tables_created: draft.tables.iter().map(|table| table.table_name.clone()).collect(),
        })
    }

    /// Deletes a database, requiring explicit confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when no store file exists for the
    /// name and [`EngineError::Io`] when file removal fails.
    pub fn delete_database(
        &self,
        name: &DatabaseName,
        confirmed: bool,
    ) -> Result<DeleteOutcome, EngineError> {
        if !self.registry().exists(name)? {
            return Err(EngineError::NotFound(format!("database '{name}' not found")));
        }
        if !confirmed {
            let path = self
                .registry()
                .sandbox()
                .store_path(name)
                .map_err(|err| EngineError::Io(err.to_string()))?;
            return Ok(DeleteOutcome::ConfirmationRequired { database: name.clone(), path });
        }
        let path = self.registry().evict(name)?;
        std::fs::remove_file(&path)
            .map_err(|err| EngineError::Io(format!("{}: {err}", path.display())))?;
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = path.clone().into_os_string();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.exists() {
                let _ = std::fs::remove_file(sidecar);
            }
        }
        Ok(DeleteOutcome::Deleted { database: name.clone(), path })
    }

    /// Lists databases present under the sandbox root, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] when the sandbox root cannot be read.
    pub fn list_databases(&self) -> Result<Vec<DatabaseSummary>, EngineError> {
        let files = self
            .registry()
            .sandbox()
            .list_store_files()
            .map_err(|err| EngineError::Io(err.to_string()))?;
        let mut summaries = Vec::with_capacity(files.len());
        for path in files {
            // Files that do not map back to a valid name are foreign to the
            // sandbox and are ignored.
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let Ok(name) = DatabaseName::parse(stem) else {
                continue;
            };
            let size_bytes = std::fs::metadata(&path)
                .map_err(|err| EngineError::Io(format!("{}: {err}", path.display())))?
                .len();
            summaries.push(DatabaseSummary { name, path, size_bytes });
        }
        Ok(summaries)
    }
}

// ============================================================================
// SECTION: Introspection Operations
// ============================================================================

impl Engine {
    /// Describes one database: stored contract plus live schema detail.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the database does not exist
    /// and [`EngineError::Execution`] when introspection fails.
    pub fn database_info(&self, name: &DatabaseName) -> Result<DatabaseInfo, EngineError> {
        let handle = self.registry().acquire(name)?;
        let conn = handle.lock_read()?;
        let record = metadata::read_record(&conn)?;

        let mut tables = Vec::with_capacity(record.tables.len());
        for name in list_user_tables(&conn)? {
            tables.push(describe_table(&conn, &name, &record.tables)?);
        }
        let size_bytes = std::fs::metadata(handle.path())
            .map_err(|err| EngineError::Io(format!("{}: {err}", handle.path().display())))?
            .len();
        Ok(DatabaseInfo {
            name: name.clone(),
            path: handle.path().to_path_buf(),
            size_bytes,
            database_description: record.database_description,
            created_at_ms: record.created_at_ms,
            updated_at_ms: record.updated_at_ms,
            tables,
        })
    }

    /// Describes one table of one database.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the database or table does not
    /// exist and [`EngineError::Execution`] when introspection fails.
    pub fn table_info(&self, name: &DatabaseName, table: &str) -> Result<TableInfo, EngineError> {
        validate_identifier("table", table)?;
        let handle = self.registry().acquire(name)?;
        let conn = handle.lock_read()?;
        if !list_user_tables(&conn)?.iter().any(|existing| existing == table) {
            return Err(EngineError::NotFound(format!(
                "table '{table}' not found in database '{name}'"
            )));
        }
        let record = metadata::read_record(&conn)?;
        describe_table(&conn, table, &record.tables)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders one `CREATE TABLE` statement from a validated definition.
///
/// Table and column names have passed identifier hardening; constraint text
/// is trusted operator input, as it is part of the schema itself.
fn create_table_sql(table: &TableDefinition) -> String {
    let columns = table
        .columns
        .iter()
        .map(|column| {
            let mut rendered =
                format!("{} {}", quote_identifier(&column.name), column.column_type.sql_keyword());
            if let Some(constraints) = &column.constraints {
                rendered.push(' ');
                rendered.push_str(constraints);
            }
            rendered
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns})", quote_identifier(&table.table_name))
}

/// Lists user tables, excluding SQLite internals and the metadata table.
fn list_user_tables(conn: &rusqlite::Connection) -> Result<Vec<String>, EngineError> {
    let mut statement = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != ?1
             ORDER BY name",
        )
        .map_err(|err| execution_error(&err))?;
    statement
        .query_map(rusqlite::params![metadata::META_TABLE], |row| row.get::<_, String>(0))
        .map_err(|err| execution_error(&err))?
        .collect::<Result<Vec<String>, _>>()
        .map_err(|err| execution_error(&err))
}

/// Builds the merged live/stored view of one table.
fn describe_table(
    conn: &rusqlite::Connection,
    table: &str,
    stored: &[TableDefinition],
) -> Result<TableInfo, EngineError> {
    let prior = stored.iter().find(|definition| definition.table_name == table);
    let quoted = quote_identifier(table);

    // SQLite reports COUNT(*) as a signed integer; it is never negative.
    let row_count = conn
        .query_row(&format!("SELECT COUNT(*) FROM {quoted}"), [], |row| row.get::<_, i64>(0))
        .map_err(|err| execution_error(&err))?
        .unsigned_abs();

    let mut statement = conn
        .prepare(&format!("PRAGMA table_info({quoted})"))
        .map_err(|err| execution_error(&err))?;
    let columns = statement
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get("name")?,
                declared_type: row.get("type")?,
                not_null: row.get("notnull")?,
                primary_key: row.get::<_, i64>("pk")? > 0,
                default_value: row.get("dflt_value")?,
                description: None,
            })
        })
        .map_err(|err| execution_error(&err))?
        .collect::<Result<Vec<ColumnInfo>, _>>()
        .map_err(|err| execution_error(&err))?
        .into_iter()
        .map(|mut column| {
            column.description = prior.and_then(|definition| {
                definition
                    .columns
                    .iter()
                    .find(|stored_column| stored_column.name == column.name)
                    .map(|stored_column| stored_column.description.clone())
            });
            column
        })
        .collect();

    Ok(TableInfo {
        table_name: table.to_string(),
        description: prior.map(|definition| definition.table_description.clone()),
        row_count,
        columns,
        indexes: list_indexes(conn, &quoted)?,
        foreign_keys: list_foreign_keys(conn, &quoted)?,
    })
}

/// Reads the index list for one table.
fn list_indexes(
    conn: &rusqlite::Connection,
    quoted_table: &str,
) -> Result<Vec<IndexInfo>, EngineError> {
    let mut statement = conn
        .prepare(&format!("PRAGMA index_list({quoted_table})"))
        .map_err(|err| execution_error(&err))?;
    let heads = statement
        .query_map([], |row| {
            Ok((row.get::<_, String>("name")?, row.get::<_, bool>("unique")?))
        })
        .map_err(|err| execution_error(&err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| execution_error(&err))?;

    let mut indexes = Vec::with_capacity(heads.len());
    for (name, unique) in heads {
        let quoted_index = quote_identifier(&name.replace('"', "\"\""));
        let mut info = conn
            .prepare(&format!("PRAGMA index_info({quoted_index})"))
            .map_err(|err| execution_error(&err))?;
        let columns = info
            .query_map([], |row| row.get::<_, Option<String>>("name"))
            .map_err(|err| execution_error(&err))?
            .collect::<Result<Vec<Option<String>>, _>>()
            .map_err(|err| execution_error(&err))?
            .into_iter()
            .flatten()
            .collect();
        indexes.push(IndexInfo { name, unique, columns });
    }
    Ok(indexes)
}

/// Reads the outgoing foreign keys for one table.
fn list_foreign_keys(
    conn: &rusqlite::Connection,
    quoted_table: &str,
) -> Result<Vec<ForeignKeyInfo>, EngineError> {
    let mut statement = conn
        .prepare(&format!("PRAGMA foreign_key_list({quoted_table})"))
        .map_err(|err| execution_error(&err))?;
    statement
        .query_map([], |row| {
            Ok(ForeignKeyInfo {
                referenced_table: row.get("table")?,
                from_column: row.get("from")?,
                to_column: row.get("to")?,
                on_update: row.get("on_update")?,
                on_delete: row.get("on_delete")?,
            })
        })
        .map_err(|err| execution_error(&err))?
        .collect::<Result<Vec<ForeignKeyInfo>, _>>()
        .map_err(|err| execution_error(&err))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use datashed_core::ColumnDefinition;
    use datashed_core::ColumnType;

    #[test]
    fn create_table_sql_renders_types_and_constraints() {
        let table = TableDefinition {
            table_name: "users".to_string(),
            table_description: "Registered users".to_string(),
            columns: vec![
                ColumnDefinition {
                    name: "id".to_string(),
                    column_type: ColumnType::Integer,
                    description: "Primary key".to_string(),
                    constraints: Some("PRIMARY KEY AUTOINCREMENT".to_string()),
                },
                ColumnDefinition {
                    name: "name".to_string(),
                    column_type: ColumnType::Text,
                    description: "Display name".to_string(),
                    constraints: None,
                },
            ],
        };
        assert_eq!(
            create_table_sql(&table),
            "CREATE TABLE \"users\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \"name\" TEXT)"
        );
    }
}
