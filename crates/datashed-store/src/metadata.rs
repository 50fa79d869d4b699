// crates/datashed-store/src/metadata.rs
// ============================================================================
// Module: Metadata Table
// Description: Reads and writes the self-describing metadata table.
// Purpose: Keep every store's description contract persisted beside its data.
// Dependencies: datashed-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Every store carries a `_datashed_meta` key/value table holding the
//! database description and the structured table/column descriptions the
//! contract validator accepted at creation time. DDL that goes through the
//! transaction executor refreshes the table listing so the stored contract
//! tracks the live schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datashed_core::ColumnDefinition;
use datashed_core::ColumnType;
use datashed_core::EngineError;
use datashed_core::MetadataRecord;
use datashed_core::TableDefinition;
use rusqlite::Connection;
use rusqlite::OptionalExtension;

use crate::engine::execution_error;
use crate::engine::unix_millis;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the metadata table written into every store.
pub(crate) const META_TABLE: &str = "_datashed_meta";

/// Key under which the database description is stored.
const KEY_DESCRIPTION: &str = "database_description";

/// Key under which the structured table contract is stored.
const KEY_TABLES: &str = "tables";

/// Description recorded for schema objects created outside the contract.
const UNDOCUMENTED: &str = "No description recorded";

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Creates the metadata table if it does not exist.
pub(crate) fn ensure_meta_table(conn: &Connection) -> Result<(), EngineError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {META_TABLE} (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )"
    ))
    .map_err(|err| execution_error(&err))
}

/// Inserts or updates one metadata entry, preserving `created_at` on update.
pub(crate) fn put_entry(conn: &Connection, key: &str, value: &str) -> Result<(), EngineError> {
    let now = unix_millis();
    conn.execute(
        &format!(
            "INSERT INTO {META_TABLE} (key, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = excluded.updated_at"
        ),
        rusqlite::params![key, value, now],
    )
    .map_err(|err| execution_error(&err))?;
    Ok(())
}

/// Reads one metadata entry, returning `None` when absent.
pub(crate) fn get_entry(conn: &Connection, key: &str) -> Result<Option<String>, EngineError> {
    conn.query_row(
        &format!("SELECT value FROM {META_TABLE} WHERE key = ?1"),
        rusqlite::params![key],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(|err| execution_error(&err))
}

/// Writes the full validated contract into a freshly created store.
pub(crate) fn write_contract(
    conn: &Connection,
    description: &str,
    tables: &[TableDefinition],
) -> Result<(), EngineError> {
    ensure_meta_table(conn)?;
    put_entry(conn, KEY_DESCRIPTION, description)?;
    let encoded = serde_json::to_string(tables)
        .map_err(|err| EngineError::Execution(format!("metadata encoding failed: {err}")))?;
    put_entry(conn, KEY_TABLES, &encoded)
}

/// Replaces the stored table contract after schema-changing statements.
pub(crate) fn refresh_tables(
    conn: &Connection,
    tables: &[TableDefinition],
) -> Result<(), EngineError> {
    ensure_meta_table(conn)?;
    let encoded = serde_json::to_string(tables)
        .map_err(|err| EngineError::Execution(format!("metadata encoding failed: {err}")))?;
    put_entry(conn, KEY_TABLES, &encoded)
}

/// Reads the full metadata record for a store.
///
/// # Errors
///
/// Returns [`EngineError::Execution`] when the metadata table is missing or
/// its stored contract does not parse.
pub(crate) fn read_record(conn: &Connection) -> Result<MetadataRecord, EngineError> {
    let description = get_entry(conn, KEY_DESCRIPTION)?
        .ok_or_else(|| EngineError::Execution("metadata table has no database description".to_string()))?;
    let tables = match get_entry(conn, KEY_TABLES)? {
        Some(encoded) => serde_json::from_str(&encoded)
            .map_err(|err| EngineError::Execution(format!("metadata decoding failed: {err}")))?,
        None => Vec::new(),
    };
    let (created, updated) = timestamps(conn)?;
    Ok(MetadataRecord {
        database_description: description,
        created_at_ms: created,
        updated_at_ms: updated,
        tables,
    })
}

/// Re-syncs the stored table contract with the live schema.
///
/// Called after schema-changing statements commit through the executor.
/// Descriptions for surviving tables and columns are preserved; objects
/// created outside the contract validator get a placeholder description,
/// and dropped objects fall out of the contract.
pub(crate) fn refresh_after_ddl(conn: &Connection) -> Result<(), EngineError> {
    ensure_meta_table(conn)?;
    let stored: Vec<TableDefinition> = match get_entry(conn, KEY_TABLES)? {
        Some(encoded) => serde_json::from_str(&encoded).unwrap_or_default(),
        None => Vec::new(),
    };
    let merged = merge_live_tables(conn, &stored)?;
    refresh_tables(conn, &merged)
}

/// Builds a table contract from the live schema, reusing stored descriptions.
fn merge_live_tables(
    conn: &Connection,
    stored: &[TableDefinition],
) -> Result<Vec<TableDefinition>, EngineError> {
    let mut statement = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != ?1
             ORDER BY name",
        )
        .map_err(|err| execution_error(&err))?;
    let names = statement
        .query_map(rusqlite::params![META_TABLE], |row| row.get::<_, String>(0))
        .map_err(|err| execution_error(&err))?
        .collect::<Result<Vec<String>, _>>()
        .map_err(|err| execution_error(&err))?;

    let mut merged = Vec::with_capacity(names.len());
    for name in names {
        let prior = stored.iter().find(|table| table.table_name == name);
        let columns = live_columns(conn, &name, prior)?;
        merged.push(TableDefinition {
            table_name: name,
            table_description: prior
                .map_or_else(|| UNDOCUMENTED.to_string(), |table| table.table_description.clone()),
            columns,
        });
    }
    Ok(merged)
}

/// Reads one table's live columns, reusing stored column descriptions.
fn live_columns(
    conn: &Connection,
    table: &str,
    prior: Option<&TableDefinition>,
) -> Result<Vec<ColumnDefinition>, EngineError> {
    // Names come back from sqlite_master, so only quote-escaping is needed.
    let quoted = format!("\"{}\"", table.replace('"', "\"\""));
    let mut statement = conn
        .prepare(&format!("PRAGMA table_info({quoted})"))
        .map_err(|err| execution_error(&err))?;
    let rows = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, String>("name")?,
                row.get::<_, String>("type")?,
                row.get::<_, bool>("notnull")?,
                row.get::<_, i64>("pk")?,
            ))
        })
        .map_err(|err| execution_error(&err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| execution_error(&err))?;

    let mut columns = Vec::with_capacity(rows.len());
    for (name, declared, not_null, pk) in rows {
        let prior_column =
            prior.and_then(|table| table.columns.iter().find(|column| column.name == name));
        let constraints = prior_column.map_or_else(
            || {
                let mut parts = Vec::new();
                if pk > 0 {
                    parts.push("PRIMARY KEY");
                }
                if not_null {
                    parts.push("NOT NULL");
                }
                if parts.is_empty() { None } else { Some(parts.join(" ")) }
            },
            |column| column.constraints.clone(),
        );
        columns.push(ColumnDefinition {
            name,
            column_type: ColumnType::parse(&declared).unwrap_or(ColumnType::Text),
            description: prior_column
                .map_or_else(|| UNDOCUMENTED.to_string(), |column| column.description.clone()),
            constraints,
        });
    }
    Ok(columns)
}

/// Returns the oldest `created_at` and newest `updated_at` across entries.
fn timestamps(conn: &Connection) -> Result<(i64, i64), EngineError> {
    conn.query_row(
        &format!("SELECT MIN(created_at), MAX(updated_at) FROM {META_TABLE}"),
        [],
        |row| {
            Ok((
                row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                row.get::<_, Option<i64>>(1)?.unwrap_or(0),
            ))
        },
    )
    .map_err(|err| execution_error(&err))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
