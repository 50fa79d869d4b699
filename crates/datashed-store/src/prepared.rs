// crates/datashed-store/src/prepared.rs
// ============================================================================
// Module: Prepared Statements
// Description: Caller-visible prepare/execute/close statement registry.
// Purpose: Validate SQL once, then execute repeatedly with bound parameters.
// Dependencies: datashed-core, rusqlite, crate::engine
// ============================================================================

//! ## Overview
//! Callers register SQL under an explicit [`StatementId`], then execute it
//! any number of times with positional parameters. Registration validates
//! the SQL against the target database and records its parameter arity;
//! execution enforces that arity before touching the store. The registry
//! stores SQL text, not connection-bound handles; SQLite-level statement
//! reuse comes from each connection's own prepared-statement cache.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;

use datashed_core::DatabaseName;
use datashed_core::EngineError;
use datashed_core::OperationStatus;
use datashed_core::ScalarValue;
use datashed_core::StatementId;
use serde::Deserialize;
use serde::Serialize;

use crate::engine::Engine;
use crate::engine::collect_rows;
use crate::engine::execution_error;
use crate::engine::to_sql_value;
use crate::engine::unix_millis;
use crate::stats::OpClass;

// ============================================================================
// SECTION: Registry Types
// ============================================================================

/// Caller-visible description of one registered statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedInfo {
    /// Identifier the statement was registered under.
    pub statement_id: StatementId,
    /// Database the statement targets.
    pub database: DatabaseName,
    /// Registered SQL text.
    pub sql: String,
    /// Number of positional parameters the SQL expects.
    pub parameter_count: usize,
    /// Registration time in unix milliseconds.
    pub created_at_ms: i64,
    /// Number of successful executions so far.
    pub execution_count: u64,
}

/// One registry entry.
#[derive(Debug, Clone)]
struct PreparedEntry {
    /// Registered SQL text.
    sql: String,
    /// Number of positional parameters the SQL expects.
    parameter_count: usize,
    /// Registration time in unix milliseconds.
    created_at_ms: i64,
    /// Number of successful executions so far.
    execution_count: u64,
}

impl PreparedEntry {
    /// Builds the caller-visible view of this entry.
    fn info(&self, key: &(DatabaseName, StatementId)) -> PreparedInfo {
        PreparedInfo {
            statement_id: key.1.clone(),
            database: key.0.clone(),
            sql: self.sql.clone(),
            parameter_count: self.parameter_count,
            created_at_ms: self.created_at_ms,
            execution_count: self.execution_count,
        }
    }
}

/// Registry of statements prepared by callers.
///
/// # Invariants
/// - Identifiers are unique within one database; re-registering an in-use
///   identifier is a conflict, never a silent replace.
#[derive(Debug, Default)]
pub(crate) struct PreparedStatements {
    /// Registered entries keyed by database and statement identifier.
    entries: RwLock<HashMap<(DatabaseName, StatementId), PreparedEntry>>,
}

// ============================================================================
// SECTION: Engine Operations
// ============================================================================

impl Engine {
    /// Registers SQL under an identifier after validating it.
    ///
    /// The SQL is compiled once against the target database to surface
    /// syntax and schema errors at registration time and to record the
    /// statement's parameter arity.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the database does not exist,
    /// [`EngineError::Conflict`] when the identifier is already registered,
    /// and [`EngineError::Execution`] when the SQL does not compile.
    pub fn prepare_statement(
        &self,
        database: &DatabaseName,
        id: StatementId,
        sql: &str,
    ) -> Result<PreparedInfo, EngineError> {
        if sql.trim().is_empty() {
            return Err(EngineError::InvalidOperation(
                "prepared statement requires non-empty sql".to_string(),
            ));
        }
        let handle = self.registry().acquire(database)?;
        let key = (database.clone(), id);

        // Collision check before compiling; compilation is the slower path.
        {
            let entries =
                self.prepared().entries.read().unwrap_or_else(PoisonError::into_inner);
            if entries.contains_key(&key) {
                return Err(EngineError::Conflict(format!(
                    "statement id already registered: {}",
                    key.1
                )));
            }
        }

        let parameter_count = {
            let conn = handle.lock_read()?;
            let statement = conn.prepare(sql).map_err(|err| execution_error(&err))?;
            statement.parameter_count()
        };

        let entry = PreparedEntry {
            sql: sql.to_string(),
            parameter_count,
            created_at_ms: unix_millis(),
            execution_count: 0,
        };
        let mut entries =
            self.prepared().entries.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check under the write lock; a racing registration wins.
        if entries.contains_key(&key) {
            return Err(EngineError::Conflict(format!(
                "statement id already registered: {}",
                key.1
            )));
        }
        let info = entry.info(&key);
        entries.insert(key, entry);
        Ok(info)
    }

    /// Executes a registered statement with positional parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the identifier is not
    /// registered or its database has since been deleted,
    /// [`EngineError::ArityMismatch`] when the parameter count disagrees
    /// with the registered SQL, and [`EngineError::Execution`] when the
    /// statement fails at runtime.
    pub fn execute_prepared(
        &self,
        database: &DatabaseName,
        id: &StatementId,
        params: &[ScalarValue],
    ) -> Result<OperationStatus, EngineError> {
        let key = (database.clone(), id.clone());
        let (sql, expected) = {
            let entries =
                self.prepared().entries.read().unwrap_or_else(PoisonError::into_inner);
            let entry = entries.get(&key).ok_or_else(|| {
                EngineError::NotFound(format!("prepared statement not registered: {id}"))
            })?;
            (entry.sql.clone(), entry.parameter_count)
        };
        if params.len() != expected {
            return Err(EngineError::ArityMismatch { expected, actual: params.len() });
        }

        let handle = self.registry().acquire(database)?;
        let status = {
            // Writes and reads both go through the write connection so a
            // registered UPDATE serializes with transactions on the same
            // store.
            let conn = handle.lock_write()?;
            let mut statement = conn.prepare_cached(&sql).map_err(|err| {
                self.stats().record_db_error(&err);
                execution_error(&err)
            })?;
            if statement.column_count() > 0 {
                let (columns, rows) = collect_rows(&mut statement, params).map_err(|err| {
                    self.stats().record_db_error(&err);
                    execution_error(&err)
                })?;
                OperationStatus::Rows { columns, rows }
            } else {
                let bound: Vec<rusqlite::types::Value> = params.iter().map(to_sql_value).collect();
                let count =
                    statement.execute(rusqlite::params_from_iter(bound)).map_err(|err| {
                        self.stats().record_db_error(&err);
                        execution_error(&err)
                    })?;
                OperationStatus::Affected { count }
            }
        };

        let mut entries =
            self.prepared().entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(&key) {
            entry.execution_count = entry.execution_count.saturating_add(1);
        }
        self.stats().record_op(OpClass::PreparedExecution);
        Ok(status)
    }

    /// Closes a registered statement, freeing its identifier for reuse.
    ///
    /// Closing is idempotent; closing an unknown or already-closed
    /// identifier reports `false` instead of failing.
    pub fn close_prepared(&self, database: &DatabaseName, id: &StatementId) -> bool {
        let mut entries =
            self.prepared().entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&(database.clone(), id.clone())).is_some()
    }

    /// Lists registered statements ordered by database, then identifier.
    #[must_use]
    pub fn list_prepared(&self) -> Vec<PreparedInfo> {
        let entries = self.prepared().entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut infos: Vec<PreparedInfo> =
            entries.iter().map(|(key, entry)| entry.info(key)).collect();
        infos.sort_by(|a, b| {
            (&a.database, &a.statement_id).cmp(&(&b.database, &b.statement_id))
        });
        infos
    }
}
