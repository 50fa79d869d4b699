// crates/datashed-store/src/batch.rs
// ============================================================================
// Module: Batch Query Executor
// Description: Runs multiple read-only queries in one call.
// Purpose: Amortize call overhead while keeping per-query outcomes addressable.
// Dependencies: datashed-core, rusqlite, crate::engine
// ============================================================================

//! ## Overview
//! A batch is an ordered list of read-only queries, each addressed by a
//! caller-chosen [`QueryId`]. Queries run in submission order on one pooled
//! read connection. In collect-all mode every query runs and reports its own
//! outcome; with `fail_fast`, the first failure marks every later query as
//! skipped. Statements that would write are rejected per query before they
//! execute.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::Instant;

use datashed_core::BatchQueryReport;
use datashed_core::BatchStatus;
use datashed_core::DatabaseName;
use datashed_core::EngineError;
use datashed_core::OperationStatus;
use datashed_core::QueryId;
use datashed_core::QueryOutcome;
use datashed_core::ScalarValue;
use serde::Deserialize;
use serde::Serialize;

use crate::engine::Engine;
use crate::engine::collect_rows;
use crate::engine::execution_error;
use crate::stats::OpClass;

// ============================================================================
// SECTION: Batch Query
// ============================================================================

/// One read-only query inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchQuery {
    /// Caller-chosen identifier, unique within the batch.
    pub query_id: QueryId,
    /// SQL text; must be read-only.
    pub sql: String,
    /// Positional parameters.
    #[serde(default)]
    pub params: Vec<ScalarValue>,
}

// ============================================================================
// SECTION: Engine Operation
// ============================================================================

impl Engine {
    /// Runs a batch of read-only queries against one database.
    ///
    /// # Invariants
    /// - Every submitted `query_id` appears exactly once in the report.
    /// - Queries execute in submission order on one read connection.
    /// - A fail-fast stop marks the whole batch `Failed`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the database does not exist
    /// and [`EngineError::InvalidOperation`] when a `query_id` repeats or a
    /// query has empty SQL. Runtime failures of individual queries are
    /// reported per query, not as errors.
    pub fn run_batch_queries(
        &self,
        database: &DatabaseName,
        queries: &[BatchQuery],
        fail_fast: bool,
    ) -> Result<BatchQueryReport, EngineError> {
        let started = Instant::now();
        let mut seen = BTreeSet::new();
        for query in queries {
            if query.sql.trim().is_empty() {
                return Err(EngineError::InvalidOperation(format!(
                    "query {} has empty sql",
                    query.query_id
                )));
            }
            if !seen.insert(&query.query_id) {
                return Err(EngineError::InvalidOperation(format!(
                    "duplicate query id in batch: {}",
                    query.query_id
                )));
            }
        }

        let handle = self.registry().acquire(database)?;
        let conn = handle.lock_read()?;

        let mut results: BTreeMap<QueryId, QueryOutcome> = BTreeMap::new();
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut stopped = false;
        for query in queries {
            if stopped {
                results.insert(query.query_id.clone(), QueryOutcome::Skipped);
                continue;
            }
            match run_one(&conn, &query.sql, &query.params) {
                Ok(result) => {
                    succeeded += 1;
                    results.insert(query.query_id.clone(), QueryOutcome::Ok { result });
                }
                Err(RunError::NotReadOnly) => {
                    failed += 1;
                    results.insert(
                        query.query_id.clone(),
                        QueryOutcome::Err {
                            message: "statement is not read-only".to_string(),
                        },
                    );
                    stopped = fail_fast;
                }
                Err(RunError::Sqlite(err)) => {
                    self.stats().record_db_error(&err);
                    failed += 1;
                    results.insert(
                        query.query_id.clone(),
                        QueryOutcome::Err { message: err.to_string() },
                    );
                    stopped = fail_fast;
                }
            }
        }

        self.stats().record_op(OpClass::BatchQuery);
        // A fail-fast stop marks the whole batch failed regardless of what
        // completed before the stop.
        let status =
            if stopped { BatchStatus::Failed } else { BatchStatus::from_counts(succeeded, failed) };
        Ok(BatchQueryReport {
            status,
            results,
            total_queries: queries.len(),
            successful_queries: succeeded,
            failed_queries: failed,
            execution_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Runs one read-only query and returns its rows.
    ///
    /// This is the single-statement primitive behind the batch executor,
    /// exposed directly for one-off reads.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the database does not exist,
    /// [`EngineError::InvalidOperation`] when the SQL is empty or would
    /// write, and [`EngineError::Execution`] when the statement fails.
    pub fn query(
        &self,
        database: &DatabaseName,
        sql: &str,
        params: &[ScalarValue],
    ) -> Result<OperationStatus, EngineError> {
        if sql.trim().is_empty() {
            return Err(EngineError::InvalidOperation("query requires non-empty sql".to_string()));
        }
        let handle = self.registry().acquire(database)?;
        let conn = handle.lock_read()?;
        match run_one(&conn, sql, params) {
            Ok(status) => Ok(status),
            Err(RunError::NotReadOnly) => Err(EngineError::InvalidOperation(
                "statement is not read-only".to_string(),
            )),
            Err(RunError::Sqlite(err)) => {
                self.stats().record_db_error(&err);
                Err(execution_error(&err))
            }
        }
    }
}

// ============================================================================
// SECTION: Single Query Execution
// ============================================================================

/// Why one query in the batch did not produce rows.
enum RunError {
    /// The statement would write; batches are read-only.
    NotReadOnly,
    /// The statement failed to compile or run.
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for RunError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

/// Compiles and runs one read-only statement on a read connection.
fn run_one(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[ScalarValue],
) -> Result<OperationStatus, RunError> {
    let mut statement = conn.prepare(sql)?;
    if !statement.readonly() {
        return Err(RunError::NotReadOnly);
    }
    let (columns, rows) = collect_rows(&mut statement, params)?;
    Ok(OperationStatus::Rows { columns, rows })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, reason = "test assertions")]

    use super::*;

    #[test]
    fn write_statements_are_rejected_per_query() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a INTEGER)").unwrap();
        let result = run_one(&conn, "INSERT INTO t (a) VALUES (1)", &[]);
        assert!(matches!(result, Err(RunError::NotReadOnly)));
    }

    #[test]
    fn select_statements_return_rows() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a INTEGER); INSERT INTO t VALUES (7)").unwrap();
        let Ok(OperationStatus::Rows { columns, rows }) = run_one(&conn, "SELECT a FROM t", &[])
        else {
            panic!("expected rows");
        };
        assert_eq!(columns, vec!["a".to_string()]);
        assert_eq!(rows.len(), 1);
    }
}
