// crates/datashed-store/src/executor.rs
// ============================================================================
// Module: Transaction Executor
// Description: Runs ordered operation lists inside one SQLite transaction.
// Purpose: Guarantee all-or-nothing application with per-operation outcomes.
// Dependencies: datashed-core, rusqlite, crate::engine, crate::metadata
// ============================================================================

//! ## Overview
//! One call, one transaction. Every submitted operation is structurally
//! validated before the transaction begins, so `InvalidOperation` failures
//! never touch the store. Operations then execute strictly in submission
//! order on the database's single write connection; the first runtime
//! failure stops execution, rolls the whole transaction back, and the result
//! still reports what every executed operation would have done.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datashed_core::BatchStatus;
use datashed_core::DatabaseName;
use datashed_core::EngineError;
use datashed_core::IsolationLevel;
use datashed_core::Operation;
use datashed_core::OperationOutcome;
use datashed_core::OperationStatus;
use datashed_core::Row;
use datashed_core::TransactionResult;
use rusqlite::TransactionBehavior;

use crate::engine::Engine;
use crate::engine::collect_rows;
use crate::engine::execution_error;
use crate::engine::quote_identifier;
use crate::engine::to_sql_value;
use crate::engine::validate_identifier;
use crate::metadata;
use crate::stats::OpClass;

// ============================================================================
// SECTION: Transaction Entry Point
// ============================================================================

impl Engine {
    /// Executes an ordered list of operations as one transaction.
    ///
    /// # Invariants
    /// - Structural validation of every operation happens before the
    ///   transaction begins; a validation failure leaves the store untouched
    ///   and returns an error rather than a result.
    /// - After the first runtime failure, no further operation executes and
    ///   the transaction is rolled back in full.
    /// - Earlier outcomes in a rolled-back result describe work that did not
    ///   persist.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the database does not exist,
    /// [`EngineError::InvalidOperation`] when the list is empty or any
    /// operation is malformed, and [`EngineError::Execution`] when the
    /// transaction itself cannot begin, commit, or roll back.
    pub fn run_transaction(
        &self,
        database: &DatabaseName,
        operations: &[Operation],
        isolation: IsolationLevel,
    ) -> Result<TransactionResult, EngineError> {
        if operations.is_empty() {
            return Err(EngineError::InvalidOperation(
                "transaction requires at least one operation".to_string(),
            ));
        }
        for operation in operations {
            operation.validate()?;
            if let Operation::Insert { table, rows } = operation {
                validate_insert_identifiers(table, rows)?;
            }
        }

        let handle = self.registry().acquire(database)?;
        let mut guard = handle.lock_write()?;
        let tx = guard
            .transaction_with_behavior(behavior_for(isolation))
            .map_err(|err| execution_error(&err))?;

        let mut outcomes: Vec<OperationOutcome> = Vec::with_capacity(operations.len());
        let mut failure = None;
        for (index, operation) in operations.iter().enumerate() {
            match apply_operation(&tx, operation) {
                Ok(status) => outcomes.push(OperationOutcome { index, status }),
                Err(err) => {
                    self.stats().record_db_error(&err);
                    outcomes.push(OperationOutcome {
                        index,
                        status: OperationStatus::Failed { message: err.to_string() },
                    });
                    failure = Some(index);
                    break;
                }
            }
        }

        if failure.is_some() {
            tx.rollback().map_err(|err| execution_error(&err))?;
            self.stats().record_rollback();
            let executed = outcomes.len();
            return Ok(TransactionResult {
                status: BatchStatus::Failed,
                operations_executed: executed,
                outcomes,
                rollback_performed: true,
            });
        }

        let touched_schema = operations.iter().any(is_schema_change);
        if touched_schema {
            metadata::refresh_after_ddl(&tx)?;
        }
        tx.commit().map_err(|err| execution_error(&err))?;

        self.stats().record_op(OpClass::Transaction);
        if touched_schema {
            self.stats().record_op(OpClass::Ddl);
        }
        let executed = outcomes.len();
        Ok(TransactionResult {
            status: BatchStatus::Success,
            operations_executed: executed,
            outcomes,
            rollback_performed: false,
        })
    }

    /// Inserts a uniform set of rows as one transaction.
    ///
    /// This is the plain insert primitive behind [`Operation::Insert`],
    /// exposed directly: every row commits or none does.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the database does not exist,
    /// [`EngineError::InvalidOperation`] when the row set is empty,
    /// mismatched in shape, or names an invalid identifier, and
    /// [`EngineError::Execution`] when the store rejects the insert.
    pub fn insert_rows(
        &self,
        database: &DatabaseName,
        table: &str,
        rows: &[Row],
    ) -> Result<usize, EngineError> {
        let Some(first) = rows.first() else {
            return Err(EngineError::InvalidOperation(
                "insert requires at least one row".to_string(),
            ));
        };
        if let Some((index, _)) =
            rows.iter().enumerate().skip(1).find(|(_, row)| !row.same_shape_as(first))
        {
            return Err(EngineError::InvalidOperation(format!(
                "all rows must share the first row's columns; row {index} differs"
            )));
        }
        validate_insert_identifiers(table, rows)?;

        let handle = self.registry().acquire(database)?;
        let mut guard = handle.lock_write()?;
        let tx = guard.transaction().map_err(|err| execution_error(&err))?;
        let count = apply_insert(&tx, table, rows).map_err(|err| {
            self.stats().record_db_error(&err);
            self.stats().record_rollback();
            execution_error(&err)
        })?;
        tx.commit().map_err(|err| execution_error(&err))?;
        self.stats().record_op(OpClass::Transaction);
        Ok(count)
    }
}

// ============================================================================
// SECTION: Operation Application
// ============================================================================

/// Maps an isolation level onto the SQLite transaction behavior.
const fn behavior_for(isolation: IsolationLevel) -> TransactionBehavior {
    match isolation {
        IsolationLevel::Deferred => TransactionBehavior::Deferred,
        IsolationLevel::Immediate => TransactionBehavior::Immediate,
        IsolationLevel::Exclusive => TransactionBehavior::Exclusive,
    }
}

/// Checks insert identifiers against the hardened identifier shape.
///
/// Rows have already passed shape validation, so checking the first row's
/// columns covers every row.
fn validate_insert_identifiers(table: &str, rows: &[Row]) -> Result<(), EngineError> {
    validate_identifier("table", table)?;
    if let Some(first) = rows.first() {
        for name in first.column_names() {
            validate_identifier("column", name)?;
        }
    }
    Ok(())
}

/// Executes one operation on the open transaction.
fn apply_operation(
    conn: &rusqlite::Connection,
    operation: &Operation,
) -> Result<OperationStatus, rusqlite::Error> {
    match operation {
        Operation::Insert { table, rows } => {
            apply_insert(conn, table, rows).map(|count| OperationStatus::Affected { count })
        }
        Operation::Query { sql, params } => apply_query(conn, sql, params),
    }
}

/// Inserts validated row maps through one cached statement.
fn apply_insert(
    conn: &rusqlite::Connection,
    table: &str,
    rows: &[Row],
) -> Result<usize, rusqlite::Error> {
    let Some(first) = rows.first() else {
        return Ok(0);
    };
    let sql = insert_sql(table, &first.column_names());
    let mut statement = conn.prepare_cached(&sql)?;
    let mut affected = 0usize;
    for row in rows {
        let bound: Vec<rusqlite::types::Value> =
            row.iter().map(|(_, value)| to_sql_value(value)).collect();
        affected += statement.execute(rusqlite::params_from_iter(bound))?;
    }
    Ok(affected)
}

/// Builds the positional insert statement for one column set.
fn insert_sql(table: &str, columns: &[&str]) -> String {
    let column_list =
        columns.iter().map(|name| quote_identifier(name)).collect::<Vec<_>>().join(", ");
    let placeholders =
        (1..=columns.len()).map(|n| format!("?{n}")).collect::<Vec<_>>().join(", ");
    format!("INSERT INTO {} ({column_list}) VALUES ({placeholders})", quote_identifier(table))
}

/// Runs one raw statement, classifying reads by their column count.
fn apply_query(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[datashed_core::ScalarValue],
) -> Result<OperationStatus, rusqlite::Error> {
    let mut statement = conn.prepare(sql)?;
    if statement.column_count() > 0 {
        let (columns, rows) = collect_rows(&mut statement, params)?;
        Ok(OperationStatus::Rows { columns, rows })
    } else {
        let bound: Vec<rusqlite::types::Value> = params.iter().map(to_sql_value).collect();
        let count = statement.execute(rusqlite::params_from_iter(bound))?;
        Ok(OperationStatus::Affected { count })
    }
}

/// Detects statements that change the schema.
///
/// Matches on the first SQL keyword so the stored contract is refreshed
/// after `CREATE`, `ALTER`, and `DROP` statements.
fn is_schema_change(operation: &Operation) -> bool {
    let Operation::Query { sql, .. } = operation else {
        return false;
    };
    sql.trim_start()
        .split_whitespace()
        .next()
        .is_some_and(|word| {
            matches!(word.to_ascii_uppercase().as_str(), "CREATE" | "ALTER" | "DROP")
        })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
