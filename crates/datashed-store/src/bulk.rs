// crates/datashed-store/src/bulk.rs
// ============================================================================
// Module: Bulk Insert Batcher
// Description: High-volume insert path with per-batch atomicity.
// Purpose: Load large record sets without holding one giant transaction.
// Dependencies: datashed-core, rusqlite, crate::engine, crate::executor
// ============================================================================

//! ## Overview
//! Records are processed in fixed-size batches, each wrapped in its own
//! transaction on the write connection. A failing batch is rolled back and
//! retried record by record, so one bad record costs only itself: earlier
//! batches stay committed and the surviving records of the failing batch are
//! still inserted. During the retry, rows that hit a uniqueness constraint
//! are reported as skipped, not failed; every other rejection is a genuine
//! per-record failure. With `use_transaction` disabled every record runs in
//! autocommit mode from the start. Records can also be drawn from a
//! [`RecordSource`] instead of an in-memory slice.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use datashed_core::BatchStatus;
use datashed_core::BulkInsertReport;
use datashed_core::DatabaseName;
use datashed_core::EngineError;
use datashed_core::RecordFailure;
use datashed_core::RecordSource;
use datashed_core::Row;
use datashed_core::SourceError;
use serde::Deserialize;
use serde::Serialize;

use crate::engine::Engine;
use crate::engine::quote_identifier;
use crate::engine::to_sql_value;
use crate::engine::validate_identifier;
use crate::stats::OpClass;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Tuning knobs for one bulk insert call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkInsertOptions {
    /// Records per batch; clamped to the engine's configured maximum.
    pub batch_size: Option<usize>,
    /// Skip rows that violate a uniqueness constraint instead of failing them.
    pub skip_duplicates: bool,
    /// Wrap each batch in a transaction; `false` inserts row by row in
    /// autocommit mode.
    pub use_transaction: bool,
}

impl Default for BulkInsertOptions {
    fn default() -> Self {
        Self { batch_size: None, skip_duplicates: true, use_transaction: true }
    }
}

// ============================================================================
// SECTION: Batch Accumulator
// ============================================================================

/// Running tallies for one bulk insert call.
#[derive(Debug, Default)]
struct BulkTally {
    /// Records durably inserted.
    inserted: usize,
    /// Records skipped under the duplicate policy.
    skipped: usize,
    /// Records that failed.
    failed: usize,
    /// Capped failure detail list.
    errors: Vec<RecordFailure>,
    /// Cap on the failure detail list.
    error_cap: usize,
}

impl BulkTally {
    /// Records one failed record, capping the detail list.
    fn record_failure(&mut self, record_index: usize, message: String) {
        self.failed += 1;
        if self.errors.len() < self.error_cap {
            self.errors.push(RecordFailure { record_index, message });
        }
    }
}

// ============================================================================
// SECTION: Engine Operation
// ============================================================================

impl Engine {
    /// Inserts a record sequence in batches with per-batch atomicity.
    ///
    /// # Invariants
    /// - `total_records == inserted + skipped + failed` in the report.
    /// - A batch that fails mid-flight is rolled back and retried record by
    ///   record; records in other batches are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the database does not exist and
    /// [`EngineError::InvalidOperation`] when the table or the first record's
    /// column names fail identifier validation. Per-record problems are
    /// reported in the result, not as errors.
    pub fn bulk_insert(
        &self,
        database: &DatabaseName,
        table: &str,
        records: &[Row],
        options: &BulkInsertOptions,
    ) -> Result<BulkInsertReport, EngineError> {
        let started = Instant::now();
        validate_identifier("table", table)?;
        let Some(first) = records.first() else {
            return Ok(empty_report(started));
        };
        for name in first.column_names() {
            validate_identifier("column", name)?;
        }

        let batch_size = options
            .batch_size
            .unwrap_or(self.config().bulk_batch_size)
            .clamp(1, self.config().bulk_batch_size);
        let sql = bulk_insert_sql(table, &first.column_names());

        let handle = self.registry().acquire(database)?;
        let mut guard = handle.lock_write()?;

        let mut tally = BulkTally { error_cap: self.config().bulk_error_cap, ..BulkTally::default() };
        let mut batches_processed = 0usize;
        for (batch_index, chunk) in records.chunks(batch_size).enumerate() {
            let base = batch_index * batch_size;
            batches_processed += 1;

            // Records that disagree with the first record's shape never reach
            // SQL; they fail individually without poisoning the batch.
            let mut valid: Vec<(usize, &Row)> = Vec::with_capacity(chunk.len());
            for (offset, row) in chunk.iter().enumerate() {
                if row.same_shape_as(first) {
                    valid.push((base + offset, row));
                } else {
                    tally.record_failure(
                        base + offset,
                        "record columns differ from the first record".to_string(),
                    );
                }
            }
            if valid.is_empty() {
                continue;
            }

            if options.use_transaction {
                match run_batch(&mut guard, &sql, &valid) {
                    Ok(inserted) => tally.inserted += inserted,
                    Err(err) => {
                        self.stats().record_db_error(&err);
                        self.stats().record_rollback();
                        insert_individually(
                            &guard,
                            &sql,
                            &valid,
                            options.skip_duplicates,
                            &mut tally,
                        );
                    }
                }
            } else {
                insert_individually(&guard, &sql, &valid, options.skip_duplicates, &mut tally);
            }
        }

        self.stats().record_op(OpClass::BulkInsert);
        Ok(BulkInsertReport {
            status: BatchStatus::from_counts(tally.inserted + tally.skipped, tally.failed),
            total_records: records.len(),
            inserted_records: tally.inserted,
            skipped_records: tally.skipped,
            failed_records: tally.failed,
            batches_processed,
            errors: tally.errors,
            execution_time_ms: elapsed_ms(started),
        })
    }

    /// Drains a record source and bulk-inserts everything it yields.
    ///
    /// The source is read in batch-sized chunks until exhausted; the drained
    /// records then follow the same batching, duplicate, and failure rules
    /// as [`Engine::bulk_insert`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] when the source cannot be read and
    /// [`EngineError::InvalidOperation`] when a record fails to parse, in
    /// addition to the [`Engine::bulk_insert`] errors.
    pub fn bulk_insert_from_source(
        &self,
        database: &DatabaseName,
        table: &str,
        source: &mut dyn RecordSource,
        options: &BulkInsertOptions,
    ) -> Result<BulkInsertReport, EngineError> {
        let batch_size = options
            .batch_size
            .unwrap_or(self.config().bulk_batch_size)
            .clamp(1, self.config().bulk_batch_size);
        let mut records = Vec::new();
        loop {
            let batch = source.next_batch(batch_size).map_err(source_error)?;
            if batch.is_empty() {
                break;
            }
            records.extend(batch);
        }
        self.bulk_insert(database, table, &records, options)
    }
}

/// Maps record-source failures onto the engine taxonomy.
fn source_error(err: SourceError) -> EngineError {
    match err {
        SourceError::Read(message) => EngineError::Io(message),
        SourceError::Parse { .. } => EngineError::InvalidOperation(err.to_string()),
    }
}

// ============================================================================
// SECTION: Batch Execution
// ============================================================================

/// Runs one batch inside its own transaction.
///
/// Returns the inserted-row count on commit; any failure rolls the whole
/// batch back and surfaces the error for the record-by-record retry.
fn run_batch(
    conn: &mut rusqlite::Connection,
    sql: &str,
    rows: &[(usize, &Row)],
) -> Result<usize, rusqlite::Error> {
    let tx = conn.transaction()?;
    let mut inserted = 0usize;
    {
        let mut statement = tx.prepare_cached(sql)?;
        for (_, row) in rows {
            inserted += execute_row(&mut statement, row)?;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// Inserts records one by one in autocommit mode.
///
/// Serves both the non-transactional mode and the retry of a rolled-back
/// batch. Each record succeeds, skips, or fails on its own; nothing here
/// aborts the overall call.
fn insert_individually(
    conn: &rusqlite::Connection,
    sql: &str,
    rows: &[(usize, &Row)],
    skip_duplicates: bool,
    tally: &mut BulkTally,
) {
    for (record_index, row) in rows {
        let outcome = conn.prepare_cached(sql).and_then(|mut statement| {
            execute_row(&mut statement, row)
        });
        match outcome {
            Ok(count) => tally.inserted += count,
            Err(err) if skip_duplicates && is_duplicate_key(&err) => tally.skipped += 1,
            Err(err) => tally.record_failure(*record_index, err.to_string()),
        }
    }
}

/// Recognizes uniqueness violations, which the skip policy tolerates.
fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Binds and executes one record, returning the affected-row count.
fn execute_row(
    statement: &mut rusqlite::CachedStatement<'_>,
    row: &Row,
) -> Result<usize, rusqlite::Error> {
    let bound: Vec<rusqlite::types::Value> =
        row.iter().map(|(_, value)| to_sql_value(value)).collect();
    statement.execute(rusqlite::params_from_iter(bound))
}

/// Builds the batched insert statement for one column set.
fn bulk_insert_sql(table: &str, columns: &[&str]) -> String {
    let column_list =
        columns.iter().map(|name| quote_identifier(name)).collect::<Vec<_>>().join(", ");
    let placeholders =
        (1..=columns.len()).map(|n| format!("?{n}")).collect::<Vec<_>>().join(", ");
    format!("INSERT INTO {} ({column_list}) VALUES ({placeholders})", quote_identifier(table))
}

/// Builds the trivial report for an empty record sequence.
fn empty_report(started: Instant) -> BulkInsertReport {
    BulkInsertReport {
        status: BatchStatus::Success,
        total_records: 0,
        inserted_records: 0,
        skipped_records: 0,
        failed_records: 0,
        batches_processed: 0,
        errors: Vec::new(),
        execution_time_ms: elapsed_ms(started),
    }
}

/// Elapsed wall-clock milliseconds since `started`.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_quotes_identifiers_and_numbers_placeholders() {
        let sql = bulk_insert_sql("items", &["id", "name"]);
        assert_eq!(sql, "INSERT INTO \"items\" (\"id\", \"name\") VALUES (?1, ?2)");
    }

    #[test]
    fn duplicate_detection_matches_unique_and_primary_key_codes() {
        let unique = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            None,
        );
        assert!(is_duplicate_key(&unique));
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(!is_duplicate_key(&busy));
    }

    #[test]
    fn tally_caps_error_detail_but_counts_everything() {
        let mut tally = BulkTally { error_cap: 2, ..BulkTally::default() };
        for index in 0..5 {
            tally.record_failure(index, "boom".to_string());
        }
        assert_eq!(tally.failed, 5);
        assert_eq!(tally.errors.len(), 2);
        assert_eq!(tally.errors[1].record_index, 1);
    }
}
