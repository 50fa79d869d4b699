// crates/datashed-core/src/outcome.rs
// ============================================================================
// Module: Datashed Outcomes
// Description: Structured per-operation and per-record result shapes.
// Purpose: Give hosts deterministic, renderable results instead of free text.
// Dependencies: serde, crate::identifiers, crate::value
// ============================================================================

//! ## Overview
//! Every engine entry point returns a structured record: status, counts, and
//! per-item outcomes addressed by operation index, record index, or query
//! identifier. Both batch components (bulk insert, batch query) share one
//! accumulator shape so hosts render partial failures uniformly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::QueryId;
use crate::value::Row;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Overall status of a multi-item call.
///
/// # Invariants
/// - `PartialSuccess` only appears where the operation semantics explicitly
///   allow partial application (batched bulk insert, batch query);
///   single-transaction calls are always all-or-nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every item succeeded.
    Success,
    /// Some items succeeded, some failed.
    PartialSuccess,
    /// No item succeeded, or the unit was rolled back.
    Failed,
}

impl BatchStatus {
    /// Derives a status from success/failure counts.
    #[must_use]
    pub const fn from_counts(succeeded: usize, failed: usize) -> Self {
        if failed == 0 {
            Self::Success
        } else if succeeded == 0 {
            Self::Failed
        } else {
            Self::PartialSuccess
        }
    }
}

// ============================================================================
// SECTION: Operation Outcomes
// ============================================================================

/// Result payload of one executed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// A read statement returned rows.
    Rows {
        /// Column names in result order.
        columns: Vec<String>,
        /// Returned rows.
        rows: Vec<Row>,
    },
    /// A write statement reported affected rows.
    Affected {
        /// Number of rows changed.
        count: usize,
    },
    /// The operation failed; the enclosing unit was rolled back.
    Failed {
        /// Human-readable cause.
        message: String,
    },
}

/// One slot in a transaction's per-operation outcome list.
///
/// # Invariants
/// - `index` is the operation's position in the submitted list.
/// - After a rollback, earlier `Rows`/`Affected` slots document what *would*
///   have happened, not what persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Position of the operation in the submitted list.
    pub index: usize,
    /// Result payload.
    pub status: OperationStatus,
}

/// Result of one transaction call.
///
/// # Invariants
/// - `outcomes` covers every executed operation in submission order;
///   operations after the first failure never execute and have no slot.
/// - `rollback_performed` is `true` exactly when `status` is `Failed` and a
///   transaction had begun.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Overall status; never `PartialSuccess`.
    pub status: BatchStatus,
    /// Number of operations that executed (including the failing one).
    pub operations_executed: usize,
    /// Per-operation outcomes in submission order.
    pub outcomes: Vec<OperationOutcome>,
    /// Whether a rollback was issued.
    pub rollback_performed: bool,
}

// ============================================================================
// SECTION: Bulk Insert Report
// ============================================================================

/// One failed record inside a bulk insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    /// Index of the record in the submitted sequence.
    pub record_index: usize,
    /// Human-readable cause.
    pub message: String,
}

/// Result of one bulk insert call.
///
/// # Invariants
/// - `total_records == inserted_records + skipped_records + failed_records`.
/// - `errors` lists failed records only (skipped records are not errors) and
///   is capped by the engine's configured error-list limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkInsertReport {
    /// Overall status derived from the failure count.
    pub status: BatchStatus,
    /// Number of records submitted.
    pub total_records: usize,
    /// Number of records durably inserted.
    pub inserted_records: usize,
    /// Number of records skipped under the duplicate-skip policy.
    pub skipped_records: usize,
    /// Number of records that failed.
    pub failed_records: usize,
    /// Number of batches driven through the executor.
    pub batches_processed: usize,
    /// Capped list of `(record index, message)` failures.
    pub errors: Vec<RecordFailure>,
    /// Elapsed wall-clock time in milliseconds.
    pub execution_time_ms: u64,
}

// ============================================================================
// SECTION: Batch Query Report
// ============================================================================

/// Outcome of one query inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The query ran and returned rows or an affected count.
    Ok {
        /// Result payload.
        result: OperationStatus,
    },
    /// The query failed.
    Err {
        /// Human-readable cause.
        message: String,
    },
    /// The query never ran because an earlier failure stopped the batch.
    Skipped,
}

/// Result of one batch query call.
///
/// # Invariants
/// - Every submitted `QueryId` appears exactly once in `results`.
/// - With `fail_fast`, queries after the first failure are `Skipped` and the
///   overall status is `Failed` regardless of earlier successes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchQueryReport {
    /// Overall batch status.
    pub status: BatchStatus,
    /// Outcome per query identifier.
    pub results: BTreeMap<QueryId, QueryOutcome>,
    /// Number of queries submitted.
    pub total_queries: usize,
    /// Number of queries that succeeded.
    pub successful_queries: usize,
    /// Number of queries that failed.
    pub failed_queries: usize,
    /// Elapsed wall-clock time in milliseconds.
    pub execution_time_ms: u64,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_counts_covers_all_splits() {
        assert_eq!(BatchStatus::from_counts(3, 0), BatchStatus::Success);
        assert_eq!(BatchStatus::from_counts(1, 2), BatchStatus::PartialSuccess);
        assert_eq!(BatchStatus::from_counts(0, 2), BatchStatus::Failed);
        // Empty inputs count as success: nothing failed.
        assert_eq!(BatchStatus::from_counts(0, 0), BatchStatus::Success);
    }
}
