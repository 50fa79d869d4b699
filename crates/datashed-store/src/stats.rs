// crates/datashed-store/src/stats.rs
// ============================================================================
// Module: Engine Stats
// Description: Lightweight operation and error counters.
// Purpose: Provide observability hooks without hard telemetry dependencies.
// Dependencies: rusqlite, serde
// ============================================================================

//! ## Overview
//! Dependency-light counters for local diagnostics: per-class operation
//! counts, rollback counts, and classified database errors. Hosts that want
//! Prometheus or OpenTelemetry export read snapshots; the engine itself
//! never logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use rusqlite::ErrorCode;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Counters
// ============================================================================

/// Per-class operation counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpCounts {
    /// Transaction calls.
    pub transactions: u64,
    /// Bulk insert calls.
    pub bulk_inserts: u64,
    /// Batch query calls.
    pub batch_queries: u64,
    /// Prepared statement executions.
    pub prepared_executions: u64,
    /// Schema-affecting calls (create/delete database).
    pub ddl: u64,
}

/// Classified database error counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbErrorCounts {
    /// Count of `busy` database errors.
    pub busy: u64,
    /// Count of `locked` database errors.
    pub locked: u64,
    /// Count of all other database errors.
    pub other: u64,
}

/// Snapshot of engine counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStatsSnapshot {
    /// Per-class operation counts.
    pub op_counts: OpCounts,
    /// Number of rollbacks issued.
    pub rollbacks: u64,
    /// Classified database error counters.
    pub db_errors: DbErrorCounts,
}

/// Operation class used for counter updates.
#[derive(Debug, Clone, Copy)]
pub(crate) enum OpClass {
    /// One transaction call.
    Transaction,
    /// One bulk insert call.
    BulkInsert,
    /// One batch query call.
    BatchQuery,
    /// One prepared statement execution.
    PreparedExecution,
    /// One schema-affecting call.
    Ddl,
}

/// Internal mutable counters behind a mutex.
#[derive(Debug, Default)]
pub(crate) struct EngineStats {
    /// Current counter values.
    inner: Mutex<EngineStatsSnapshot>,
}

impl EngineStats {
    /// Records one operation of the given class.
    pub(crate) fn record_op(&self, class: OpClass) {
        let Ok(mut stats) = self.inner.lock() else {
            return;
        };
        let slot = match class {
            OpClass::Transaction => &mut stats.op_counts.transactions,
            OpClass::BulkInsert => &mut stats.op_counts.bulk_inserts,
            OpClass::BatchQuery => &mut stats.op_counts.batch_queries,
            OpClass::PreparedExecution => &mut stats.op_counts.prepared_executions,
            OpClass::Ddl => &mut stats.op_counts.ddl,
        };
        *slot = slot.saturating_add(1);
    }

    /// Records one rollback.
    pub(crate) fn record_rollback(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.rollbacks = stats.rollbacks.saturating_add(1);
        }
    }

    /// Records one classified database error.
    pub(crate) fn record_db_error(&self, error: &rusqlite::Error) {
        let Ok(mut stats) = self.inner.lock() else {
            return;
        };
        let slot = match error {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::DatabaseBusy => &mut stats.db_errors.busy,
                ErrorCode::DatabaseLocked => &mut stats.db_errors.locked,
                _ => &mut stats.db_errors.other,
            },
            _ => &mut stats.db_errors.other,
        };
        *slot = slot.saturating_add(1);
    }

    /// Returns a snapshot of the current counters.
    pub(crate) fn snapshot(&self) -> EngineStatsSnapshot {
        self.inner.lock().map(|stats| stats.clone()).unwrap_or_default()
    }

    /// Resets all counters to zero.
    pub(crate) fn reset(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            *stats = EngineStatsSnapshot::default();
        }
    }
}
