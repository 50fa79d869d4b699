// crates/datashed-store/src/config.rs
// ============================================================================
// Module: Store Configuration
// Description: Engine configuration with validated runtime limits.
// Purpose: Map configuration 1:1 to SQLite pragmas and engine limits.
// Dependencies: serde, datashed-core
// ============================================================================

//! ## Overview
//! [`StoreConfig`] carries everything the engine needs at construction time:
//! the sandbox root, connection pragmas, read pool sizing, prepared-cache
//! capacity, and bulk-insert reporting limits. Limits are validated once at
//! engine construction; zero-valued limits are rejected rather than silently
//! clamped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use datashed_core::EngineError;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default number of read-only connections per database handle.
const DEFAULT_READ_POOL_SIZE: usize = 4;
/// Default per-connection prepared statement cache capacity.
const DEFAULT_PREPARED_CACHE_CAPACITY: usize = 32;
/// Default cap on the bulk-insert error list.
const DEFAULT_BULK_ERROR_CAP: usize = 10;
/// Default bulk-insert batch size.
const DEFAULT_BULK_BATCH_SIZE: usize = 1_000;

// ============================================================================
// SECTION: Pragma Modes
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// WAL journal mode (recommended; required for the read pool).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl JournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the Datashed engine.
///
/// # Invariants
/// - `root` is the sandbox directory holding one `.db` file per logical
///   database; created on first use if absent.
/// - `busy_timeout_ms` is interpreted as milliseconds.
/// - Pool, cache, and batch limits must be greater than zero.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Sandbox root directory for store files.
    pub root: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SyncMode,
    /// Number of read-only connections per database handle.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
    /// Per-connection prepared statement cache capacity.
    #[serde(default = "default_prepared_cache_capacity")]
    pub prepared_cache_capacity: usize,
    /// Maximum entries kept in a bulk-insert error list.
    #[serde(default = "default_bulk_error_cap")]
    pub bulk_error_cap: usize,
    /// Default bulk-insert batch size when the caller does not supply one.
    #[serde(default = "default_bulk_batch_size")]
    pub bulk_batch_size: usize,
}

impl StoreConfig {
    /// Builds a config with defaults for everything except the root.
    #[must_use]
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            sync_mode: SyncMode::default(),
            read_pool_size: DEFAULT_READ_POOL_SIZE,
            prepared_cache_capacity: DEFAULT_PREPARED_CACHE_CAPACITY,
            bulk_error_cap: DEFAULT_BULK_ERROR_CAP,
            bulk_batch_size: DEFAULT_BULK_BATCH_SIZE,
        }
    }

    /// Validates runtime limits.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOperation`] when a limit is zero.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.read_pool_size == 0 {
            return Err(EngineError::InvalidOperation(
                "read_pool_size must be greater than zero".to_string(),
            ));
        }
        if self.prepared_cache_capacity == 0 {
            return Err(EngineError::InvalidOperation(
                "prepared_cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.bulk_error_cap == 0 {
            return Err(EngineError::InvalidOperation(
                "bulk_error_cap must be greater than zero".to_string(),
            ));
        }
        if self.bulk_batch_size == 0 {
            return Err(EngineError::InvalidOperation(
                "bulk_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default read connection pool size.
const fn default_read_pool_size() -> usize {
    DEFAULT_READ_POOL_SIZE
}

/// Returns the default prepared statement cache capacity.
const fn default_prepared_cache_capacity() -> usize {
    DEFAULT_PREPARED_CACHE_CAPACITY
}

/// Returns the default bulk-insert error list cap.
const fn default_bulk_error_cap() -> usize {
    DEFAULT_BULK_ERROR_CAP
}

/// Returns the default bulk-insert batch size.
const fn default_bulk_batch_size() -> usize {
    DEFAULT_BULK_BATCH_SIZE
}
