// crates/datashed-store/src/engine.rs
// ============================================================================
// Module: Engine Facade
// Description: Construction and shared plumbing for the operation engine.
// Purpose: Own the registry, prepared statements, and counters in one place.
// Dependencies: datashed-core, rusqlite
// ============================================================================

//! ## Overview
//! [`Engine`] is the single entry point hosts hold. It owns the
//! [`HandleRegistry`], the prepared-statement registry, and the operation
//! counters; the executor, batchers, and admin modules hang their
//! operations off it as `impl` blocks. Shared plumbing lives here: scalar
//! binding, row extraction, identifier hardening, and error mapping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use datashed_core::EngineError;
use datashed_core::PathSandbox;
use datashed_core::Row;
use datashed_core::ScalarValue;

use crate::config::StoreConfig;
use crate::prepared::PreparedStatements;
use crate::registry::HandleRegistry;
use crate::sandbox::DirSandbox;
use crate::stats::EngineStats;
use crate::stats::EngineStatsSnapshot;

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Transactional operation engine over sandboxed `SQLite` files.
///
/// # Invariants
/// - All store access flows through the owned [`HandleRegistry`].
/// - The engine is synchronous; it spawns no background threads.
#[derive(Debug)]
pub struct Engine {
    /// Engine configuration.
    config: StoreConfig,
    /// Registry of open database handles.
    registry: HandleRegistry,
    /// Prepared statement registry.
    prepared: PreparedStatements,
    /// Lightweight operation counters.
    stats: EngineStats,
}

impl Engine {
    /// Creates an engine with a [`DirSandbox`] rooted at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOperation`] when a configured limit is
    /// zero.
    pub fn new(config: StoreConfig) -> Result<Self, EngineError> {
        let sandbox = Arc::new(DirSandbox::new(config.root.clone()));
        Self::with_sandbox(config, sandbox)
    }

    /// Creates an engine over a caller-supplied path sandbox.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOperation`] when a configured limit is
    /// zero.
    pub fn with_sandbox(
        config: StoreConfig,
        sandbox: Arc<dyn PathSandbox + Send + Sync>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let registry = HandleRegistry::new(config.clone(), sandbox);
        Ok(Self {
            config,
            registry,
            prepared: PreparedStatements::default(),
            stats: EngineStats::default(),
        })
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the handle registry.
    #[must_use]
    pub(crate) const fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Returns the prepared statement registry.
    #[must_use]
    pub(crate) const fn prepared(&self) -> &PreparedStatements {
        &self.prepared
    }

    /// Returns the operation counters.
    #[must_use]
    pub(crate) const fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Returns a snapshot of the operation counters.
    #[must_use]
    pub fn stats_snapshot(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Resets the operation counters to zero.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

// ============================================================================
// SECTION: Shared Plumbing
// ============================================================================

/// Returns the current unix time in milliseconds.
#[must_use]
pub(crate) fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}

/// Maps a `rusqlite` error into an execution error.
pub(crate) fn execution_error(error: &rusqlite::Error) -> EngineError {
    EngineError::Execution(error.to_string())
}

/// Validates a SQL identifier (table or column name).
///
/// Identifiers come from untrusted callers and are interpolated into DDL and
/// insert statements (quoted), so the accepted shape is narrow: ASCII
/// alphanumerics and `_`, not starting with a digit.
pub(crate) fn validate_identifier(kind: &str, raw: &str) -> Result<(), EngineError> {
    if raw.is_empty() {
        return Err(EngineError::InvalidOperation(format!("{kind} name must not be empty")));
    }
    if raw.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(EngineError::InvalidOperation(format!(
            "{kind} name must not start with a digit: {raw}"
        )));
    }
    if let Some(bad) = raw.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(EngineError::InvalidOperation(format!(
            "{kind} name contains disallowed character {bad:?}: {raw}"
        )));
    }
    Ok(())
}

/// Quotes a validated identifier for interpolation into SQL text.
pub(crate) fn quote_identifier(raw: &str) -> String {
    format!("\"{raw}\"")
}

/// Converts one scalar into a `rusqlite` value for binding.
pub(crate) fn to_sql_value(value: &ScalarValue) -> rusqlite::types::Value {
    match value {
        ScalarValue::Null => rusqlite::types::Value::Null,
        ScalarValue::Integer(int) => rusqlite::types::Value::Integer(*int),
        ScalarValue::Real(real) => rusqlite::types::Value::Real(*real),
        ScalarValue::Text(text) => rusqlite::types::Value::Text(text.clone()),
        ScalarValue::Blob(bytes) => rusqlite::types::Value::Blob(bytes.clone()),
    }
}

/// Converts a borrowed `rusqlite` value into the closed scalar set.
pub(crate) fn from_sql_value(value: rusqlite::types::ValueRef<'_>) -> ScalarValue {
    match value {
        rusqlite::types::ValueRef::Null => ScalarValue::Null,
        rusqlite::types::ValueRef::Integer(int) => ScalarValue::Integer(int),
        rusqlite::types::ValueRef::Real(real) => ScalarValue::Real(real),
        rusqlite::types::ValueRef::Text(text) => {
            ScalarValue::Text(String::from_utf8_lossy(text).into_owned())
        }
        rusqlite::types::ValueRef::Blob(bytes) => ScalarValue::Blob(bytes.to_vec()),
    }
}

/// Extracts all rows from a prepared statement into `(columns, rows)`.
pub(crate) fn collect_rows(
    statement: &mut rusqlite::Statement<'_>,
    params: &[ScalarValue],
) -> Result<(Vec<String>, Vec<Row>), rusqlite::Error> {
    let columns: Vec<String> =
        statement.column_names().iter().map(|name| (*name).to_string()).collect();
    let bound: Vec<rusqlite::types::Value> = params.iter().map(to_sql_value).collect();
    let mut rows = Vec::new();
    let mut result = statement.query(rusqlite::params_from_iter(bound))?;
    while let Some(row) = result.next()? {
        let mut pairs = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            pairs.push((column.clone(), from_sql_value(row.get_ref(index)?)));
        }
        let row = Row::from_pairs(pairs).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Null,
                Box::new(err),
            )
        })?;
        rows.push(row);
    }
    Ok((columns, rows))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_validation_rejects_injection_shapes() {
        assert!(validate_identifier("table", "users").is_ok());
        assert!(validate_identifier("table", "user_2025").is_ok());
        assert!(validate_identifier("table", "users; DROP TABLE x").is_err());
        assert!(validate_identifier("table", "2users").is_err());
        assert!(validate_identifier("column", "").is_err());
        assert!(validate_identifier("column", "a\"b").is_err());
    }

    #[test]
    fn scalar_conversion_is_lossless_for_the_closed_set() {
        let values = [
            ScalarValue::Null,
            ScalarValue::Integer(42),
            ScalarValue::Real(1.5),
            ScalarValue::Text("abc".to_string()),
            ScalarValue::Blob(vec![1, 2, 3]),
        ];
        for value in values {
            let sql = to_sql_value(&value);
            let back = from_sql_value(rusqlite::types::ValueRef::from(&sql));
            assert_eq!(value, back);
        }
    }
}
