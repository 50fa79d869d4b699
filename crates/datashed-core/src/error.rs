// crates/datashed-core/src/error.rs
// ============================================================================
// Module: Datashed Errors
// Description: Stable error taxonomy for the operation engine surface.
// Purpose: Classify failures so hosts can react programmatically.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! One taxonomy covers the whole engine surface. Structural errors
//! (`Validation`, `InvalidOperation`, `ArityMismatch`, `Conflict`) are raised
//! before any mutation begins and never trigger a rollback; `Execution`
//! errors surface store rejections inside a transaction or batch and always
//! roll back that unit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Schema Violations
// ============================================================================

/// One metadata contract violation, addressed by field path.
///
/// # Invariants
/// - `path` uses dotted segments with bracketed indices, e.g.
///   `tables[0].columns[2].description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Field path of the violating element.
    pub path: String,
    /// Human-readable description of the rule that failed.
    pub message: String,
}

impl Violation {
    /// Creates a violation from a path and message.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Complete violation list produced by one validation pass.
///
/// # Invariants
/// - Never empty; an empty pass returns `Ok(())` instead.
/// - Carries every violation found, not just the first, so one corrective
///   retry can fix everything at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolations {
    /// All violations found in one pass.
    pub violations: Vec<Violation>,
}

impl SchemaViolations {
    /// Wraps a non-empty violation list.
    #[must_use]
    pub const fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns the number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns `true` when no violations are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "; {}: {}", violation.path, violation.message)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Engine Errors
// ============================================================================

/// Operation engine errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages name the failing database/table/statement or operation index
///   and avoid embedding raw row payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Unknown database, table, or statement.
    #[error("not found: {0}")]
    NotFound(String),
    /// Creation target already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Metadata contract violation; carries all violations at once.
    #[error("schema validation failed: {0}")]
    Validation(SchemaViolations),
    /// Malformed operation shape, caught before any transaction side effect.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Duplicate prepared-statement identifier.
    #[error("statement conflict: {0}")]
    Conflict(String),
    /// Parameter count does not match the prepared statement's arity.
    #[error("parameter arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Placeholder count captured at prepare time.
        expected: usize,
        /// Parameter count supplied at execute time.
        actual: usize,
    },
    /// Underlying store rejected a statement.
    #[error("execution error: {0}")]
    Execution(String),
    /// Filesystem or connection error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<SchemaViolations> for EngineError {
    fn from(violations: SchemaViolations) -> Self {
        Self::Validation(violations)
    }
}

impl EngineError {
    /// Returns `true` when the error was raised before any mutation began.
    #[must_use]
    pub const fn is_pre_transactional(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidOperation(_)
                | Self::Conflict(_)
                | Self::ArityMismatch { .. }
        )
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_display_lists_every_entry() {
        let violations = SchemaViolations::new(vec![
            Violation::new("database_description", "too short"),
            Violation::new("tables[0].columns[1].description", "missing"),
        ]);
        let text = violations.to_string();
        assert!(text.contains("2 schema violation(s)"));
        assert!(text.contains("tables[0].columns[1].description"));
    }

    #[test]
    fn structural_errors_are_pre_transactional() {
        assert!(
            EngineError::ArityMismatch {
                expected: 2,
                actual: 1
            }
            .is_pre_transactional()
        );
        assert!(!EngineError::Execution("syntax error".to_string()).is_pre_transactional());
    }
}
