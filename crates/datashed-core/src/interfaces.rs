// crates/datashed-core/src/interfaces.rs
// ============================================================================
// Module: Datashed Interfaces
// Description: Collaborator contracts consumed by the operation engine.
// Purpose: Keep path confinement and record parsing outside the core.
// Dependencies: serde, thiserror, crate::identifiers, crate::value
// ============================================================================

//! ## Overview
//! The engine never constructs filesystem paths and never parses files. A
//! [`PathSandbox`] maps a database name to a confined store path; a
//! [`RecordSource`] yields already-parsed row batches (e.g. from a CSV
//! reader) that are handed to insert operations. Implementations must fail
//! closed on invalid input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

use crate::identifiers::DatabaseName;
use crate::value::Row;

// ============================================================================
// SECTION: Path Sandbox
// ============================================================================

/// Path sandbox errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// The sandbox root could not be created or read.
    #[error("sandbox root error: {0}")]
    Root(String),
    /// The resolved path would leave the sandbox root.
    #[error("path escapes sandbox: {0}")]
    Escape(String),
}

/// Maps database names to filesystem paths confined to an approved root.
pub trait PathSandbox {
    /// Resolves the store file path for a database name.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] when the root is unavailable or the resolved
    /// path would escape it.
    fn store_path(&self, name: &DatabaseName) -> Result<PathBuf, SandboxError>;

    /// Lists the store files currently present under the root.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] when the root cannot be read.
    fn list_store_files(&self) -> Result<Vec<PathBuf>, SandboxError>;
}

// ============================================================================
// SECTION: Record Source
// ============================================================================

/// Record source errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source could not be read.
    #[error("record source read error: {0}")]
    Read(String),
    /// A record failed to parse into the closed scalar set.
    #[error("record source parse error at record {record_index}: {message}")]
    Parse {
        /// Index of the malformed record.
        record_index: usize,
        /// Human-readable cause.
        message: String,
    },
}

/// Produces already-parsed row batches for insert operations.
///
/// The engine only consumes parsed rows; file formats (CSV, Markdown tables)
/// are the implementor's concern.
pub trait RecordSource {
    /// Reads the next batch of at most `max_records` rows.
    ///
    /// Returns an empty vector when the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when reading or parsing fails.
    fn next_batch(&mut self, max_records: usize) -> Result<Vec<Row>, SourceError>;
}
