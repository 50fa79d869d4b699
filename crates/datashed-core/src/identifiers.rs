// crates/datashed-core/src/identifiers.rs
// ============================================================================
// Module: Datashed Identifiers
// Description: Canonical opaque identifiers for databases, statements, queries.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Datashed.
//! Identifiers serialize as plain strings on the wire. [`DatabaseName`] is
//! validated at construction because it participates in filesystem path
//! mapping: the sandbox must never see separators, traversal components, or
//! control characters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted length of a database name in bytes.
pub const MAX_DATABASE_NAME_LENGTH: usize = 128;

// ============================================================================
// SECTION: Database Name
// ============================================================================

/// Invalid database name errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    /// Name is empty.
    #[error("database name must not be empty")]
    Empty,
    /// Name exceeds the length cap.
    #[error("database name too long: {actual} bytes (max {max})")]
    TooLong {
        /// Maximum allowed bytes.
        max: usize,
        /// Actual name length in bytes.
        actual: usize,
    },
    /// Name contains a character outside the sandbox-safe set.
    #[error("database name contains disallowed character: {0:?}")]
    DisallowedCharacter(char),
}

/// Logical database name, 1:1 with one sandboxed store file.
///
/// # Invariants
/// - Non-empty, at most [`MAX_DATABASE_NAME_LENGTH`] bytes.
/// - Characters are limited to ASCII alphanumerics, `_`, and `-`, so the
///   name can never escape the sandbox root or smuggle path components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct DatabaseName(String);

impl DatabaseName {
    /// Parses and validates a database name.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidNameError`] when the name is empty, too long, or
    /// contains a character outside the sandbox-safe set.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidNameError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidNameError::Empty);
        }
        if raw.len() > MAX_DATABASE_NAME_LENGTH {
            return Err(InvalidNameError::TooLong {
                max: MAX_DATABASE_NAME_LENGTH,
                actual: raw.len(),
            });
        }
        if let Some(bad) = raw.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
        {
            return Err(InvalidNameError::DisallowedCharacter(bad));
        }
        Ok(Self(raw))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for DatabaseName {
    type Error = InvalidNameError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<DatabaseName> for String {
    fn from(name: DatabaseName) -> Self {
        name.0
    }
}

// ============================================================================
// SECTION: Statement / Query Identifiers
// ============================================================================

/// Caller-chosen identifier for a prepared statement, unique per database.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(String);

impl StatementId {
    /// Creates a new statement identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Caller-chosen identifier for one query inside a batch.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(String);

impl QueryId {
    /// Creates a new query identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
