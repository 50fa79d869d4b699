// crates/datashed-core/src/schema.rs
// ============================================================================
// Module: Datashed Schema Model
// Description: Schema drafts, table and column definitions, metadata records.
// Purpose: Model the self-describing schema contract every database carries.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every Datashed database is self-describing: the database, each table, and
//! each column carry a human description of at least
//! [`MIN_DESCRIPTION_LENGTH`] characters. This module defines the draft
//! shapes callers submit ([`SchemaDraft`]) and the metadata record persisted
//! alongside user tables ([`MetadataRecord`]). Enforcement lives in
//! [`crate::validate`]; these types only carry the data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum accepted length for database, table, and column descriptions.
pub const MIN_DESCRIPTION_LENGTH: usize = 5;

// ============================================================================
// SECTION: Column Types
// ============================================================================

/// Declared column type, drawn from a small closed set.
///
/// # Invariants
/// - Variants map 1:1 to SQLite storage classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 64-bit signed integer storage.
    Integer,
    /// Floating point storage.
    Real,
    /// UTF-8 text storage.
    Text,
    /// Raw byte storage.
    Blob,
}

impl ColumnType {
    /// Returns the SQL keyword for the type.
    #[must_use]
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
        }
    }

    /// Parses a declared type keyword, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" => Some(Self::Integer),
            "REAL" | "FLOAT" | "DOUBLE" => Some(Self::Real),
            "TEXT" => Some(Self::Text),
            "BLOB" => Some(Self::Blob),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_keyword())
    }
}

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// One column in a table definition.
///
/// # Invariants
/// - `description` must be at least [`MIN_DESCRIPTION_LENGTH`] characters;
///   enforced by [`crate::validate::validate_schema`] before any DDL runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Declared type from the closed set.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Human description of the column's meaning (and unit, if any).
    pub description: String,
    /// Optional constraint clause, e.g. `PRIMARY KEY` or `NOT NULL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

/// One table in a schema draft.
///
/// # Invariants
/// - Created once at table-creation time and never mutated in place; schema
///   changes are new CREATE operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name.
    pub table_name: String,
    /// Human description of what the table stores.
    pub table_description: String,
    /// Ordered column definitions.
    pub columns: Vec<ColumnDefinition>,
}

/// Complete schema draft submitted to database creation.
///
/// # Invariants
/// - The draft is validated structurally before any storage is touched; a
///   draft that reaches DDL has passed every metadata rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDraft {
    /// Human description of the database's purpose.
    pub database_description: String,
    /// Table definitions, created in order.
    pub tables: Vec<TableDefinition>,
}

// ============================================================================
// SECTION: Metadata Record
// ============================================================================

/// Per-database metadata persisted alongside user tables.
///
/// # Invariants
/// - Exactly one record exists per logical database.
/// - `updated_at_ms` moves forward on every create/alter/delete affecting
///   the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Database-level description.
    pub database_description: String,
    /// Creation timestamp in unix milliseconds.
    pub created_at_ms: i64,
    /// Last-modified timestamp in unix milliseconds.
    pub updated_at_ms: i64,
    /// Stored table contract, kept in sync with the live schema.
    pub tables: Vec<TableDefinition>,
}
