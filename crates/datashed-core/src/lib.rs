// crates/datashed-core/src/lib.rs
// ============================================================================
// Module: Datashed Core
// Description: Data model and contracts for the Datashed operation engine.
// Purpose: Define typed operations, schema metadata, results, and errors.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `datashed-core` is the pure data-model crate for Datashed: strongly typed
//! identifiers, scalar values and row maps, schema drafts with mandatory
//! descriptions, transaction operations, structured results, the metadata
//! contract validator, and the collaborator interfaces the engine consumes.
//! Nothing in this crate performs I/O; every check here is structural and
//! runs before a store is touched.

/// Error taxonomy shared across the engine surface.
pub mod error;
/// Strongly typed identifiers.
pub mod identifiers;
/// Collaborator interfaces consumed by the engine.
pub mod interfaces;
/// Typed transaction operations and isolation levels.
pub mod operation;
/// Structured per-operation and per-record results.
pub mod outcome;
/// Schema drafts, table and column definitions, metadata records.
pub mod schema;
/// Metadata contract validation.
pub mod validate;
/// Scalar values and ordered row maps.
pub mod value;

pub use error::EngineError;
pub use error::SchemaViolations;
pub use error::Violation;
pub use identifiers::DatabaseName;
pub use identifiers::InvalidNameError;
pub use identifiers::QueryId;
pub use identifiers::StatementId;
pub use interfaces::PathSandbox;
pub use interfaces::RecordSource;
pub use interfaces::SandboxError;
pub use interfaces::SourceError;
pub use operation::IsolationLevel;
pub use operation::Operation;
pub use outcome::BatchQueryReport;
pub use outcome::BatchStatus;
pub use outcome::BulkInsertReport;
pub use outcome::OperationOutcome;
pub use outcome::OperationStatus;
pub use outcome::QueryOutcome;
pub use outcome::RecordFailure;
pub use outcome::TransactionResult;
pub use schema::ColumnDefinition;
pub use schema::ColumnType;
pub use schema::MetadataRecord;
pub use schema::SchemaDraft;
pub use schema::TableDefinition;
pub use validate::validate_schema;
pub use value::Row;
pub use value::ScalarValue;
pub use value::ValueError;
