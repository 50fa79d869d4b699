// crates/datashed-store/src/lib.rs
// ============================================================================
// Module: Datashed Store
// Description: Transactional operation engine over sandboxed SQLite files.
// Purpose: Atomic operation batches, prepared statements, bulk loads.
// Dependencies: datashed-core, rusqlite, serde, serde_json
// ============================================================================

//! ## Overview
//! `datashed-store` is the SQLite engine behind Datashed. One [`Engine`]
//! owns a registry of open connections (one logical handle per database
//! name), a prepared-statement registry, and lightweight operation counters.
//! All writes to a database are serialized behind its write connection; all
//! reads ride a small read pool under WAL. Every mutation path honors the
//! metadata contract: no table exists without a validated description.

/// Discovery and lifecycle operations.
pub mod admin;
/// Batch query executor.
pub mod batch;
/// Bulk insert batcher.
pub mod bulk;
/// Engine configuration.
pub mod config;
/// Engine facade and construction.
pub mod engine;
/// Transaction executor and statement primitives.
pub mod executor;
/// Per-database metadata upkeep.
pub mod metadata;
/// Prepared statement registry.
pub mod prepared;
/// Store handle registry.
pub mod registry;
/// Directory-confined path sandbox.
pub mod sandbox;
/// Lightweight operation counters.
pub mod stats;

pub use admin::ColumnInfo;
pub use admin::CreateReport;
pub use admin::DatabaseInfo;
pub use admin::DatabaseSummary;
pub use admin::DeleteOutcome;
pub use admin::ForeignKeyInfo;
pub use admin::IndexInfo;
pub use admin::TableInfo;
pub use batch::BatchQuery;
pub use bulk::BulkInsertOptions;
pub use config::JournalMode;
pub use config::StoreConfig;
pub use config::SyncMode;
pub use engine::Engine;
pub use prepared::PreparedInfo;
pub use sandbox::DirSandbox;
pub use stats::DbErrorCounts;
pub use stats::EngineStatsSnapshot;
pub use stats::OpCounts;
