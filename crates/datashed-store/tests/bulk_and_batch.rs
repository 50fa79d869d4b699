// crates/datashed-store/tests/bulk_and_batch.rs
// ============================================================================
// Module: Bulk Insert and Batch Query Tests
// Description: End-to-end checks of batched loading and batched reads.
// Purpose: Prove per-batch atomicity, duplicate skipping, and per-query
//          outcomes.
// Dependencies: datashed-core, datashed-store, tempfile
// ============================================================================

//! Integration coverage for the bulk insert batcher and the batch query
//! executor, including the failure-containment paths.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use datashed_core::BatchStatus;
use datashed_core::ColumnDefinition;
use datashed_core::ColumnType;
use datashed_core::DatabaseName;
use datashed_core::EngineError;
use datashed_core::OperationStatus;
use datashed_core::QueryId;
use datashed_core::QueryOutcome;
use datashed_core::RecordSource;
use datashed_core::Row;
use datashed_core::SourceError;
use datashed_core::ScalarValue;
use datashed_core::SchemaDraft;
use datashed_core::TableDefinition;
use datashed_store::BatchQuery;
use datashed_store::BulkInsertOptions;
use datashed_store::Engine;
use datashed_store::StoreConfig;
use tempfile::TempDir;

fn engine_with_items() -> (TempDir, Engine, DatabaseName) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::new(StoreConfig::for_root(dir.path())).unwrap();
    let name = DatabaseName::parse("inventory").unwrap();
    let draft = SchemaDraft {
        database_description: "Inventory fixture for batch tests".to_string(),
        tables: vec![TableDefinition {
            table_name: "items".to_string(),
            table_description: "Stocked items keyed by a unique id".to_string(),
            columns: vec![
                ColumnDefinition {
                    name: "id".to_string(),
                    column_type: ColumnType::Integer,
                    description: "Unique item identifier".to_string(),
                    constraints: Some("PRIMARY KEY".to_string()),
                },
                ColumnDefinition {
                    name: "label".to_string(),
                    column_type: ColumnType::Text,
                    description: "Human-readable item label".to_string(),
                    constraints: Some("NOT NULL".to_string()),
                },
            ],
        }],
    };
    engine.create_database(&name, &draft).unwrap();
    (dir, engine, name)
}

fn item(id: i64, label: &str) -> Row {
    Row::from_pairs(vec![
        ("id".to_string(), ScalarValue::Integer(id)),
        ("label".to_string(), ScalarValue::Text(label.to_string())),
    ])
    .unwrap()
}

fn count_items(engine: &Engine, name: &DatabaseName) -> i64 {
    let report = engine
        .run_batch_queries(
            name,
            &[BatchQuery {
                query_id: QueryId::new("count"),
                sql: "SELECT COUNT(*) AS n FROM items".to_string(),
                params: Vec::new(),
            }],
            false,
        )
        .unwrap();
    let QueryOutcome::Ok { result: OperationStatus::Rows { rows, .. } } =
        report.results.values().next().unwrap()
    else {
        panic!("expected rows");
    };
    let Some(ScalarValue::Integer(n)) = rows[0].get("n") else {
        panic!("expected integer count");
    };
    *n
}

// ============================================================================
// SECTION: Bulk Insert
// ============================================================================

#[test]
fn bulk_insert_splits_into_batches_and_commits_all() {
    let (_dir, engine, name) = engine_with_items();
    let records: Vec<Row> = (0..2500).map(|id| item(id, "widget")).collect();

    let report = engine
        .bulk_insert(
            &name,
            "items",
            &records,
            &BulkInsertOptions { batch_size: Some(1000), ..BulkInsertOptions::default() },
        )
        .unwrap();

    assert_eq!(report.status, BatchStatus::Success);
    assert_eq!(report.total_records, 2500);
    assert_eq!(report.inserted_records, 2500);
    assert_eq!(report.batches_processed, 3);
    assert!(report.errors.is_empty());
    assert_eq!(count_items(&engine, &name), 2500);
}

#[test]
fn duplicate_keys_are_skipped_not_failed() {
    let (_dir, engine, name) = engine_with_items();
    let records = vec![item(1, "first"), item(2, "second"), item(1, "dupe")];

    let report =
        engine.bulk_insert(&name, "items", &records, &BulkInsertOptions::default()).unwrap();
    assert_eq!(report.status, BatchStatus::Success);
    assert_eq!(report.inserted_records, 2);
    assert_eq!(report.skipped_records, 1);
    assert_eq!(report.failed_records, 0);
    assert_eq!(count_items(&engine, &name), 2);
}

#[test]
fn one_bad_record_fails_alone_and_good_neighbors_survive() {
    let (_dir, engine, name) = engine_with_items();
    // Violates NOT NULL on label; the batch is retried record by record.
    let bad = Row::from_pairs(vec![
        ("id".to_string(), ScalarValue::Integer(2)),
        ("label".to_string(), ScalarValue::Null),
    ])
    .unwrap();
    let records = vec![item(1, "alpha"), bad, item(3, "gamma")];

    let report =
        engine.bulk_insert(&name, "items", &records, &BulkInsertOptions::default()).unwrap();
    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert_eq!(report.inserted_records, 2);
    assert_eq!(report.failed_records, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].record_index, 1);
    assert_eq!(count_items(&engine, &name), 2);
}

#[test]
fn shape_mismatched_records_fail_without_reaching_sql() {
    let (_dir, engine, name) = engine_with_items();
    let odd = Row::from_pairs(vec![("unexpected".to_string(), ScalarValue::Integer(9))]).unwrap();
    let records = vec![item(1, "alpha"), odd];

    let report =
        engine.bulk_insert(&name, "items", &records, &BulkInsertOptions::default()).unwrap();
    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert_eq!(report.inserted_records, 1);
    assert_eq!(report.failed_records, 1);
    assert!(report.errors[0].message.contains("differ"));
}

#[test]
fn strict_duplicate_policy_reports_duplicates_as_failures() {
    let (_dir, engine, name) = engine_with_items();
    let records = vec![item(1, "first"), item(1, "dupe")];

    let report = engine
        .bulk_insert(
            &name,
            "items",
            &records,
            &BulkInsertOptions { skip_duplicates: false, ..BulkInsertOptions::default() },
        )
        .unwrap();
    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert_eq!(report.inserted_records, 1);
    assert_eq!(report.skipped_records, 0);
    assert_eq!(report.failed_records, 1);
    assert_eq!(report.errors[0].record_index, 1);
}

#[test]
fn empty_record_set_is_a_trivial_success() {
    let (_dir, engine, name) = engine_with_items();
    let report = engine.bulk_insert(&name, "items", &[], &BulkInsertOptions::default()).unwrap();
    assert_eq!(report.status, BatchStatus::Success);
    assert_eq!(report.total_records, 0);
    assert_eq!(report.batches_processed, 0);
}

#[test]
fn bulk_insert_into_unknown_table_reports_per_record_failures() {
    let (_dir, engine, name) = engine_with_items();
    let report = engine
        .bulk_insert(&name, "nope", &[item(1, "x")], &BulkInsertOptions::default())
        .unwrap();
    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.failed_records, 1);
}

// ============================================================================
// SECTION: Batch Queries
// ============================================================================

#[test]
fn collect_all_mode_reports_every_query_outcome() {
    let (_dir, engine, name) = engine_with_items();
    engine.bulk_insert(&name, "items", &[item(1, "a"), item(2, "b")], &BulkInsertOptions::default())
        .unwrap();

    let queries = vec![
        BatchQuery {
            query_id: QueryId::new("good"),
            sql: "SELECT label FROM items ORDER BY id".to_string(),
            params: Vec::new(),
        },
        BatchQuery {
            query_id: QueryId::new("broken"),
            sql: "SELECT label FROM missing".to_string(),
            params: Vec::new(),
        },
        BatchQuery {
            query_id: QueryId::new("also_good"),
            sql: "SELECT COUNT(*) AS n FROM items".to_string(),
            params: Vec::new(),
        },
    ];

    let report = engine.run_batch_queries(&name, &queries, false).unwrap();
    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert_eq!(report.total_queries, 3);
    assert_eq!(report.successful_queries, 2);
    assert_eq!(report.failed_queries, 1);
    assert!(matches!(report.results[&QueryId::new("good")], QueryOutcome::Ok { .. }));
    assert!(matches!(report.results[&QueryId::new("broken")], QueryOutcome::Err { .. }));
    assert!(matches!(report.results[&QueryId::new("also_good")], QueryOutcome::Ok { .. }));
}

#[test]
fn fail_fast_skips_everything_after_the_first_failure() {
    let (_dir, engine, name) = engine_with_items();
    let queries = vec![
        BatchQuery {
            query_id: QueryId::new("q1"),
            sql: "SELECT 1 AS one".to_string(),
            params: Vec::new(),
        },
        BatchQuery {
            query_id: QueryId::new("q2"),
            sql: "SELECT nope FROM missing".to_string(),
            params: Vec::new(),
        },
        BatchQuery {
            query_id: QueryId::new("q3"),
            sql: "SELECT 3 AS three".to_string(),
            params: Vec::new(),
        },
    ];

    let report = engine.run_batch_queries(&name, &queries, true).unwrap();
    // Stopping early marks the whole batch failed, even with prior successes.
    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.successful_queries, 1);
    assert_eq!(report.failed_queries, 1);
    assert!(matches!(report.results[&QueryId::new("q3")], QueryOutcome::Skipped));
    // Every submitted id still has exactly one slot.
    assert_eq!(report.results.len(), 3);
}

#[test]
fn write_statements_are_rejected_per_query_not_per_batch() {
    let (_dir, engine, name) = engine_with_items();
    let queries = vec![
        BatchQuery {
            query_id: QueryId::new("write"),
            sql: "DELETE FROM items".to_string(),
            params: Vec::new(),
        },
        BatchQuery {
            query_id: QueryId::new("read"),
            sql: "SELECT COUNT(*) AS n FROM items".to_string(),
            params: Vec::new(),
        },
    ];

    let report = engine.run_batch_queries(&name, &queries, false).unwrap();
    let QueryOutcome::Err { message } = &report.results[&QueryId::new("write")] else {
        panic!("expected rejection");
    };
    assert!(message.contains("read-only"));
    assert!(matches!(report.results[&QueryId::new("read")], QueryOutcome::Ok { .. }));
}

#[test]
fn duplicate_query_ids_are_rejected_before_execution() {
    let (_dir, engine, name) = engine_with_items();
    let queries = vec![
        BatchQuery {
            query_id: QueryId::new("dup"),
            sql: "SELECT 1".to_string(),
            params: Vec::new(),
        },
        BatchQuery {
            query_id: QueryId::new("dup"),
            sql: "SELECT 2".to_string(),
            params: Vec::new(),
        },
    ];
    let err = engine.run_batch_queries(&name, &queries, false).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
}

#[test]
fn parameters_bind_positionally() {
    let (_dir, engine, name) = engine_with_items();
    engine
        .bulk_insert(&name, "items", &[item(1, "a"), item(2, "b")], &BulkInsertOptions::default())
        .unwrap();

    let report = engine
        .run_batch_queries(
            &name,
            &[BatchQuery {
                query_id: QueryId::new("param"),
                sql: "SELECT label FROM items WHERE id = ?1".to_string(),
                params: vec![ScalarValue::Integer(2)],
            }],
            false,
        )
        .unwrap();
    let QueryOutcome::Ok { result: OperationStatus::Rows { rows, .. } } =
        &report.results[&QueryId::new("param")]
    else {
        panic!("expected rows");
    };
    assert_eq!(rows[0].get("label"), Some(&ScalarValue::Text("b".to_string())));
}

// ============================================================================
// SECTION: Direct Primitives
// ============================================================================

struct SliceSource {
    rows: Vec<Row>,
    cursor: usize,
}

impl RecordSource for SliceSource {
    fn next_batch(&mut self, max_records: usize) -> Result<Vec<Row>, SourceError> {
        let end = (self.cursor + max_records).min(self.rows.len());
        let batch = self.rows[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(batch)
    }
}

#[test]
fn non_transactional_mode_skips_duplicates_row_by_row() {
    let (_dir, engine, name) = engine_with_items();
    let records = vec![item(1, "a"), item(1, "dupe"), item(2, "b")];

    let report = engine
        .bulk_insert(
            &name,
            "items",
            &records,
            &BulkInsertOptions { use_transaction: false, ..BulkInsertOptions::default() },
        )
        .unwrap();

    assert_eq!(report.status, BatchStatus::Success);
    assert_eq!(report.inserted_records, 2);
    assert_eq!(report.skipped_records, 1);
    assert_eq!(report.failed_records, 0);
    assert_eq!(count_items(&engine, &name), 2);
}

#[test]
fn record_source_drains_into_bulk_insert() {
    let (_dir, engine, name) = engine_with_items();
    let mut source =
        SliceSource { rows: (0..7).map(|id| item(id, "sourced")).collect(), cursor: 0 };

    let report = engine
        .bulk_insert_from_source(
            &name,
            "items",
            &mut source,
            &BulkInsertOptions { batch_size: Some(3), ..BulkInsertOptions::default() },
        )
        .unwrap();

    assert_eq!(report.status, BatchStatus::Success);
    assert_eq!(report.total_records, 7);
    assert_eq!(report.inserted_records, 7);
    assert_eq!(count_items(&engine, &name), 7);
}

#[test]
fn single_query_primitive_binds_parameters() {
    let (_dir, engine, name) = engine_with_items();
    engine.insert_rows(&name, "items", &[item(1, "a"), item(2, "b")]).unwrap();

    let status = engine
        .query(&name, "SELECT label FROM items WHERE id = ?1", &[ScalarValue::Integer(2)])
        .unwrap();
    let OperationStatus::Rows { rows, .. } = status else {
        panic!("expected rows");
    };
    assert_eq!(rows[0].get("label"), Some(&ScalarValue::Text("b".to_string())));
}

#[test]
fn single_query_primitive_rejects_writes() {
    let (_dir, engine, name) = engine_with_items();
    let err = engine.query(&name, "DELETE FROM items", &[]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
}
