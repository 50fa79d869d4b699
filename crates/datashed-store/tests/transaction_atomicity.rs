// crates/datashed-store/tests/transaction_atomicity.rs
// ============================================================================
// Module: Transaction Atomicity Tests
// Description: End-to-end checks of ordered execution and full rollback.
// Purpose: Prove one call is one transaction, with honest failure reporting.
// Dependencies: datashed-core, datashed-store, tempfile
// ============================================================================

//! Integration coverage for the transaction executor: ordered application,
//! first-failure rollback, pre-transactional validation, and isolation
//! level plumbing.

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
use datashed_core::IsolationLevel;
use datashed_core::Operation;
use datashed_core::OperationStatus;
use datashed_core::Row;
use datashed_core::ScalarValue;
use datashed_core::SchemaDraft;
use datashed_core::TableDefinition;
use datashed_store::BatchQuery;
use datashed_store::Engine;
use datashed_store::StoreConfig;
use tempfile::TempDir;

/// Creates an engine over a temp directory and a `users` database.
fn engine_with_users() -> (TempDir, Engine, DatabaseName) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::new(StoreConfig::for_root(dir.path())).unwrap();
    let name = DatabaseName::parse("people").unwrap();
    let draft = SchemaDraft {
        database_description: "People directory used by the test suite".to_string(),
        tables: vec![TableDefinition {
            table_name: "users".to_string(),
            table_description: "Registered users with contact details".to_string(),
            columns: vec![
                ColumnDefinition {
                    name: "id".to_string(),
                    column_type: ColumnType::Integer,
                    description: "Synthetic primary key".to_string(),
                    constraints: Some("PRIMARY KEY".to_string()),
                },
                ColumnDefinition {
                    name: "name".to_string(),
                    column_type: ColumnType::Text,
                    description: "Display name of the user".to_string(),
                    constraints: Some("NOT NULL".to_string()),
                },
                ColumnDefinition {
                    name: "email".to_string(),
                    column_type: ColumnType::Text,
                    description: "Contact email address".to_string(),
                    constraints: None,
                },
            ],
        }],
    };
    engine.create_database(&name, &draft).unwrap();
    (dir, engine, name)
}

fn user_row(id: i64, name: &str, email: &str) -> Row {
    Row::from_pairs(vec![
        ("id".to_string(), ScalarValue::Integer(id)),
        ("name".to_string(), ScalarValue::Text(name.to_string())),
        ("email".to_string(), ScalarValue::Text(email.to_string())),
    ])
    .unwrap()
}

/// Reads one column of every `users` row through the batch query path.
fn select_column(engine: &Engine, name: &DatabaseName, column: &str) -> Vec<ScalarValue> {
    let report = engine
        .run_batch_queries(
            name,
            &[BatchQuery {
                query_id: datashed_core::QueryId::new("probe"),
                sql: format!("SELECT {column} FROM users ORDER BY id"),
                params: Vec::new(),
            }],
            false,
        )
        .unwrap();
    let outcome = report.results.values().next().unwrap();
    let datashed_core::QueryOutcome::Ok {
        result: OperationStatus::Rows { rows, .. },
    } = outcome
    else {
        panic!("expected rows, got {outcome:?}");
    };
    rows.iter().map(|row| row.get(column).unwrap().clone()).collect()
}

#[test]
fn insert_then_update_commits_both_in_order() {
    let (_dir, engine, name) = engine_with_users();
    let operations = vec![
        Operation::insert("users", vec![user_row(1, "Alice", "alice@old.example")]).unwrap(),
        Operation::query(
            "UPDATE users SET email = ?1 WHERE name = ?2",
            vec![
                ScalarValue::Text("alice@new.example".to_string()),
                ScalarValue::Text("Alice".to_string()),
            ],
        )
        .unwrap(),
    ];

    let result = engine.run_transaction(&name, &operations, IsolationLevel::Deferred).unwrap();
    assert_eq!(result.status, BatchStatus::Success);
    assert_eq!(result.operations_executed, 2);
    assert!(!result.rollback_performed);
    assert_eq!(result.outcomes[0].status, OperationStatus::Affected { count: 1 });
    assert_eq!(result.outcomes[1].status, OperationStatus::Affected { count: 1 });

    // The update saw the insert from the same transaction.
    assert_eq!(
        select_column(&engine, &name, "email"),
        vec![ScalarValue::Text("alice@new.example".to_string())]
    );
}

#[test]
fn first_failure_rolls_back_every_earlier_operation() {
    let (_dir, engine, name) = engine_with_users();
    engine
        .run_transaction(
            &name,
            &[Operation::insert("users", vec![user_row(1, "Alice", "alice@example.com")]).unwrap()],
            IsolationLevel::Deferred,
        )
        .unwrap();

    let operations = vec![
        Operation::insert("users", vec![user_row(2, "Bob", "bob@example.com")]).unwrap(),
        // Fails at runtime: no such table.
        Operation::query("UPDATE missing_table SET name = 'x'", Vec::new()).unwrap(),
        // Never reached.
        Operation::insert("users", vec![user_row(3, "Carol", "carol@example.com")]).unwrap(),
    ];

    let result = engine.run_transaction(&name, &operations, IsolationLevel::Deferred).unwrap();
    assert_eq!(result.status, BatchStatus::Failed);
    assert!(result.rollback_performed);
    assert_eq!(result.operations_executed, 2);
    assert_eq!(result.outcomes.len(), 2);
    // The first outcome documents work that was rolled back.
    assert_eq!(result.outcomes[0].status, OperationStatus::Affected { count: 1 });
    assert!(matches!(result.outcomes[1].status, OperationStatus::Failed { .. }));

    // Only the committed Alice row survives.
    assert_eq!(
        select_column(&engine, &name, "name"),
        vec![ScalarValue::Text("Alice".to_string())]
    );

    let stats = engine.stats_snapshot();
    assert_eq!(stats.rollbacks, 1);
}

#[test]
fn reads_inside_a_transaction_return_rows() {
    let (_dir, engine, name) = engine_with_users();
    let operations = vec![
        Operation::insert(
            "users",
            vec![user_row(1, "Alice", "a@example.com"), user_row(2, "Bob", "b@example.com")],
        )
        .unwrap(),
        Operation::query("SELECT name FROM users ORDER BY id", Vec::new()).unwrap(),
    ];

    let result = engine.run_transaction(&name, &operations, IsolationLevel::Immediate).unwrap();
    assert_eq!(result.status, BatchStatus::Success);
    let OperationStatus::Rows { columns, rows } = &result.outcomes[1].status else {
        panic!("expected rows");
    };
    assert_eq!(columns, &["name".to_string()]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("name"), Some(&ScalarValue::Text("Alice".to_string())));
}

#[test]
fn empty_operation_list_is_rejected_before_any_transaction() {
    let (_dir, engine, name) = engine_with_users();
    let err = engine.run_transaction(&name, &[], IsolationLevel::Deferred).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
    assert!(err.is_pre_transactional());
    assert_eq!(engine.stats_snapshot().op_counts.transactions, 0);
}

#[test]
fn malformed_identifier_fails_validation_with_no_side_effects() {
    let (_dir, engine, name) = engine_with_users();
    let bad_column = Row::from_pairs(vec![(
        "name\"; DROP TABLE users; --".to_string(),
        ScalarValue::Text("x".to_string()),
    )])
    .unwrap();
    let operations = vec![
        Operation::insert("users", vec![user_row(1, "Alice", "a@example.com")]).unwrap(),
        Operation::insert("users", vec![bad_column]).unwrap(),
    ];

    let err = engine.run_transaction(&name, &operations, IsolationLevel::Deferred).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
    // Validation failed before the transaction began, so op 0 never ran.
    assert!(select_column(&engine, &name, "id").is_empty());
}

#[test]
fn unknown_database_is_not_found() {
    let dir = TempDir::new().unwrap();
    let engine = Engine::new(StoreConfig::for_root(dir.path())).unwrap();
    let name = DatabaseName::parse("ghost").unwrap();
    let operations = vec![Operation::query("SELECT 1", Vec::new()).unwrap()];
    let err = engine.run_transaction(&name, &operations, IsolationLevel::Deferred).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[test]
fn every_isolation_level_commits() {
    let (_dir, engine, name) = engine_with_users();
    for (id, isolation) in [
        (1, IsolationLevel::Deferred),
        (2, IsolationLevel::Immediate),
        (3, IsolationLevel::Exclusive),
    ] {
        let operations = vec![
            Operation::insert("users", vec![user_row(id, "User", "u@example.com")]).unwrap(),
        ];
        let result = engine.run_transaction(&name, &operations, isolation).unwrap();
        assert_eq!(result.status, BatchStatus::Success);
    }
    assert_eq!(select_column(&engine, &name, "id").len(), 3);
}

#[test]
fn ddl_through_a_transaction_refreshes_the_stored_contract() {
    let (_dir, engine, name) = engine_with_users();
    let operations = vec![
        Operation::query("CREATE TABLE notes (body TEXT)", Vec::new()).unwrap(),
    ];
    engine.run_transaction(&name, &operations, IsolationLevel::Deferred).unwrap();

    let info = engine.database_info(&name).unwrap();
    let table_names: Vec<&str> =
        info.tables.iter().map(|table| table.table_name.as_str()).collect();
    assert_eq!(table_names, vec!["notes", "users"]);
    // The contracted table keeps its description; the ad-hoc one gets a
    // placeholder until it is documented.
    let notes = info.tables.iter().find(|table| table.table_name == "notes").unwrap();
    assert_eq!(notes.description.as_deref(), Some("No description recorded"));
    let users = info.tables.iter().find(|table| table.table_name == "users").unwrap();
    assert_eq!(users.description.as_deref(), Some("Registered users with contact details"));
    assert_eq!(engine.stats_snapshot().op_counts.ddl, 1);
}

#[test]
fn insert_rows_primitive_commits_all_rows_or_none() {
    let (_dir, engine, name) = engine_with_users();
    let inserted = engine
        .insert_rows(
            &name,
            "users",
            &[user_row(1, "Ana", "ana@example.com"), user_row(2, "Ben", "ben@example.com")],
        )
        .unwrap();
    assert_eq!(inserted, 2);

    // A duplicate key anywhere in the set aborts the whole call.
    let err = engine
        .insert_rows(
            &name,
            "users",
            &[user_row(3, "Cas", "cas@example.com"), user_row(1, "Dup", "dup@example.com")],
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Execution(_)));
    assert_eq!(select_column(&engine, &name, "id").len(), 2);
}

#[test]
fn insert_rows_primitive_rejects_empty_and_mismatched_sets() {
    let (_dir, engine, name) = engine_with_users();
    let err = engine.insert_rows(&name, "users", &[]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));

    let odd = Row::from_pairs(vec![("id".to_string(), ScalarValue::Integer(9))]).unwrap();
    let err = engine
        .insert_rows(&name, "users", &[user_row(1, "Ana", "ana@example.com"), odd])
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
}
