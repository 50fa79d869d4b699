// crates/datashed-core/tests/proptest_validator.rs
// ============================================================================
// Module: Metadata Contract Property-Based Tests
// Description: Property tests for the schema draft validator.
// Purpose: Prove every violation is found in one pass across input shapes.
// ============================================================================

//! Property-based tests for the metadata contract validator.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use datashed_core::ColumnDefinition;
use datashed_core::ColumnType;
use datashed_core::SchemaDraft;
use datashed_core::TableDefinition;
use datashed_core::validate_schema;
use proptest::prelude::*;

/// Generates a description plus whether it satisfies the contract.
///
/// Bad descriptions stay under five characters even after trimming.
fn description_strategy() -> impl Strategy<Value = (String, bool)> {
    prop_oneof![
        "[a-z]{5,24}".prop_map(|text| (text, true)),
        "[ a-z]{0,4}".prop_map(|text| (text, false)),
    ]
}

/// Generates a name plus whether it is non-blank.
fn name_strategy() -> impl Strategy<Value = (String, bool)> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,11}".prop_map(|name| (name, true)),
        " {0,3}".prop_map(|name| (name, false)),
    ]
}

/// Generates one column definition plus its expected violation count.
fn column_strategy() -> impl Strategy<Value = (ColumnDefinition, usize)> {
    (name_strategy(), description_strategy()).prop_map(|((name, name_ok), (desc, desc_ok))| {
        let bad = usize::from(!name_ok) + usize::from(!desc_ok);
        (
            ColumnDefinition {
                name,
                column_type: ColumnType::Text,
                description: desc,
                constraints: None,
            },
            bad,
        )
    })
}

/// Generates one table definition plus its expected violation count.
fn table_strategy() -> impl Strategy<Value = (TableDefinition, usize)> {
    (name_strategy(), description_strategy(), prop::collection::vec(column_strategy(), 1 .. 4))
        .prop_map(|((name, name_ok), (desc, desc_ok), columns)| {
            let mut bad = usize::from(!name_ok) + usize::from(!desc_ok);
            let mut definitions = Vec::with_capacity(columns.len());
            for (column, column_bad) in columns {
                bad += column_bad;
                definitions.push(column);
            }
            (
                TableDefinition {
                    table_name: name,
                    table_description: desc,
                    columns: definitions,
                },
                bad,
            )
        })
}

/// Generates a whole draft plus its expected violation count.
fn draft_strategy() -> impl Strategy<Value = (SchemaDraft, usize)> {
    (description_strategy(), prop::collection::vec(table_strategy(), 1 .. 4)).prop_map(
        |((desc, desc_ok), tables)| {
            let mut bad = usize::from(!desc_ok);
            let mut definitions = Vec::with_capacity(tables.len());
            for (table, table_bad) in tables {
                bad += table_bad;
                definitions.push(table);
            }
            (
                SchemaDraft {
                    database_description: desc,
                    tables: definitions,
                },
                bad,
            )
        },
    )
}

proptest! {
    #[test]
    fn validator_finds_every_violation_in_one_pass((draft, expected_bad) in draft_strategy()) {
        match validate_schema(&draft) {
            Ok(()) => prop_assert_eq!(expected_bad, 0),
            Err(violations) => {
                prop_assert_eq!(violations.len(), expected_bad);
                for violation in &violations.violations {
                    prop_assert!(
                        violation.path == "database_description"
                            || violation.path.starts_with("tables["),
                        "unexpected violation path: {}",
                        violation.path
                    );
                }
            }
        }
    }

    #[test]
    fn validation_never_panics_on_arbitrary_text(
        database_description in ".{0,48}",
        table_name in ".{0,16}",
        column_description in ".{0,48}",
    ) {
        let draft = SchemaDraft {
            database_description,
            tables: vec![TableDefinition {
                table_name,
                table_description: "holds generated fixtures".to_string(),
                columns: vec![ColumnDefinition {
                    name: "value".to_string(),
                    column_type: ColumnType::Integer,
                    description: column_description,
                    constraints: None,
                }],
            }],
        };
        let _ = validate_schema(&draft);
    }
}
