// crates/datashed-core/src/validate.rs
// ============================================================================
// Module: Datashed Metadata Contract
// Description: Structural validation of schema drafts before any DDL runs.
// Purpose: Enforce the self-describing contract in one pass, no I/O.
// Dependencies: crate::error, crate::schema
// ============================================================================

//! ## Overview
//! The metadata contract says every database, table, and column must carry a
//! meaningful description before it may exist. [`validate_schema`] is a pure
//! structural check run before any `CREATE TABLE` is issued. It collects
//! **every** violation in one pass, so a corrective retry can fix everything
//! at once instead of discovering problems one by one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::SchemaViolations;
use crate::error::Violation;
use crate::schema::MIN_DESCRIPTION_LENGTH;
use crate::schema::SchemaDraft;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Checks one description field, recording a violation when it is too short.
fn check_description(violations: &mut Vec<Violation>, path: &str, description: &str) {
    if description.trim().chars().count() < MIN_DESCRIPTION_LENGTH {
        violations.push(Violation::new(
            path,
            format!("description must be at least {MIN_DESCRIPTION_LENGTH} characters"),
        ));
    }
}

/// Checks one name field, recording a violation when it is blank.
fn check_name(violations: &mut Vec<Violation>, path: &str, name: &str) {
    if name.trim().is_empty() {
        violations.push(Violation::new(path, "name must be a non-empty string"));
    }
}

/// Validates a schema draft against the metadata contract.
///
/// Rules:
/// - `database_description` present and at least
///   [`MIN_DESCRIPTION_LENGTH`] characters.
/// - At least one table; every table has a non-blank name, a
///   sufficiently long `table_description`, and a non-empty column list.
/// - Every column has a non-blank name and a sufficiently long
///   `description`. Column types are closed by construction
///   ([`crate::schema::ColumnType`]), so no type rule can fail here.
///
/// The check never touches storage.
///
/// # Errors
///
/// Returns [`SchemaViolations`] carrying the complete list of violations
/// found in one pass.
pub fn validate_schema(draft: &SchemaDraft) -> Result<(), SchemaViolations> {
    let mut violations = Vec::new();
    check_description(&mut violations, "database_description", &draft.database_description);
    if draft.tables.is_empty() {
        violations.push(Violation::new("tables", "at least one table definition is required"));
    }
    for (table_index, table) in draft.tables.iter().enumerate() {
        check_name(&mut violations, &format!("tables[{table_index}].table_name"), &table.table_name);
        check_description(
            &mut violations,
            &format!("tables[{table_index}].table_description"),
            &table.table_description,
        );
        if table.columns.is_empty() {
            violations.push(Violation::new(
                format!("tables[{table_index}].columns"),
                "at least one column is required",
            ));
        }
        for (column_index, column) in table.columns.iter().enumerate() {
            check_name(
                &mut violations,
                &format!("tables[{table_index}].columns[{column_index}].name"),
                &column.name,
            );
            check_description(
                &mut violations,
                &format!("tables[{table_index}].columns[{column_index}].description"),
                &column.description,
            );
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaViolations::new(violations))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;
    use crate::schema::ColumnDefinition;
    use crate::schema::ColumnType;
    use crate::schema::TableDefinition;

    fn column(name: &str, description: &str) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            column_type: ColumnType::Text,
            description: description.to_string(),
            constraints: None,
        }
    }

    fn draft(database_description: &str, tables: Vec<TableDefinition>) -> SchemaDraft {
        SchemaDraft {
            database_description: database_description.to_string(),
            tables,
        }
    }

    #[test]
    fn valid_draft_passes() {
        let draft = draft(
            "customer analytics for 2025",
            vec![TableDefinition {
                table_name: "customers".to_string(),
                table_description: "customer contact records".to_string(),
                columns: vec![column("name", "customer full name")],
            }],
        );
        assert!(validate_schema(&draft).is_ok());
    }

    #[test]
    fn every_violation_is_reported_in_one_pass() {
        let draft = draft(
            "tiny",
            vec![TableDefinition {
                table_name: String::new(),
                table_description: "ok?".to_string(),
                columns: vec![column("", "x"), column("good", "long enough description")],
            }],
        );
        let violations = validate_schema(&draft).unwrap_err();
        let paths: Vec<&str> =
            violations.violations.iter().map(|violation| violation.path.as_str()).collect();
        assert!(paths.contains(&"database_description"));
        assert!(paths.contains(&"tables[0].table_name"));
        assert!(paths.contains(&"tables[0].table_description"));
        assert!(paths.contains(&"tables[0].columns[0].name"));
        assert!(paths.contains(&"tables[0].columns[0].description"));
        assert_eq!(violations.len(), 5);
    }

    #[test]
    fn empty_table_list_is_a_violation() {
        let draft = draft("a perfectly fine description", Vec::new());
        let violations = validate_schema(&draft).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.violations[0].path, "tables");
    }

    #[test]
    fn whitespace_padding_does_not_satisfy_minimum_length() {
        let draft = draft(
            "  ab  ",
            vec![TableDefinition {
                table_name: "t".to_string(),
                table_description: "stores miscellaneous rows".to_string(),
                columns: vec![column("a", "first letter column")],
            }],
        );
        let violations = validate_schema(&draft).unwrap_err();
        assert_eq!(violations.violations[0].path, "database_description");
    }
}
