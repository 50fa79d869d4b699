// crates/datashed-core/src/operation.rs
// ============================================================================
// Module: Datashed Operations
// Description: Typed operations executed inside one transaction.
// Purpose: Make malformed operations unrepresentable past the boundary.
// Dependencies: serde, crate::error, crate::value
// ============================================================================

//! ## Overview
//! An [`Operation`] is one typed unit of work inside a transaction: a
//! parameterized insert of one or more row maps, or a raw SQL statement with
//! positional parameters. Updates and deletes are expressed as
//! [`Operation::Query`]. Required-field validation happens at construction
//! (and again on the wire via `try_from`), so `InvalidOperation` failures are
//! always pre-transactional.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineError;
use crate::value::Row;
use crate::value::ScalarValue;

// ============================================================================
// SECTION: Isolation Levels
// ============================================================================

/// How eagerly a transaction acquires locks.
///
/// # Invariants
/// - Variants map 1:1 to SQLite transaction behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// No locks taken until the first read or write (default).
    #[default]
    #[serde(alias = "DEFERRED")]
    Deferred,
    /// Reserved lock taken immediately.
    #[serde(alias = "IMMEDIATE")]
    Immediate,
    /// Exclusive lock taken immediately.
    #[serde(alias = "EXCLUSIVE")]
    Exclusive,
}

impl IsolationLevel {
    /// Returns the SQL keyword used to begin the transaction.
    #[must_use]
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::Deferred => "DEFERRED",
            Self::Immediate => "IMMEDIATE",
            Self::Exclusive => "EXCLUSIVE",
        }
    }
}

// ============================================================================
// SECTION: Wire Shape
// ============================================================================

/// One row map or a list of row maps, as submitted on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    /// A single row map.
    One(Row),
    /// Multiple row maps, consumed in input order.
    Many(Vec<Row>),
}

/// Wire representation of an operation, before structural validation.
///
/// Update and delete are accepted as distinct tags for caller convenience
/// and fold into [`Operation::Query`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireOperation {
    /// Insert one or many rows into a table.
    Insert {
        /// Target table name.
        table_name: String,
        /// Row payload, single map or list of maps.
        data: OneOrMany,
    },
    /// Raw SQL statement with positional parameters.
    Query {
        /// SQL text.
        sql: String,
        /// Positional parameters.
        #[serde(default)]
        params: Vec<ScalarValue>,
    },
    /// Update expressed as raw SQL.
    Update {
        /// SQL text.
        sql: String,
        /// Positional parameters.
        #[serde(default)]
        params: Vec<ScalarValue>,
    },
    /// Delete expressed as raw SQL.
    Delete {
        /// SQL text.
        sql: String,
        /// Positional parameters.
        #[serde(default)]
        params: Vec<ScalarValue>,
    },
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// One typed unit of work inside a transaction.
///
/// # Invariants
/// - Immutable once submitted; exists only for the duration of one
///   transaction call.
/// - Constructed values have passed structural validation; wire values are
///   validated during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireOperation")]
#[serde(into = "WireOperation")]
pub enum Operation {
    /// Parameterized insert of one or more row maps, in input order.
    Insert {
        /// Target table name.
        table: String,
        /// Rows to insert; all rows share the first row's column set.
        rows: Vec<Row>,
    },
    /// Raw SQL statement with positional parameters.
    Query {
        /// SQL text.
        sql: String,
        /// Positional parameters.
        params: Vec<ScalarValue>,
    },
}

impl Operation {
    /// Builds a validated insert operation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOperation`] when the table name is
    /// empty, no rows are supplied, or the rows disagree on column shape.
    pub fn insert(table: impl Into<String>, rows: Vec<Row>) -> Result<Self, EngineError> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(EngineError::InvalidOperation(
                "insert operation requires a non-empty table_name".to_string(),
            ));
        }
        if rows.is_empty() {
            return Err(EngineError::InvalidOperation(
                "insert operation requires at least one row".to_string(),
            ));
        }
        if let Some((index, _)) = rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| !row.same_shape_as(&rows[0]))
        {
            return Err(EngineError::InvalidOperation(format!(
                "all rows must share the first row's columns; row {index} differs"
            )));
        }
        Ok(Self::Insert { table, rows })
    }

    /// Builds a validated raw-statement operation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOperation`] when the SQL text is empty.
    pub fn query(sql: impl Into<String>, params: Vec<ScalarValue>) -> Result<Self, EngineError> {
        let sql = sql.into();
        if sql.trim().is_empty() {
            return Err(EngineError::InvalidOperation(
                "query operation requires non-empty sql".to_string(),
            ));
        }
        Ok(Self::Query { sql, params })
    }

    /// Re-checks structural validity of an operation.
    ///
    /// The executor runs this over every submitted operation before a
    /// transaction begins, so directly constructed values get the same
    /// guarantees as wire values.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOperation`] when a required field is
    /// missing or malformed for the operation's type.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            Self::Insert { table, rows } => {
                Self::insert(table.clone(), rows.clone()).map(|_| ())
            }
            Self::Query { sql, params } => Self::query(sql.clone(), params.clone()).map(|_| ()),
        }
    }
}

impl TryFrom<WireOperation> for Operation {
    type Error = EngineError;

    fn try_from(wire: WireOperation) -> Result<Self, Self::Error> {
        match wire {
            WireOperation::Insert { table_name, data } => {
                let rows = match data {
                    OneOrMany::One(row) => vec![row],
                    OneOrMany::Many(rows) => rows,
                };
                Self::insert(table_name, rows)
            }
            WireOperation::Query { sql, params }
            | WireOperation::Update { sql, params }
            | WireOperation::Delete { sql, params } => Self::query(sql, params),
        }
    }
}

impl From<Operation> for WireOperation {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Insert { table, rows } => Self::Insert {
                table_name: table,
                data: OneOrMany::Many(rows),
            },
            Operation::Query { sql, params } => Self::Query { sql, params },
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::panic,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::*;

    fn row(pairs: &[(&str, i64)]) -> Row {
        Row::from_pairs(
            pairs
                .iter()
                .map(|(name, value)| ((*name).to_string(), ScalarValue::Integer(*value)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn insert_rejects_mismatched_row_shapes() {
        let rows = vec![row(&[("a", 1)]), row(&[("b", 2)])];
        let err = Operation::insert("items", rows).unwrap_err();
        assert!(matches!(err, EngineError::InvalidOperation(_)));
    }

    #[test]
    fn wire_update_folds_into_query() {
        let json = r#"{"type": "update", "sql": "UPDATE t SET a = ?", "params": [1]}"#;
        let operation: Operation = serde_json::from_str(json).unwrap();
        assert!(matches!(operation, Operation::Query { .. }));
    }

    #[test]
    fn wire_insert_accepts_single_row_map() {
        let json = r#"{"type": "insert", "table_name": "t", "data": {"a": 1}}"#;
        let operation: Operation = serde_json::from_str(json).unwrap();
        let Operation::Insert { rows, .. } = operation else {
            panic!("expected insert");
        };
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn wire_rejects_empty_sql_before_any_execution() {
        let json = r#"{"type": "query", "sql": "   "}"#;
        let result: Result<Operation, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn isolation_level_accepts_original_uppercase_aliases() {
        let level: IsolationLevel = serde_json::from_str("\"IMMEDIATE\"").unwrap();
        assert_eq!(level, IsolationLevel::Immediate);
        assert_eq!(IsolationLevel::default(), IsolationLevel::Deferred);
    }
}
