// crates/datashed-core/src/value.rs
// ============================================================================
// Module: Datashed Values
// Description: Closed scalar value set and ordered row maps.
// Purpose: Model untyped caller payloads as a small validated value algebra.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Caller payloads arrive as loosely shaped JSON. This module narrows them to
//! a closed scalar set ([`ScalarValue`]) and an ordered, duplicate-free
//! column map ([`Row`]). Anything outside the closed set is rejected at the
//! boundary so the engine never has to interpret nested shapes at execution
//! time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::de;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Value boundary errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Payload is not one of the accepted scalar kinds.
    #[error("value is not a supported scalar: {0}")]
    NotAScalar(&'static str),
    /// Row contains the same column name twice.
    #[error("duplicate column in row: {0}")]
    DuplicateColumn(String),
    /// Row carries no columns.
    #[error("row must contain at least one column")]
    EmptyRow,
}

// ============================================================================
// SECTION: Scalar Values
// ============================================================================

/// One scalar cell value.
///
/// # Invariants
/// - The variant set is closed; objects and non-byte arrays are rejected at
///   construction, never silently coerced.
/// - JSON booleans narrow to `Integer` (0 or 1), matching SQLite's own
///   boolean affinity.
/// - A JSON array whose elements are all integers in `0..=255` is the wire
///   form of `Blob`, on every boundary that accepts JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl ScalarValue {
    /// Returns a stable label for the value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }
}

/// Visitor that narrows wire scalars into the closed value set.
struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = ScalarValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("null, a number, a string, a boolean, or a byte array")
    }

    fn visit_bool<E: de::Error>(self, flag: bool) -> Result<Self::Value, E> {
        Ok(ScalarValue::Integer(i64::from(flag)))
    }

    fn visit_i64<E: de::Error>(self, int: i64) -> Result<Self::Value, E> {
        Ok(ScalarValue::Integer(int))
    }

    fn visit_u64<E: de::Error>(self, int: u64) -> Result<Self::Value, E> {
        i64::try_from(int).map(ScalarValue::Integer).map_err(|_| {
            E::custom(format!("integer out of range for 64-bit signed storage: {int}"))
        })
    }

    fn visit_f64<E: de::Error>(self, real: f64) -> Result<Self::Value, E> {
        Ok(ScalarValue::Real(real))
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
        Ok(ScalarValue::Text(text.to_string()))
    }

    fn visit_string<E: de::Error>(self, text: String) -> Result<Self::Value, E> {
        Ok(ScalarValue::Text(text))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ScalarValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ScalarValue::Null)
    }

    fn visit_bytes<E: de::Error>(self, bytes: &[u8]) -> Result<Self::Value, E> {
        Ok(ScalarValue::Blob(bytes.to_vec()))
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(byte) = access.next_element::<u8>()? {
            bytes.push(byte);
        }
        Ok(ScalarValue::Blob(bytes))
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

impl TryFrom<serde_json::Value> for ScalarValue {
    type Error = ValueError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(flag) => Ok(Self::Integer(i64::from(flag))),
            serde_json::Value::Number(number) => number.as_i64().map_or_else(
                || number.as_f64().map(Self::Real).ok_or(ValueError::NotAScalar("number")),
                |int| Ok(Self::Integer(int)),
            ),
            serde_json::Value::String(text) => Ok(Self::Text(text)),
            // Same blob wire form the deserializer accepts: every element
            // must be an integer in 0..=255.
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|byte| u8::try_from(byte).ok())
                        .ok_or(ValueError::NotAScalar("array"))
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Self::Blob),
            serde_json::Value::Object(_) => Err(ValueError::NotAScalar("object")),
        }
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Ordered mapping from column name to scalar value.
///
/// # Invariants
/// - Column order is the caller's submission order.
/// - Column names are unique within one row.
/// - A row is never empty once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Ordered `(column, value)` pairs.
    columns: Vec<(String, ScalarValue)>,
}

impl Row {
    /// Builds a row from ordered `(column, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the pair list is empty or contains a
    /// duplicate column name.
    pub fn from_pairs(pairs: Vec<(String, ScalarValue)>) -> Result<Self, ValueError> {
        if pairs.is_empty() {
            return Err(ValueError::EmptyRow);
        }
        for (index, (name, _)) in pairs.iter().enumerate() {
            if pairs.iter().take(index).any(|(seen, _)| seen == name) {
                return Err(ValueError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self { columns: pairs })
    }

    /// Returns the ordered column names.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the value stored under `column`, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.columns.iter().find(|(name, _)| name == column).map(|(_, value)| value)
    }

    /// Iterates `(column, value)` pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` when the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns `true` when this row carries exactly the same column set, in
    /// the same order, as `other`.
    #[must_use]
    pub fn same_shape_as(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|((left, _), (right, _))| left == right)
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Map visitor that preserves the document order of row columns.
struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a non-empty map of column names to scalar values")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, ScalarValue>()? {
            pairs.push((name, value));
        }
        Row::from_pairs(pairs).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(RowVisitor)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    #[test]
    fn row_preserves_submission_order() {
        let json = r#"{"zeta": 1, "alpha": "a", "mid": null}"#;
        let row: Row = serde_json::from_str(json).unwrap();
        assert_eq!(row.column_names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(row.get("mid"), Some(&ScalarValue::Null));
    }

    #[test]
    fn row_rejects_duplicate_columns() {
        let pairs = vec![
            ("a".to_string(), ScalarValue::Integer(1)),
            ("a".to_string(), ScalarValue::Integer(2)),
        ];
        assert!(matches!(Row::from_pairs(pairs), Err(ValueError::DuplicateColumn(_))));
    }

    #[test]
    fn scalar_boundary_rejects_nested_shapes() {
        let nested = serde_json::json!({"inner": 1});
        assert!(matches!(ScalarValue::try_from(nested), Err(ValueError::NotAScalar("object"))));
        let mixed = serde_json::json!([1, "two"]);
        assert!(matches!(ScalarValue::try_from(mixed), Err(ValueError::NotAScalar("array"))));
        let out_of_range = serde_json::json!([0, 256]);
        assert!(matches!(
            ScalarValue::try_from(out_of_range),
            Err(ValueError::NotAScalar("array"))
        ));
    }

    #[test]
    fn byte_arrays_narrow_to_blob_on_both_json_boundaries() {
        let wire = serde_json::json!([0, 127, 255]);
        let converted = ScalarValue::try_from(wire.clone()).unwrap();
        assert_eq!(converted, ScalarValue::Blob(vec![0, 127, 255]));
        let deserialized: ScalarValue = serde_json::from_value(wire).unwrap();
        assert_eq!(deserialized, converted);
    }

    #[test]
    fn scalar_round_trips_through_json() {
        let row = Row::from_pairs(vec![
            ("count".to_string(), ScalarValue::Integer(7)),
            ("ratio".to_string(), ScalarValue::Real(0.5)),
            ("label".to_string(), ScalarValue::Text("ok".to_string())),
        ])
        .unwrap();
        let encoded = serde_json::to_string(&row).unwrap();
        let decoded: Row = serde_json::from_str(&encoded).unwrap();
        assert_eq!(row, decoded);
    }
}
