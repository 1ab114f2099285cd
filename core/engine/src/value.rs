//! FILENAME: core/engine/src/value.rs
//! PURPOSE: Defines the scalar values and rows the grid operates on.
//! CONTEXT: Rows arrive wholesale from the data layer as field -> value maps.
//! Every engine component reads them through the coercions defined here, so
//! the tolerant parsing rules (comma decimals, blank strings) live in one place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name under which a row's identifier is mirrored in its values.
pub const ID_FIELD: &str = "id";

/// A single scalar cell value.
/// Dates are carried as date-like strings (or epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, or a string that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value. Strings accept a comma as decimal separator
    /// (`"12,5"` is 12.5). Booleans and blanks are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Boolean view of the value, accepting the usual textual spellings.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Some(true),
                "false" | "0" | "no" | "n" => Some(false),
                _ => None,
            },
            Value::Null => None,
        }
    }

    /// Plain display string. Null renders as the empty string.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_plain_number(*n),
            Value::Text(s) => s.clone(),
        }
    }

    /// Key used for lookups by identity (option maps, tree linkage).
    /// `1`, `1.0` and `"1"` all share the key `"1"`.
    pub fn key(&self) -> String {
        match self {
            Value::Text(s) => s.trim().to_string(),
            other => other.display(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Parses a user-entered number, normalising a decimal comma.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Formats without unnecessary decimal places.
pub fn format_plain_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// ROW IDENTIFIERS
// ============================================================================

/// Externally-assigned unique row identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl RowId {
    pub fn to_value(&self) -> Value {
        match self {
            RowId::Int(i) => Value::Number(*i as f64),
            RowId::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(i) => write!(f, "{}", i),
            RowId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RowId {
    fn from(i: i64) -> Self {
        RowId::Int(i)
    }
}

impl From<i32> for RowId {
    fn from(i: i32) -> Self {
        RowId::Int(i as i64)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId::Text(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId::Text(s)
    }
}

// ============================================================================
// ROW
// ============================================================================

/// One record of the dataset: an id plus field -> value pairs.
/// `values["id"]` always mirrors `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        let id = id.into();
        let mut values = BTreeMap::new();
        values.insert(ID_FIELD.to_string(), id.to_value());
        Row { id, values }
    }

    /// Builder-style setter used heavily by fixtures and importers.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        if field == ID_FIELD {
            return;
        }
        self.values.insert(field.to_string(), value.into());
    }

    /// Missing fields read as `Null`.
    pub fn get(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(field).unwrap_or(&NULL)
    }
}
