//! Command Outputs
//!
//! Command handlers return a list of [`Output`] values; the console renders
//! them. Tables keep typed cell values so the renderer can align numbers and
//! the JSON output keeps integers as integers.
use serde::Serialize;
use std::fmt;

use super::DbreakError;

/// A single cell value read back from a driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Whether the value should be right-aligned in a table column.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r:?}"),
            Value::Text(t) => f.write_str(t),
            Value::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

/// Tabular output: ordered column names and ordered rows of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableOutput {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        TableOutput { columns, rows }
    }

    /// Builds a table whose every cell is text.
    pub fn from_strings<I, R, S>(columns: &[&str], rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableOutput {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| Value::Text(cell.into())).collect())
                .collect(),
        }
    }
}

/// Everything a command handler can hand to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    Table(TableOutput),
    Message { text: String },
    Error { kind: String, text: String },
}

impl Output {
    pub fn message(text: impl Into<String>) -> Self {
        Output::Message { text: text.into() }
    }

    pub fn error(err: &DbreakError) -> Self {
        Output::Error {
            kind: err.kind().to_string(),
            text: err.to_string(),
        }
    }
}

impl From<TableOutput> for Output {
    fn from(table: TableOutput) -> Self {
        Output::Table(table)
    }
}
