//! Driver-neutral result rows.
//!
//! An executor hands back a [`ResultSet`]: column metadata (name, the scan
//! type the driver reports, and the database type name) plus raw [`Cell`]s.
//! The decoder turns those into row mappings or typed records.

use chrono::{NaiveDate, NaiveDateTime};

/// A decoded row: ordered column name → JSON scalar.
pub type RowMap = serde_json::Map<String, serde_json::Value>;

/// The Rust-side type a driver would scan a column into.
///
/// Nullable columns report one of the `Null*` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    NullString,
    NullBool,
    NullInt32,
    NullInt64,
    NullFloat64,
    NullTime,
    /// Undecoded bytes (text, decimal, blob, json...)
    RawBytes,
    String,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Time,
    Unknown,
}

/// Result column metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub scan_type: ScanType,
    /// Database type name as reported by the server, e.g. `DATETIME`.
    pub database_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, scan_type: ScanType, database_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scan_type,
            database_type: database_type.into(),
        }
    }
}

/// A raw cell as produced by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Text view of the cell, used by string-target scans and parse fallbacks.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Cell::Int(v) => Some(v.to_string()),
            Cell::UInt(v) => Some(v.to_string()),
            Cell::Float(v) => Some(v.to_string()),
            Cell::Bool(v) => Some(if *v { "1" } else { "0" }.to_string()),
            Cell::Date(d) => Some(d.format(crate::value::DATE_FORMAT).to_string()),
            Cell::DateTime(dt) => Some(dt.format(crate::value::DATETIME_FORMAT).to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Bytes(v.as_bytes().to_vec())
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(v: NaiveDateTime) -> Self {
        Cell::DateTime(v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map_or(Cell::Null, Into::into)
    }
}

/// Rows returned by a read statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row (builder style, handy for scripted executors).
    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}
