//! Table schema cache.
//!
//! [`SchemaCache`] maps table names to `DESC`-style column descriptors. It is
//! filled once, usually at startup through [`SchemaCache::load`], then shared
//! read-only behind an `Arc` by every builder that needs conventions. There is
//! no interior mutability: populate first, share afterwards.

use crate::client::Executor;
use crate::convention::Conventions;
use crate::error::DbxResult;
use crate::gateway;
use crate::ident::{bare_table_name, quote};
use crate::row::ResultSet;
use std::collections::HashMap;

/// One column as reported by `DESC <table>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Base type name without size or modifiers, lowercased (`int`, `datetime`).
    pub data_type: String,
    /// Declared size, `0` when absent.
    pub size: u32,
    pub unsigned: bool,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub auto_increment: bool,
    pub primary_key: bool,
}

impl ColumnDescriptor {
    /// Build a descriptor from a column name and MySQL type text such as
    /// `int(10) unsigned`.
    pub fn new(name: impl Into<String>, type_text: &str) -> Self {
        let (data_type, size, unsigned) = parse_type(type_text);
        Self {
            name: name.into(),
            data_type,
            size,
            unsigned,
            nullable: false,
            default_value: None,
            auto_increment: false,
            primary_key: false,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Parse the six columns of a `DESC` row: Field, Type, Null, Key,
    /// Default, Extra.
    pub fn from_describe(
        field: &str,
        type_text: &str,
        null: &str,
        key: &str,
        default: Option<&str>,
        extra: &str,
    ) -> Self {
        let mut column = Self::new(field, type_text);
        column.nullable = null.to_ascii_uppercase().contains("YES");
        column.primary_key = key.to_ascii_uppercase().contains("PRI");
        column.auto_increment = extra.contains("auto_increment");
        column.default_value = default.map(str::to_string);
        column
    }

    pub fn is_integer(&self) -> bool {
        self.data_type.contains("int")
    }

    pub fn is_datetime(&self) -> bool {
        self.data_type == "datetime"
    }

    /// `date`, `datetime` or `timestamp`.
    pub fn is_temporal(&self) -> bool {
        matches!(self.data_type.as_str(), "date" | "datetime" | "timestamp")
    }
}

fn parse_type(type_text: &str) -> (String, u32, bool) {
    let lower = type_text.trim().to_ascii_lowercase();
    let unsigned = lower.contains("unsigned");
    let head = lower.split_whitespace().next().unwrap_or_default();

    match head.split_once('(') {
        Some((base, rest)) => {
            let size = rest
                .trim_end_matches(')')
                .split(',')
                .next()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0);
            (base.to_string(), size, unsigned)
        }
        None => (head.to_string(), 0, unsigned),
    }
}

/// Table name → column descriptors.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    tables: HashMap<String, Vec<ColumnDescriptor>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a table's columns.
    pub fn insert(&mut self, table: impl AsRef<str>, columns: Vec<ColumnDescriptor>) {
        self.tables.insert(bare_table_name(table.as_ref()), columns);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_table(mut self, table: impl AsRef<str>, columns: Vec<ColumnDescriptor>) -> Self {
        self.insert(table, columns);
        self
    }

    /// Columns of a table. Schema qualification and backticks are ignored.
    pub fn columns(&self, table: &str) -> Option<&[ColumnDescriptor]> {
        self.tables.get(&bare_table_name(table)).map(Vec::as_slice)
    }

    /// Convention lookups for a table; empty when the table is unknown.
    pub fn conventions(&self, table: &str) -> Conventions<'_> {
        Conventions::new(self.columns(table).unwrap_or_default())
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Introspect every table visible to the connection.
    ///
    /// Runs `SHOW TABLES` and then `DESC` per table. A table whose `DESC`
    /// fails is logged and skipped.
    pub async fn load<E: Executor>(conn: &E) -> DbxResult<Self> {
        let timeout = gateway::DEFAULT_TIMEOUT;
        let tables = gateway::fetch(conn, "SHOW TABLES", &[], timeout, |rs| {
            Ok(first_column_text(&rs))
        })
        .await?;

        let mut cache = Self::new();
        for table in tables {
            let sql = format!("DESC {}", quote(&table));
            match gateway::fetch(conn, &sql, &[], timeout, |rs| Ok(describe_rows(&rs))).await {
                Ok(columns) if !columns.is_empty() => cache.insert(&table, columns),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(target: "dbx", table = %table, error = %err, "skipping table schema");
                }
            }
        }

        tracing::debug!(target: "dbx", tables = cache.len(), "schema cache loaded");
        Ok(cache)
    }
}

fn first_column_text(rs: &ResultSet) -> Vec<String> {
    rs.rows
        .iter()
        .filter_map(|row| row.first().and_then(|c| c.to_text()))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Turn `DESC` output rows into descriptors, skipping malformed rows.
pub fn describe_rows(rs: &ResultSet) -> Vec<ColumnDescriptor> {
    rs.rows
        .iter()
        .filter(|row| row.len() >= 6)
        .filter_map(|row| {
            let text = |i: usize| row[i].to_text();
            let field = text(0).filter(|f| !f.is_empty())?;
            Some(ColumnDescriptor::from_describe(
                &field,
                &text(1).unwrap_or_default(),
                &text(2).unwrap_or_default(),
                &text(3).unwrap_or_default(),
                text(4).as_deref(),
                &text(5).unwrap_or_default(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{Cell, Column, ScanType};

    #[test]
    fn parses_type_text() {
        let c = ColumnDescriptor::new("id", "int(10) unsigned");
        assert_eq!(c.data_type, "int");
        assert_eq!(c.size, 10);
        assert!(c.unsigned);

        let c = ColumnDescriptor::new("price", "decimal(10,2)");
        assert_eq!((c.data_type.as_str(), c.size), ("decimal", 10));

        let c = ColumnDescriptor::new("created_at", "datetime");
        assert_eq!((c.data_type.as_str(), c.size, c.unsigned), ("datetime", 0, false));
    }

    #[test]
    fn parses_describe_flags() {
        let c = ColumnDescriptor::from_describe(
            "id",
            "bigint(20)",
            "NO",
            "PRI",
            None,
            "auto_increment",
        );
        assert!(c.primary_key && c.auto_increment && !c.nullable);
        assert_eq!(c.default_value, None);

        let c = ColumnDescriptor::from_describe("note", "varchar(64)", "YES", "", Some(""), "");
        assert!(c.nullable && !c.primary_key);
        assert_eq!(c.default_value.as_deref(), Some(""));
    }

    #[test]
    fn describe_rows_skip_malformed() {
        let cols = ["Field", "Type", "Null", "Key", "Default", "Extra"]
            .into_iter()
            .map(|n| Column::new(n, ScanType::RawBytes, "VARCHAR"))
            .collect();
        let rs = ResultSet::new(cols)
            .with_row(vec![
                "id".into(),
                "int(11)".into(),
                "NO".into(),
                "PRI".into(),
                Cell::Null,
                "auto_increment".into(),
            ])
            .with_row(vec!["broken".into()]);
        let parsed = describe_rows(&rs);
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].primary_key);
    }

    #[test]
    fn lookups_ignore_qualification() {
        let cache = SchemaCache::new()
            .with_table("users", vec![ColumnDescriptor::new("id", "int")]);
        assert!(cache.columns("shop.`users`").is_some());
        assert!(cache.columns("orders").is_none());
        assert_eq!(cache.len(), 1);
    }
}
