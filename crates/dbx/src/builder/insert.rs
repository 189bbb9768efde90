use super::select::{BuiltQuery, QueryBuilder};
use crate::ident::quote;
use crate::value::{ColumnValues, DATETIME_FORMAT, Value};
use chrono::{Local, NaiveDateTime};

/// Render one value for INSERT/UPDATE: `NULL` literal, inlined raw
/// expression, or a placeholder with its parameter.
pub(crate) fn render_value(value: &Value, params: &mut Vec<Value>) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Raw(expr) => expr.clone(),
        other => {
            params.push(other.clone());
            "?".to_string()
        }
    }
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl QueryBuilder {
    /// `INSERT INTO t (cols) VALUES (...)`.
    ///
    /// A create-time convention column is filled with the current time unless
    /// `data` already sets it. Empty `data` yields an empty statement.
    pub fn build_insert(&self, data: &ColumnValues) -> BuiltQuery {
        self.build_insert_at(data, now())
    }

    pub(crate) fn build_insert_at(&self, data: &ColumnValues, now: NaiveDateTime) -> BuiltQuery {
        let Some(table) = self.tables.first() else {
            return BuiltQuery::default();
        };
        if data.is_empty() {
            return BuiltQuery::default();
        }

        let mut data = data.clone();
        if let Some(column) = self.schemas.conventions(&self.table_name()).create_time() {
            if !data.contains(column) {
                data.insert(column, now.format(DATETIME_FORMAT).to_string());
            }
        }

        let mut params = Vec::new();
        let mut columns = Vec::with_capacity(data.len());
        let mut values = Vec::with_capacity(data.len());
        for (column, value) in data.iter() {
            columns.push(quote(column));
            values.push(render_value(value, &mut params));
        }

        BuiltQuery {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote(&table.name),
                columns.join(", "),
                values.join(", ")
            ),
            params,
        }
    }
}
