use super::insert::{now, render_value};
use super::select::{BuiltQuery, QueryBuilder};
use crate::ident::quote;
use crate::value::{ColumnValues, DATETIME_FORMAT};
use chrono::NaiveDateTime;

impl QueryBuilder {
    /// `UPDATE t SET ... [WHERE ...]`.
    ///
    /// An update-time convention column is set to the current time unless
    /// `data` already sets it. SET parameters precede WHERE parameters.
    pub fn build_update(&self, data: &ColumnValues) -> BuiltQuery {
        self.build_update_at(data, now())
    }

    pub(crate) fn build_update_at(&self, data: &ColumnValues, now: NaiveDateTime) -> BuiltQuery {
        let Some(table) = self.tables.first() else {
            return BuiltQuery::default();
        };
        if data.is_empty() {
            return BuiltQuery::default();
        }

        let mut data = data.clone();
        if let Some(column) = self.schemas.conventions(&self.table_name()).update_time() {
            if !data.contains(column) {
                data.insert(column, now.format(DATETIME_FORMAT).to_string());
            }
        }

        let mut params = Vec::new();
        let assignments: Vec<String> = data
            .iter()
            .map(|(column, value)| format!("{} = {}", quote(column), render_value(value, &mut params)))
            .collect();

        let mut sql = format!("UPDATE {} SET {}", table.to_sql(), assignments.join(", "));
        self.push_where(&mut sql);
        params.extend_from_slice(self.where_builder.params());

        BuiltQuery { sql, params }
    }
}
