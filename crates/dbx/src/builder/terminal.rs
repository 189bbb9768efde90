//! Terminal operations: build, run through the gateway, decode.
//!
//! Each operation consumes the pending timeout override. Model writes also
//! clear the include/exclude field lists. Conditions stay in place, so the
//! same builder can run several statements.

use super::insert::now;
use super::model::ModelValues;
use super::select::{BuiltQuery, QueryBuilder};
use super::table::Limit;
use super::where_builder::{Connector, WhereBuilder};
use crate::client::Executor;
use crate::convention::SoftDeleteColumn;
use crate::decode::{decimal_string, decode_maps, decode_records, first_f64, first_i64};
use crate::error::{DbxError, DbxResult};
use crate::gateway::{self, effective_timeout};
use crate::ident::{quote, result_key};
use crate::record::{FieldValue, Record};
use crate::row::RowMap;
use crate::value::{ColumnValues, DATETIME_FORMAT, Value};
use std::time::Duration;

/// Render a positive step for `col + n` / `col - n`; anything else is `None`.
fn step_literal(amount: &Value) -> Option<String> {
    match amount {
        Value::Int(n) if *n > 0 => Some(n.to_string()),
        Value::UInt(n) if *n > 0 => Some(n.to_string()),
        Value::Float(f) if *f > 0.0 => Some(decimal_string(*f)),
        Value::Str(s) => match s.trim().parse::<f64>() {
            Ok(f) if f > 0.0 => Some(decimal_string(f)),
            _ => None,
        },
        _ => None,
    }
}

impl QueryBuilder {
    fn take_timeout(&mut self) -> Duration {
        effective_timeout(self.timeout.take())
    }

    async fn fetch_maps<E: Executor>(
        conn: &E,
        query: BuiltQuery,
        timeout: Duration,
    ) -> DbxResult<Vec<RowMap>> {
        gateway::fetch(conn, &query.sql, &query.params, timeout, |rs| decode_maps(&rs)).await
    }

    async fn run_write<E: Executor>(
        conn: &E,
        query: BuiltQuery,
        timeout: Duration,
    ) -> DbxResult<crate::row::ExecOutcome> {
        gateway::execute(conn, &query.sql, &query.params, timeout).await
    }

    // ==================== Reads ====================

    /// All matching rows as column maps.
    pub async fn get<E: Executor>(&mut self, conn: &E) -> DbxResult<Vec<RowMap>> {
        let timeout = self.take_timeout();
        Self::fetch_maps(conn, self.build_select(), timeout).await
    }

    /// All matching rows decoded into `R`.
    pub async fn get_as<R: Record, E: Executor>(&mut self, conn: &E) -> DbxResult<Vec<R>> {
        let timeout = self.take_timeout();
        let query = self.build_select();
        gateway::fetch(conn, &query.sql, &query.params, timeout, |rs| {
            decode_records::<R>(&rs)
        })
        .await
    }

    /// First matching row, queried with `LIMIT 1`.
    pub async fn first<E: Executor>(&mut self, conn: &E) -> DbxResult<Option<RowMap>> {
        let timeout = self.take_timeout();
        let query = self.build_select_limited(Some(Limit::Count(1)));
        Ok(Self::fetch_maps(conn, query, timeout).await?.into_iter().next())
    }

    pub async fn first_as<R: Record, E: Executor>(&mut self, conn: &E) -> DbxResult<Option<R>> {
        let timeout = self.take_timeout();
        let query = self.build_select_limited(Some(Limit::Count(1)));
        let rows = gateway::fetch(conn, &query.sql, &query.params, timeout, |rs| {
            decode_records::<R>(&rs)
        })
        .await?;
        Ok(rows.into_iter().next())
    }

    /// A single column of the first matching row; `None` when there is no
    /// row or the value is `NULL`. `column` may carry an alias
    /// (`"name AS n"`). The builder's own selection is untouched.
    pub async fn value<E: Executor>(
        &mut self,
        conn: &E,
        column: &str,
    ) -> DbxResult<Option<serde_json::Value>> {
        let timeout = self.take_timeout();
        let mut single = self.clone();
        single.select(column);
        let query = single.build_select_limited(Some(Limit::Count(1)));
        let Some(mut row) = Self::fetch_maps(conn, query, timeout).await?.into_iter().next() else {
            return Ok(None);
        };

        let key = result_key(column);
        let value = row.remove(column).or_else(|| row.remove(&key));
        Ok(value.filter(|v| !v.is_null()))
    }

    /// [`value`](Self::value) as text; empty text is `None`.
    pub async fn string_value<E: Executor>(
        &mut self,
        conn: &E,
        column: &str,
    ) -> DbxResult<Option<String>> {
        let text = self.value(conn, column).await?.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        Ok(text.filter(|s| !s.is_empty()))
    }

    /// [`value`](Self::value) as an integer; non-numeric values are `None`.
    pub async fn int_value<E: Executor>(&mut self, conn: &E, column: &str) -> DbxResult<Option<i64>> {
        let value = self.value(conn, column).await?;
        Ok(value.and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
            serde_json::Value::Bool(b) => Some(i64::from(b)),
            _ => None,
        }))
    }

    // ==================== Aggregates ====================

    /// `COUNT(*)` over the matching rows.
    pub async fn count<E: Executor>(&mut self, conn: &E) -> DbxResult<u64> {
        self.count_column(conn, "*").await
    }

    /// `COUNT(col)` over the matching rows.
    pub async fn count_column<E: Executor>(&mut self, conn: &E, column: &str) -> DbxResult<u64> {
        let timeout = self.take_timeout();
        let query = self.build_count(column);
        let n = gateway::fetch(conn, &query.sql, &query.params, timeout, |rs| first_i64(&rs))
            .await?;
        Ok(n.map_or(0, |n| u64::try_from(n).unwrap_or(0)))
    }

    pub async fn exists<E: Executor>(&mut self, conn: &E) -> DbxResult<bool> {
        Ok(self.count(conn).await? > 0)
    }

    /// `SUM(col)` as an integer; `NULL` (no rows) is zero.
    pub async fn sum_int<E: Executor>(&mut self, conn: &E, column: &str) -> DbxResult<i64> {
        let timeout = self.take_timeout();
        let query = self.build_sum(column);
        let sum = gateway::fetch(conn, &query.sql, &query.params, timeout, |rs| first_i64(&rs))
            .await?;
        Ok(sum.unwrap_or(0))
    }

    /// `SUM(col)` as a float; `NULL` (no rows) is zero.
    pub async fn sum_float<E: Executor>(&mut self, conn: &E, column: &str) -> DbxResult<f64> {
        let timeout = self.take_timeout();
        let query = self.build_sum(column);
        let sum = gateway::fetch(conn, &query.sql, &query.params, timeout, |rs| first_f64(&rs))
            .await?;
        Ok(sum.unwrap_or(0.0))
    }

    // ==================== Writes ====================

    /// Insert one row and return the generated id (0 when none).
    pub async fn insert<E: Executor>(&mut self, conn: &E, data: &ColumnValues) -> DbxResult<u64> {
        let timeout = self.take_timeout();
        if data.is_empty() {
            return Err(DbxError::statement("insert with no column values"));
        }
        let outcome = Self::run_write(conn, self.build_insert(data), timeout).await?;
        Ok(outcome.last_insert_id.unwrap_or(0))
    }

    /// Insert a record. An unset primary key is left to the database and
    /// the generated id is written back into the record.
    pub async fn insert_model<R: Record, E: Executor>(
        &mut self,
        conn: &E,
        record: &mut R,
    ) -> DbxResult<u64> {
        let timeout = self.take_timeout();
        let ModelValues {
            mut data,
            primary_key,
        } = self.model_values(&*record);
        self.reset_field_filters();

        let generated_key = match primary_key {
            Some(pk) if pk.is_unset() => Some(pk),
            Some(pk) => {
                data.insert(pk.column, pk.value);
                None
            }
            None => None,
        };
        if data.is_empty() {
            return Err(DbxError::statement("insert with no column values"));
        }

        let outcome = Self::run_write(conn, self.build_insert(&data), timeout).await?;
        let id = outcome.last_insert_id.unwrap_or(0);
        if let Some(pk) = generated_key {
            if id > 0 && !record.set(pk.field, FieldValue::UInt(id)) {
                tracing::warn!(target: "dbx", field = pk.field, id, "could not write generated id back");
            }
        }
        Ok(id)
    }

    /// Update matching rows; returns the affected row count.
    pub async fn update<E: Executor>(&mut self, conn: &E, data: &ColumnValues) -> DbxResult<u64> {
        let timeout = self.take_timeout();
        if data.is_empty() {
            return Err(DbxError::statement("update with no column values"));
        }
        let outcome = Self::run_write(conn, self.build_update(data), timeout).await?;
        Ok(outcome.rows_affected)
    }

    /// Update from a record. With a primary key the statement targets that
    /// row alone (`pk = ?`); the builder's conditions are left as they were.
    pub async fn update_model<R: Record, E: Executor>(
        &mut self,
        conn: &E,
        record: &R,
    ) -> DbxResult<u64> {
        let timeout = self.take_timeout();
        let ModelValues { data, primary_key } = self.model_values(record);
        self.reset_field_filters();
        if data.is_empty() {
            return Err(DbxError::statement("update with no column values"));
        }

        let query = match primary_key {
            Some(pk) if pk.value.is_null() => {
                return Err(DbxError::mapping(format!(
                    "primary key field `{}` is null",
                    pk.field
                )));
            }
            Some(pk) => {
                let mut target = self.clone();
                target.where_builder = WhereBuilder::new();
                target
                    .where_builder
                    .compare(Connector::And, &pk.column, "=", pk.value);
                target.build_update(&data)
            }
            None => self.build_update(&data),
        };

        let outcome = Self::run_write(conn, query, timeout).await?;
        Ok(outcome.rows_affected)
    }

    /// Delete matching rows; returns the affected row count.
    pub async fn delete<E: Executor>(&mut self, conn: &E) -> DbxResult<u64> {
        let timeout = self.take_timeout();
        let outcome = Self::run_write(conn, self.build_delete(), timeout).await?;
        Ok(outcome.rows_affected)
    }

    /// Mark matching rows deleted through the table's soft-delete column:
    /// an integer flag is set to 1, a datetime marker to now. Tables with
    /// neither are left alone and report 0.
    pub async fn soft_delete<E: Executor>(&mut self, conn: &E) -> DbxResult<u64> {
        let timeout = self.take_timeout();
        let table = self.table_name();
        let data = match self.schemas.conventions(&table).soft_delete() {
            Some(SoftDeleteColumn::Flag(col)) => ColumnValues::new().set(col, 1),
            Some(SoftDeleteColumn::Timestamp(col)) => {
                ColumnValues::new().set(col, now().format(DATETIME_FORMAT).to_string())
            }
            None => return Ok(0),
        };
        let outcome = Self::run_write(conn, self.build_update(&data), timeout).await?;
        Ok(outcome.rows_affected)
    }

    async fn step<E: Executor>(
        &mut self,
        conn: &E,
        column: &str,
        op: char,
        amount: Value,
    ) -> DbxResult<u64> {
        let Some(literal) = step_literal(&amount) else {
            self.timeout = None;
            return Ok(0);
        };
        let column = column.trim();
        if column.is_empty() {
            self.timeout = None;
            return Ok(0);
        }
        let expr = Value::Raw(format!("{} {op} {literal}", quote(column)));
        let data = ColumnValues::new().set(column, expr);
        self.update(conn, &data).await
    }

    /// `SET col = col + amount`. Non-positive or non-numeric amounts do
    /// nothing and report 0.
    pub async fn increment<E: Executor>(
        &mut self,
        conn: &E,
        column: &str,
        amount: impl Into<Value>,
    ) -> DbxResult<u64> {
        self.step(conn, column, '+', amount.into()).await
    }

    /// `SET col = col - amount`, same rules as [`increment`](Self::increment).
    pub async fn decrement<E: Executor>(
        &mut self,
        conn: &E,
        column: &str,
        amount: impl Into<Value>,
    ) -> DbxResult<u64> {
        self.step(conn, column, '-', amount.into()).await
    }
}
