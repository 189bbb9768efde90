use super::table::{ColumnRef, Join, JoinKind, Limit, Table};
use super::where_builder::{Connector, WhereBuilder};
use crate::ident::{order_entry, quote};
use crate::schema::SchemaCache;
use crate::value::{IntoNames, Value};
use std::sync::Arc;
use std::time::Duration;

/// Fluent statement builder for one table.
///
/// Mutating methods validate their input and silently ignore anything
/// invalid or empty, always returning the builder for chaining. Terminal
/// operations (`get`, `insert`, `update`, ...) keep the accumulated
/// conditions, so a builder can be reused; only the per-call timeout and
/// include/exclude field lists are reset after each one.
///
/// ```
/// use dbx::QueryBuilder;
///
/// let mut qb = QueryBuilder::new("users u");
/// qb.select("u.id, u.name AS n")
///     .and_eq("u.status", 1)
///     .or_like("u.name", "ali")
///     .order_by("u.id desc")
///     .page(2, 10);
///
/// let built = qb.build_select();
/// assert_eq!(
///     built.sql,
///     "SELECT u.`id`, u.`name` AS n FROM `users` AS u \
///      WHERE (u.`status` = ? OR u.`name` LIKE ?) ORDER BY u.`id` DESC LIMIT 10, 10"
/// );
/// assert_eq!(built.params.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) tables: Vec<Table>,
    pub(crate) columns: Vec<ColumnRef>,
    pub(crate) joins: Vec<Join>,
    pub(crate) where_builder: WhereBuilder,
    pub(crate) order_by: Vec<String>,
    pub(crate) group_by: Vec<String>,
    pub(crate) limit: Option<Limit>,
    pub(crate) include_fields: Vec<String>,
    pub(crate) exclude_fields: Vec<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) schemas: Arc<SchemaCache>,
}

/// SQL text plus its bind parameters, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

impl QueryBuilder {
    /// Create a builder without schema information; conventions resolve to
    /// nothing.
    pub fn new(table: &str) -> Self {
        Self::with_schemas(table, Arc::new(SchemaCache::new()))
    }

    /// Create a builder that resolves conventions against `schemas`.
    pub fn with_schemas(table: &str, schemas: Arc<SchemaCache>) -> Self {
        let mut qb = Self {
            tables: Vec::new(),
            columns: Vec::new(),
            joins: Vec::new(),
            where_builder: WhereBuilder::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            limit: None,
            include_fields: Vec::new(),
            exclude_fields: Vec::new(),
            timeout: None,
            schemas,
        };
        qb.add_table(table);
        qb
    }

    /// Register a table reference. Only the first one is the statement
    /// target; re-adding a name replaces the earlier entry.
    pub fn add_table(&mut self, table: &str) -> &mut Self {
        let table = Table::parse(table);
        if table.is_empty() {
            return self;
        }
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
        self
    }

    /// Bare name of the target table (no schema, no backticks).
    pub fn table_name(&self) -> String {
        self.tables
            .first()
            .map(|t| crate::ident::bare_table_name(&t.name))
            .unwrap_or_default()
    }

    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }

    // ==================== Projection ====================

    /// Replace the column selection. Accepts `"a, b AS c"` or a sequence of
    /// names; an empty selection is ignored.
    pub fn select(&mut self, columns: impl IntoNames) -> &mut Self {
        let names = columns.into_names();
        if names.is_empty() {
            return self;
        }
        self.columns.clear();
        for name in names {
            let column = ColumnRef::parse(&name);
            match self.columns.iter_mut().find(|c| c.name == column.name) {
                Some(existing) => *existing = column,
                None => self.columns.push(column),
            }
        }
        self
    }

    // ==================== Joins ====================

    pub fn join_with(&mut self, kind: JoinKind, table: &str, on: &str) -> &mut Self {
        let table = Table::parse(table);
        let on = on.trim();
        if table.is_empty() || on.is_empty() {
            return self;
        }
        self.joins.push(Join {
            table,
            kind,
            on: on.to_string(),
        });
        self
    }

    /// INNER JOIN.
    pub fn join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_with(JoinKind::Inner, table, on)
    }

    pub fn left_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_with(JoinKind::Left, table, on)
    }

    pub fn right_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_with(JoinKind::Right, table, on)
    }

    pub fn cross_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_with(JoinKind::Cross, table, on)
    }

    pub fn outer_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_with(JoinKind::Outer, table, on)
    }

    pub fn left_outer_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_with(JoinKind::LeftOuter, table, on)
    }

    pub fn right_outer_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_with(JoinKind::RightOuter, table, on)
    }

    // ==================== Conditions ====================

    fn filter(&mut self, f: impl FnOnce(&mut WhereBuilder)) -> &mut Self {
        f(&mut self.where_builder);
        self
    }

    fn soft_delete_filter(&mut self, connector: Connector, deleted: bool) -> &mut Self {
        let table = self.table_name();
        let column = self.schemas.conventions(&table).soft_delete();
        self.where_builder.soft_delete(connector, column, deleted);
        self
    }

    /// `col = ?`
    pub fn and_eq(&mut self, col: &str, val: impl Into<Value>) -> &mut Self {
        self.filter(|w| w.compare(Connector::And, col, "=", val.into()))
    }

    /// `col <op> ?`, e.g. `and_cmp("age", ">=", 18)`.
    pub fn and_cmp(&mut self, col: &str, op: &str, val: impl Into<Value>) -> &mut Self {
        self.filter(|w| w.compare(Connector::And, col, op, val.into()))
    }

    pub fn and_in(&mut self, col: &str, values: impl Into<Value>) -> &mut Self {
        self.filter(|w| w.in_list(Connector::And, col, values.into(), false))
    }

    pub fn and_not_in(&mut self, col: &str, values: impl Into<Value>) -> &mut Self {
        self.filter(|w| w.in_list(Connector::And, col, values.into(), true))
    }

    pub fn and_between(
        &mut self,
        col: &str,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> &mut Self {
        self.filter(|w| w.between(Connector::And, col, lo.into(), hi.into(), false))
    }

    pub fn and_not_between(
        &mut self,
        col: &str,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> &mut Self {
        self.filter(|w| w.between(Connector::And, col, lo.into(), hi.into(), true))
    }

    /// `col LIKE ?`, wrapping the pattern in `%` when needed.
    pub fn and_like(&mut self, col: &str, pattern: &str) -> &mut Self {
        self.filter(|w| w.like(Connector::And, col, pattern, false))
    }

    pub fn and_not_like(&mut self, col: &str, pattern: &str) -> &mut Self {
        self.filter(|w| w.like(Connector::And, col, pattern, true))
    }

    pub fn and_regexp(&mut self, col: &str, pattern: &str) -> &mut Self {
        self.filter(|w| w.regexp(Connector::And, col, pattern, false))
    }

    pub fn and_not_regexp(&mut self, col: &str, pattern: &str) -> &mut Self {
        self.filter(|w| w.regexp(Connector::And, col, pattern, true))
    }

    pub fn and_is_null(&mut self, col: &str) -> &mut Self {
        self.filter(|w| w.null(Connector::And, col, false))
    }

    pub fn and_is_not_null(&mut self, col: &str) -> &mut Self {
        self.filter(|w| w.null(Connector::And, col, true))
    }

    /// `col` is NULL or the empty string.
    pub fn and_blank(&mut self, col: &str) -> &mut Self {
        self.filter(|w| w.blank(Connector::And, col, false))
    }

    pub fn and_not_blank(&mut self, col: &str) -> &mut Self {
        self.filter(|w| w.blank(Connector::And, col, true))
    }

    /// `DATE(col) <op> ?`
    pub fn and_date(&mut self, col: &str, op: &str, date: &str) -> &mut Self {
        self.filter(|w| w.date(Connector::And, col, op, date))
    }

    /// Whole days from `start` through `end`.
    pub fn and_date_between(&mut self, col: &str, start: &str, end: &str) -> &mut Self {
        self.filter(|w| w.date_between(Connector::And, col, start, end))
    }

    /// Filter on the table's soft-delete convention column; a no-op when the
    /// table has none.
    pub fn and_soft_deleted(&mut self, deleted: bool) -> &mut Self {
        self.soft_delete_filter(Connector::And, deleted)
    }

    pub fn and_raw(&mut self, sql: &str) -> &mut Self {
        self.filter(|w| w.raw(Connector::And, sql))
    }

    pub fn or_eq(&mut self, col: &str, val: impl Into<Value>) -> &mut Self {
        self.filter(|w| w.compare(Connector::Or, col, "=", val.into()))
    }

    pub fn or_cmp(&mut self, col: &str, op: &str, val: impl Into<Value>) -> &mut Self {
        self.filter(|w| w.compare(Connector::Or, col, op, val.into()))
    }

    pub fn or_in(&mut self, col: &str, values: impl Into<Value>) -> &mut Self {
        self.filter(|w| w.in_list(Connector::Or, col, values.into(), false))
    }

    pub fn or_not_in(&mut self, col: &str, values: impl Into<Value>) -> &mut Self {
        self.filter(|w| w.in_list(Connector::Or, col, values.into(), true))
    }

    pub fn or_between(
        &mut self,
        col: &str,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> &mut Self {
        self.filter(|w| w.between(Connector::Or, col, lo.into(), hi.into(), false))
    }

    pub fn or_not_between(
        &mut self,
        col: &str,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> &mut Self {
        self.filter(|w| w.between(Connector::Or, col, lo.into(), hi.into(), true))
    }

    pub fn or_like(&mut self, col: &str, pattern: &str) -> &mut Self {
        self.filter(|w| w.like(Connector::Or, col, pattern, false))
    }

    pub fn or_not_like(&mut self, col: &str, pattern: &str) -> &mut Self {
        self.filter(|w| w.like(Connector::Or, col, pattern, true))
    }

    pub fn or_regexp(&mut self, col: &str, pattern: &str) -> &mut Self {
        self.filter(|w| w.regexp(Connector::Or, col, pattern, false))
    }

    pub fn or_not_regexp(&mut self, col: &str, pattern: &str) -> &mut Self {
        self.filter(|w| w.regexp(Connector::Or, col, pattern, true))
    }

    pub fn or_is_null(&mut self, col: &str) -> &mut Self {
        self.filter(|w| w.null(Connector::Or, col, false))
    }

    pub fn or_is_not_null(&mut self, col: &str) -> &mut Self {
        self.filter(|w| w.null(Connector::Or, col, true))
    }

    pub fn or_blank(&mut self, col: &str) -> &mut Self {
        self.filter(|w| w.blank(Connector::Or, col, false))
    }

    pub fn or_not_blank(&mut self, col: &str) -> &mut Self {
        self.filter(|w| w.blank(Connector::Or, col, true))
    }

    pub fn or_date(&mut self, col: &str, op: &str, date: &str) -> &mut Self {
        self.filter(|w| w.date(Connector::Or, col, op, date))
    }

    pub fn or_date_between(&mut self, col: &str, start: &str, end: &str) -> &mut Self {
        self.filter(|w| w.date_between(Connector::Or, col, start, end))
    }

    pub fn or_soft_deleted(&mut self, deleted: bool) -> &mut Self {
        self.soft_delete_filter(Connector::Or, deleted)
    }

    pub fn or_raw(&mut self, sql: &str) -> &mut Self {
        self.filter(|w| w.raw(Connector::Or, sql))
    }

    // ==================== Ordering / grouping / paging ====================

    /// Append ORDER BY entries such as `"id desc, name"`. Entries without a
    /// valid direction are skipped.
    pub fn order_by(&mut self, entries: impl IntoNames) -> &mut Self {
        self.order_by
            .extend(entries.into_names().iter().filter_map(|e| order_entry(e)));
        self
    }

    pub fn group_by(&mut self, columns: impl IntoNames) -> &mut Self {
        self.group_by
            .extend(columns.into_names().iter().map(|c| quote(c)));
        self
    }

    /// `LIMIT count`; zero is ignored.
    pub fn limit(&mut self, count: u64) -> &mut Self {
        if count > 0 {
            self.limit = Some(Limit::Count(count));
        }
        self
    }

    /// `LIMIT offset, count`; a zero count is ignored.
    pub fn offset_limit(&mut self, offset: u64, count: u64) -> &mut Self {
        if count > 0 {
            self.limit = Some(Limit::Range { offset, count });
        }
        self
    }

    /// `"count"` or `"offset, count"`.
    pub fn limit_str(&mut self, spec: &str) -> &mut Self {
        if let Some(limit) = Limit::parse(spec) {
            self.limit = Some(limit);
        }
        self
    }

    /// 1-based page; page or size below 1, or an offset past `u64::MAX`,
    /// is ignored.
    pub fn page(&mut self, page: u64, size: u64) -> &mut Self {
        if page < 1 || size < 1 {
            return self;
        }
        match (page - 1).checked_mul(size) {
            Some(offset) => self.offset_limit(offset, size),
            None => self,
        }
    }

    // ==================== Per-call options ====================

    /// Deadline for the next terminal operation. Values under one second
    /// fall back to the five second default.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Restrict the next model write to these fields (by Rust field name).
    pub fn include_fields(&mut self, fields: impl IntoNames) -> &mut Self {
        self.include_fields = fields.into_names();
        self
    }

    /// Leave these fields out of the next model write.
    pub fn exclude_fields(&mut self, fields: impl IntoNames) -> &mut Self {
        self.exclude_fields = fields.into_names();
        self
    }

    // ==================== Synthesis ====================

    pub(crate) fn from_sql(&self) -> Option<String> {
        let table = self.tables.first()?;
        let mut sql = table.to_sql();
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        Some(sql)
    }

    pub(crate) fn push_where(&self, sql: &mut String) {
        if !self.where_builder.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_builder.build_clause());
        }
    }

    fn select_list(&self) -> String {
        if self.columns.is_empty() {
            return "*".to_string();
        }
        self.columns
            .iter()
            .map(ColumnRef::to_sql)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn build_select_limited(&self, limit: Option<Limit>) -> BuiltQuery {
        let Some(from) = self.from_sql() else {
            return BuiltQuery::default();
        };
        let mut sql = format!("SELECT {} FROM {from}", self.select_list());
        self.push_where(&mut sql);
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = limit {
            sql.push(' ');
            sql.push_str(&limit.to_sql());
        }
        BuiltQuery {
            sql,
            params: self.where_builder.params().to_vec(),
        }
    }

    /// `SELECT ... FROM ... [JOIN] [WHERE] [GROUP BY] [ORDER BY] [LIMIT]`
    pub fn build_select(&self) -> BuiltQuery {
        self.build_select_limited(self.limit)
    }

    /// `SELECT COUNT(<col|*>) FROM ... [WHERE]`
    pub fn build_count(&self, column: &str) -> BuiltQuery {
        let Some(from) = self.from_sql() else {
            return BuiltQuery::default();
        };
        let column = column.trim();
        let column = if column.is_empty() || column == "*" {
            "*".to_string()
        } else {
            quote(column)
        };
        let mut sql = format!("SELECT COUNT({column}) FROM {from}");
        self.push_where(&mut sql);
        BuiltQuery {
            sql,
            params: self.where_builder.params().to_vec(),
        }
    }

    /// `SELECT SUM(col) FROM ... [WHERE] LIMIT 1`
    pub fn build_sum(&self, column: &str) -> BuiltQuery {
        let Some(from) = self.from_sql() else {
            return BuiltQuery::default();
        };
        let mut sql = format!("SELECT SUM({}) FROM {from}", quote(column));
        self.push_where(&mut sql);
        sql.push_str(" LIMIT 1");
        BuiltQuery {
            sql,
            params: self.where_builder.params().to_vec(),
        }
    }

    /// SELECT text, for debugging.
    pub fn to_sql(&self) -> String {
        self.build_select().sql
    }
}
