//! Condition list shared by SELECT, UPDATE and DELETE.
//!
//! Conditions are kept as a flat list of rendered fragments joined with
//! `AND`. An OR-append folds the new fragment into the *immediately
//! preceding* one as `(prev OR new)`; OR never reaches further left.
//! Parameters are appended in the same order as their placeholders appear.

use crate::convention::SoftDeleteColumn;
use crate::decode::parse_datetime;
use crate::ident::quote;
use crate::value::{DATE_FORMAT, Value};

/// How a new condition joins the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereBuilder {
    conditions: Vec<String>,
    params: Vec<Value>,
}

fn bindable(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::List(_))
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Conditions joined with `AND` (without the `WHERE` keyword).
    pub fn build_clause(&self) -> String {
        self.conditions.join(" AND ")
    }

    fn push(&mut self, connector: Connector, fragment: String, params: Vec<Value>) {
        match (connector, self.conditions.pop()) {
            (Connector::Or, Some(prev)) => self.conditions.push(format!("({prev} OR {fragment})")),
            (_, prev) => {
                self.conditions.extend(prev);
                self.conditions.push(fragment);
            }
        }
        self.params.extend(params);
    }

    /// `col <op> ?`; a raw value is inlined. Null values and empty operators
    /// are skipped.
    pub fn compare(&mut self, connector: Connector, col: &str, op: &str, value: Value) {
        let op = op.trim();
        if op.is_empty() || value.is_null() {
            return;
        }
        match value {
            Value::Raw(expr) => self.push(connector, format!("{} {op} {expr}", quote(col)), vec![]),
            Value::List(_) => {}
            value => self.push(connector, format!("{} {op} ?", quote(col)), vec![value]),
        }
    }

    /// `col [NOT] IN (?, ...)`. Null, empty-string, raw and nested list
    /// elements are dropped; nothing is emitted if none remain.
    pub fn in_list(&mut self, connector: Connector, col: &str, values: Value, negate: bool) {
        let values: Vec<Value> = match values {
            Value::List(items) => items,
            single => vec![single],
        }
        .into_iter()
        .filter(|v| bindable(v) && !v.is_raw() && v.as_str() != Some(""))
        .collect();

        if values.is_empty() {
            return;
        }

        let op = if negate { "NOT IN" } else { "IN" };
        let placeholders = vec!["?"; values.len()].join(", ");
        self.push(
            connector,
            format!("{} {op} ({placeholders})", quote(col)),
            values,
        );
    }

    pub fn between(&mut self, connector: Connector, col: &str, lo: Value, hi: Value, negate: bool) {
        if !bindable(&lo) || !bindable(&hi) || lo.is_raw() || hi.is_raw() {
            return;
        }
        let op = if negate { "NOT BETWEEN" } else { "BETWEEN" };
        self.push(connector, format!("{} {op} ? AND ?", quote(col)), vec![lo, hi]);
    }

    /// `col [NOT] LIKE ?` with the pattern wrapped in `%` on both sides.
    pub fn like(&mut self, connector: Connector, col: &str, pattern: &str, negate: bool) {
        if pattern.is_empty() {
            return;
        }
        let mut pattern = pattern.to_string();
        if !pattern.starts_with('%') {
            pattern.insert(0, '%');
        }
        if !pattern.ends_with('%') || pattern == "%" {
            pattern.push('%');
        }
        let op = if negate { "NOT LIKE" } else { "LIKE" };
        self.push(connector, format!("{} {op} ?", quote(col)), vec![Value::Str(pattern)]);
    }

    pub fn regexp(&mut self, connector: Connector, col: &str, pattern: &str, negate: bool) {
        if pattern.is_empty() {
            return;
        }
        let op = if negate { "NOT REGEXP" } else { "REGEXP" };
        self.push(
            connector,
            format!("{} {op} ?", quote(col)),
            vec![Value::Str(pattern.to_string())],
        );
    }

    pub fn null(&mut self, connector: Connector, col: &str, negate: bool) {
        let op = if negate { "IS NOT NULL" } else { "IS NULL" };
        self.push(connector, format!("{} {op}", quote(col)), vec![]);
    }

    /// NULL-or-empty-string test.
    pub fn blank(&mut self, connector: Connector, col: &str, negate: bool) {
        let col = quote(col);
        let fragment = if negate {
            format!("({col} IS NOT NULL AND {col} <> '')")
        } else {
            format!("({col} IS NULL OR {col} = '')")
        };
        self.push(connector, fragment, vec![]);
    }

    /// `DATE(col) <op> ?`
    pub fn date(&mut self, connector: Connector, col: &str, op: &str, date: &str) {
        let (op, date) = (op.trim(), date.trim());
        if op.is_empty() || date.is_empty() {
            return;
        }
        self.push(
            connector,
            format!("DATE({}) {op} ?", quote(col)),
            vec![Value::Str(date.to_string())],
        );
    }

    /// Inclusive day range: `col BETWEEN 'start 00:00:00' AND 'end 23:59:59'`.
    ///
    /// Accepts `/` or `-` separators and either date-only or full datetime
    /// text; unparsable bounds skip the condition.
    pub fn date_between(&mut self, connector: Connector, col: &str, start: &str, end: &str) {
        let parse = |s: &str| parse_datetime(&s.trim().replace('/', "-")).map(|t| t.date());
        let (Some(start), Some(end)) = (parse(start), parse(end)) else {
            return;
        };
        let lo = format!("{} 00:00:00", start.format(DATE_FORMAT));
        let hi = format!("{} 23:59:59", end.format(DATE_FORMAT));
        self.between(connector, col, Value::Str(lo), Value::Str(hi), false);
    }

    /// Soft-delete filter for an already resolved convention column.
    pub fn soft_delete(
        &mut self,
        connector: Connector,
        column: Option<SoftDeleteColumn<'_>>,
        deleted: bool,
    ) {
        match column {
            Some(SoftDeleteColumn::Flag(col)) => {
                self.compare(connector, col, "=", Value::Int(i64::from(deleted)));
            }
            Some(SoftDeleteColumn::Timestamp(col)) => self.null(connector, col, deleted),
            None => {}
        }
    }

    /// Raw SQL fragment, appended verbatim.
    pub fn raw(&mut self, connector: Connector, sql: &str) {
        let sql = sql.trim();
        if sql.is_empty() {
            return;
        }
        self.push(connector, sql.to_string(), vec![]);
    }
}
