//! Hand-written SQL with positional `?` parameters.

use crate::client::Executor;
use crate::decode::{decode_maps, decode_records};
use crate::error::DbxResult;
use crate::gateway::{self, effective_timeout};
use crate::record::Record;
use crate::row::RowMap;
use crate::value::Value;
use std::time::Duration;

/// A raw statement run through the same deadline, logging and error policy
/// as the builder.
///
/// # Example
///
/// ```ignore
/// use dbx::query;
///
/// let rows = query("SELECT id, name FROM users WHERE status = ? AND age > ?")
///     .bind(1)
///     .bind(18)
///     .fetch(&pool)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    sql: String,
    params: Vec<Value>,
    timeout: Option<Duration>,
}

/// Create a new query with the given SQL
pub fn query(sql: impl Into<String>) -> Query {
    Query {
        sql: sql.into(),
        params: Vec::new(),
        timeout: None,
    }
}

impl Query {
    /// Bind the next positional parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Deadline for this statement (values under one second use the default).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    fn deadline(&self) -> Duration {
        effective_timeout(self.timeout)
    }

    /// All rows as column maps.
    pub async fn fetch(&self, conn: &impl Executor) -> DbxResult<Vec<RowMap>> {
        gateway::fetch(conn, &self.sql, &self.params, self.deadline(), |rs| {
            decode_maps(&rs)
        })
        .await
    }

    /// All rows decoded into `R`.
    pub async fn fetch_as<R: Record>(&self, conn: &impl Executor) -> DbxResult<Vec<R>> {
        gateway::fetch(conn, &self.sql, &self.params, self.deadline(), |rs| {
            decode_records::<R>(&rs)
        })
        .await
    }

    /// First row, if any. The SQL is not rewritten; add `LIMIT 1` yourself
    /// for large result sets.
    pub async fn fetch_one(&self, conn: &impl Executor) -> DbxResult<Option<RowMap>> {
        Ok(self.fetch(conn).await?.into_iter().next())
    }

    /// Run an INSERT and return the generated id (0 when none).
    pub async fn insert(&self, conn: &impl Executor) -> DbxResult<u64> {
        let outcome = gateway::execute(conn, &self.sql, &self.params, self.deadline()).await?;
        Ok(outcome.last_insert_id.unwrap_or(0))
    }

    /// Run an UPDATE / DELETE and return the affected row count.
    pub async fn execute(&self, conn: &impl Executor) -> DbxResult<u64> {
        let outcome = gateway::execute(conn, &self.sql, &self.params, self.deadline()).await?;
        Ok(outcome.rows_affected)
    }

    /// Run a statement for its side effects only.
    pub async fn run(&self, conn: &impl Executor) -> DbxResult<()> {
        gateway::execute(conn, &self.sql, &self.params, self.deadline()).await?;
        Ok(())
    }
}
