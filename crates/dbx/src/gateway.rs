//! Statement execution under a deadline.
//!
//! Every statement issued by the builder or the raw-SQL helpers goes through
//! [`fetch`] or [`execute`]: log (when debug mode is on), run with
//! `tokio::time::timeout`, log and return any failure. Elapsed deadlines are
//! reported as [`DbxError::Timeout`] and the in-flight call is dropped.

use crate::client::Executor;
use crate::error::{DbxError, DbxResult};
use crate::logging::{log_failure, log_statement};
use crate::row::{ExecOutcome, ResultSet};
use crate::value::Value;
use std::future::Future;
use std::time::Duration;

/// Deadline used when no override is set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Overrides shorter than this fall back to [`DEFAULT_TIMEOUT`].
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Resolve a per-call override into the deadline actually applied.
pub fn effective_timeout(requested: Option<Duration>) -> Duration {
    match requested {
        Some(t) if t >= MIN_TIMEOUT => t,
        _ => DEFAULT_TIMEOUT,
    }
}

async fn run<T>(
    sql: &str,
    params: &[Value],
    timeout: Duration,
    fut: impl Future<Output = DbxResult<T>>,
) -> DbxResult<T> {
    if sql.trim().is_empty() {
        let err = DbxError::statement("empty statement: no table specified");
        log_failure(sql, &err);
        return Err(err);
    }

    log_statement(sql, params);

    let result = match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(DbxError::Timeout(timeout)),
    };

    if let Err(err) = &result {
        log_failure(sql, err);
    }
    result
}

/// Run a read statement and decode the rows, both within one deadline.
pub async fn fetch<E, T, F>(
    conn: &E,
    sql: &str,
    params: &[Value],
    timeout: Duration,
    decode: F,
) -> DbxResult<T>
where
    E: Executor,
    F: FnOnce(ResultSet) -> DbxResult<T> + Send,
{
    run(sql, params, timeout, async move {
        let rs = conn.fetch(sql, params).await?;
        decode(rs)
    })
    .await
}

/// Run a write statement.
pub async fn execute<E: Executor>(
    conn: &E,
    sql: &str,
    params: &[Value],
    timeout: Duration,
) -> DbxResult<ExecOutcome> {
    run(sql, params, timeout, conn.execute(sql, params)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_floor_and_default() {
        assert_eq!(effective_timeout(None), DEFAULT_TIMEOUT);
        assert_eq!(effective_timeout(Some(Duration::from_millis(500))), DEFAULT_TIMEOUT);
        assert_eq!(
            effective_timeout(Some(Duration::from_secs(30))),
            Duration::from_secs(30)
        );
        assert_eq!(effective_timeout(Some(MIN_TIMEOUT)), MIN_TIMEOUT);
    }
}
