//! Executor capability traits.
//!
//! Builders and raw-SQL helpers accept anything implementing [`Executor`], so
//! the same call works against a pool or inside a transaction:
//!
//! ```ignore
//! let rows = db.table("users").and_eq("status", 1).get(&pool).await?;
//!
//! let tx = pool.begin().await?;
//! db.table("users").and_eq("id", 7).update(&tx, data).await?;
//! tx.commit().await?;
//! ```

use crate::error::DbxResult;
use crate::row::{ExecOutcome, ResultSet};
use crate::transaction::TransactionOptions;
use crate::value::Value;
use std::future::Future;

/// Something that can run a statement: a pool, a connection or a transaction.
///
/// Implementations should map driver failures to
/// [`DbxError::Statement`](crate::DbxError::Statement). Deadlines, logging and
/// error reporting are applied by the caller, not by the executor.
pub trait Executor: Send + Sync {
    /// Run a statement that returns rows.
    fn fetch(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DbxResult<ResultSet>> + Send;

    /// Run a statement that returns an affected-row count / last insert id.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DbxResult<ExecOutcome>> + Send;
}

/// An executor that can open transactions.
pub trait Begin: Executor {
    type Tx: Transaction;

    /// Start a transaction with the given isolation level / access mode.
    fn begin_with(
        &self,
        options: TransactionOptions,
    ) -> impl Future<Output = DbxResult<Self::Tx>> + Send;

    /// Start a transaction with the server's defaults.
    fn begin(&self) -> impl Future<Output = DbxResult<Self::Tx>> + Send {
        self.begin_with(TransactionOptions::default())
    }
}

/// An open transaction. Dropping it without committing rolls back.
pub trait Transaction: Executor + Sized {
    fn commit(self) -> impl Future<Output = DbxResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = DbxResult<()>> + Send;
}

impl<E: Executor> Executor for &E {
    fn fetch(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DbxResult<ResultSet>> + Send {
        (**self).fetch(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DbxResult<ExecOutcome>> + Send {
        (**self).execute(sql, params)
    }
}
