//! Transaction helpers.
//!
//! Builder terminal operations accept any [`Executor`](crate::Executor), so
//! passing a transaction instead of the pool is all it takes to run them in
//! one. For commit/rollback handling use the [`transaction!`] macro or the
//! [`transaction`] function.
//!
//! # Example
//!
//! ```ignore
//! use dbx::{ColumnValues, DbxResult};
//!
//! # async fn demo(db: &dbx::Db<dbx::MySqlPool>) -> DbxResult<()> {
//! dbx::transaction!(db, tx, {
//!     db.table("accounts").and_eq("id", 1).decrement(&tx, "balance", 100).await?;
//!     db.table("accounts").and_eq("id", 2).increment(&tx, "balance", 100).await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

use crate::client::{Begin, Transaction};
use crate::error::{DbxError, DbxResult};
use futures_core::future::BoxFuture;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Options applied when a transaction starts. Unset options keep the
/// server's session defaults.
///
/// ```
/// use dbx::{IsolationLevel, TransactionOptions};
///
/// let opts = TransactionOptions::new()
///     .isolation_level(IsolationLevel::ReadCommitted)
///     .read_only(true);
/// assert_eq!(opts.read_only, Some(true));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub isolation_level: Option<IsolationLevel>,
    pub read_only: Option<bool>,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }
}

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via [`Begin::begin`](crate::Begin::begin).
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `dbx::DbxResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($source:expr, $tx:ident, $body:block) => {
        $crate::transaction_with!($source, $tx, $crate::TransactionOptions::default(), $body)
    };
}

/// [`transaction!`] with [`TransactionOptions`].
///
/// ```ignore
/// let opts = TransactionOptions::new().isolation_level(IsolationLevel::Serializable);
/// dbx::transaction_with!(&pool, tx, opts, {
///     db.table("stock").and_eq("sku", "A-1").decrement(&tx, "qty", 1).await?;
///     Ok(())
/// })?;
/// ```
#[macro_export]
macro_rules! transaction_with {
    ($source:expr, $tx:ident, $opts:expr, $body:block) => {{
        let $tx = $crate::Begin::begin_with($source, $opts).await?;

        let __dbx_tx_body_result = async { $body }.await;
        match __dbx_tx_body_result {
            Ok(value) => {
                $crate::Transaction::commit($tx).await?;
                Ok(value)
            }
            Err(error) => match $crate::Transaction::rollback($tx).await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::transaction::rollback_failed(error, rollback_err)),
            },
        }
    }};
}

/// Log a failed rollback and fold it into the original error.
#[doc(hidden)]
pub fn rollback_failed(error: DbxError, rollback_err: DbxError) -> DbxError {
    tracing::error!(target: "dbx", error = %rollback_err, "rollback failed");
    DbxError::statement(format!("{error} (rollback failed: {rollback_err})"))
}

/// Run `f` inside a transaction: commit if it succeeds, roll back on the
/// first error. A failed commit is returned as is.
///
/// ```ignore
/// let mut orders = db.table("orders");
/// let data = ColumnValues::new().set("sku", "A-1").set("qty", 2);
/// let id = dbx::transaction(&pool, move |tx| Box::pin(async move {
///     orders.insert(tx, &data).await
/// }))
/// .await?;
/// ```
pub async fn transaction<S, T, F>(source: &S, f: F) -> DbxResult<T>
where
    S: Begin,
    F: for<'t> FnOnce(&'t S::Tx) -> BoxFuture<'t, DbxResult<T>>,
{
    transaction_with(source, TransactionOptions::default(), f).await
}

/// [`transaction`] with [`TransactionOptions`].
pub async fn transaction_with<S, T, F>(
    source: &S,
    options: TransactionOptions,
    f: F,
) -> DbxResult<T>
where
    S: Begin,
    F: for<'t> FnOnce(&'t S::Tx) -> BoxFuture<'t, DbxResult<T>>,
{
    let tx = source.begin_with(options).await?;
    let result = f(&tx).await;
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => match tx.rollback().await {
            Ok(()) => Err(error),
            Err(rollback_err) => Err(rollback_failed(error, rollback_err)),
        },
    }
}
