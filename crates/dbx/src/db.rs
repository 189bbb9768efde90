//! Database handle: an executor plus the schema cache builders resolve
//! conventions against.

use crate::builder::QueryBuilder;
use crate::client::{Begin, Executor};
use crate::error::{DbxError, DbxResult};
use crate::row::{ExecOutcome, ResultSet};
use crate::schema::SchemaCache;
use crate::transaction::TransactionOptions;
use crate::value::Value;
use std::future::Future;
use std::sync::Arc;

/// Entry point for building statements.
///
/// `Db` is itself an [`Executor`]: statements run against it go to the
/// wrapped executor, or fail with [`DbxError::Config`] when none is set.
///
/// ```ignore
/// let pool = MySqlPool::connect(&DataSourceConfig::from_env()?)?;
/// let mut db = Db::new(pool);
/// db.load_schemas().await?;
///
/// let n = db.table("users").and_eq("status", 0).count(&db).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Db<E> {
    executor: Option<E>,
    schemas: Arc<SchemaCache>,
}

impl<E> Db<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor: Some(executor),
            schemas: Arc::new(SchemaCache::new()),
        }
    }

    /// A handle with no executor; every statement reports a configuration
    /// error. Builders still work for synthesis.
    pub fn unconfigured() -> Self {
        Self {
            executor: None,
            schemas: Arc::new(SchemaCache::new()),
        }
    }

    /// Replace the schema cache, e.g. with one loaded elsewhere.
    pub fn with_schemas(mut self, schemas: SchemaCache) -> Self {
        self.schemas = Arc::new(schemas);
        self
    }

    pub fn schemas(&self) -> &Arc<SchemaCache> {
        &self.schemas
    }

    pub fn executor(&self) -> Option<&E> {
        self.executor.as_ref()
    }

    /// Start a builder for `table` ("users", "users u", "shop.users AS u").
    pub fn table(&self, table: &str) -> QueryBuilder {
        QueryBuilder::with_schemas(table, Arc::clone(&self.schemas))
    }

    fn require(&self) -> DbxResult<&E> {
        self.executor
            .as_ref()
            .ok_or_else(|| DbxError::config("no database executor configured"))
    }
}

impl<E: Executor> Db<E> {
    /// Introspect the database and install the result as this handle's
    /// schema cache. Builders created earlier keep the old snapshot.
    pub async fn load_schemas(&mut self) -> DbxResult<usize> {
        let cache = SchemaCache::load(&*self).await?;
        let tables = cache.len();
        self.schemas = Arc::new(cache);
        Ok(tables)
    }

    /// See [`is_field_value_exists`].
    pub async fn is_field_value_exists(
        &self,
        table: &str,
        column: &str,
        value: impl Into<Value>,
        exclude_id: Option<Value>,
    ) -> DbxResult<bool> {
        is_field_value_exists(self, table, column, value, exclude_id).await
    }
}

/// Whether any row of `table` has `column = value`, ignoring the row whose
/// `id` equals `exclude_id`. Typical use is a uniqueness check on edit.
pub async fn is_field_value_exists(
    conn: &impl Executor,
    table: &str,
    column: &str,
    value: impl Into<Value>,
    exclude_id: Option<Value>,
) -> DbxResult<bool> {
    let mut qb = QueryBuilder::new(table);
    if let Some(id) = exclude_id {
        qb.and_cmp("id", "<>", id);
    }
    qb.and_eq(column, value);
    qb.exists(conn).await
}

impl<E: Executor> Executor for Db<E> {
    fn fetch(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DbxResult<ResultSet>> + Send {
        async move { self.require()?.fetch(sql, params).await }
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DbxResult<ExecOutcome>> + Send {
        async move { self.require()?.execute(sql, params).await }
    }
}

impl<E: Begin> Begin for Db<E> {
    type Tx = E::Tx;

    fn begin_with(
        &self,
        options: TransactionOptions,
    ) -> impl Future<Output = DbxResult<Self::Tx>> + Send {
        async move { self.require()?.begin_with(options).await }
    }
}
