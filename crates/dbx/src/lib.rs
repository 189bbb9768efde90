//! # dbx
//!
//! A fluent MySQL statement builder with a small typed-record layer.
//!
//! ## Features
//!
//! - **Fluent builder**: chain filters, joins, ordering and paging; invalid
//!   or empty input is ignored rather than reported
//! - **Schema conventions**: soft delete, create/update timestamps and
//!   primary keys are resolved from a schema cache loaded once at startup
//! - **Two result shapes**: ordered column maps or `#[derive(Record)]` structs
//! - **Bounded execution**: every statement runs under a deadline
//!   (5 s default, 1 s minimum)
//! - **Transaction-friendly**: every terminal operation accepts a pool or a
//!   transaction
//!
//! ## Example
//!
//! ```ignore
//! use dbx::{ColumnValues, DataSourceConfig, Db, MySqlPool, Record};
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[orm(id)]
//!     id: u64,
//!     name: String,
//!     created_at: Option<chrono::NaiveDateTime>,
//! }
//!
//! let pool = MySqlPool::connect(&DataSourceConfig::from_env()?)?;
//! let mut db = Db::new(pool);
//! db.load_schemas().await?;
//!
//! // SELECT
//! let users: Vec<User> = db
//!     .table("users")
//!     .and_like("name", "ali")
//!     .and_soft_deleted(false)
//!     .order_by("id desc")
//!     .page(1, 20)
//!     .get_as(&db)
//!     .await?;
//!
//! // INSERT (create-time column filled in automatically)
//! let id = db
//!     .table("users")
//!     .insert(&db, &ColumnValues::new().set("name", "alice"))
//!     .await?;
//!
//! // UPDATE / soft delete
//! db.table("users").and_eq("id", id).increment(&db, "visits", 1).await?;
//! db.table("users").and_eq("id", id).soft_delete(&db).await?;
//! ```

extern crate self as dbx;

pub mod builder;
pub mod client;
pub mod config;
pub mod convention;
pub mod db;
pub mod decode;
pub mod error;
pub mod gateway;
pub mod ident;
pub mod logging;
pub mod query;
pub mod record;
pub mod row;
pub mod schema;
pub mod transaction;
pub mod value;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use builder::{BuiltQuery, JoinKind, QueryBuilder};
pub use client::{Begin, Executor, Transaction};
pub use config::DataSourceConfig;
pub use convention::{Conventions, SoftDeleteColumn};
pub use db::{Db, is_field_value_exists};
pub use decode::{decode_maps, decode_records};
pub use error::{DbxError, DbxResult};
pub use gateway::{DEFAULT_TIMEOUT, MIN_TIMEOUT};
pub use logging::{debug_mode, set_debug_mode};
pub use query::{Query, query};
pub use record::{FieldKind, FieldMeta, FieldType, FieldValue, Record};
pub use row::{Cell, Column, ExecOutcome, ResultSet, RowMap, ScanType};
pub use schema::{ColumnDescriptor, SchemaCache};
pub use transaction::{IsolationLevel, TransactionOptions, transaction, transaction_with};
pub use value::{ColumnValues, IntoNames, Value, raw};

#[cfg(feature = "mysql")]
pub use mysql::{MySqlPool, MySqlTransaction};

#[cfg(feature = "derive")]
pub use dbx_derive::Record;
