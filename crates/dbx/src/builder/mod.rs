//! Fluent MySQL statement builder.
//!
//! A [`QueryBuilder`] accumulates clauses for one target table and renders
//! SELECT / COUNT / SUM / INSERT / UPDATE / DELETE text with `?`
//! placeholders. Terminal operations run the rendered statement through the
//! gateway against any [`Executor`](crate::Executor).
//!
//! ## Design
//!
//! - Invalid or empty input is ignored, never reported: a `None` value, an
//!   empty IN list or a bad ORDER BY direction simply adds nothing.
//! - OR conditions wrap only the condition immediately before them.
//! - Parameters always follow placeholder order (SET before WHERE).

pub mod delete;
pub mod insert;
pub(crate) mod model;
pub mod select;
pub mod table;
pub mod terminal;
pub mod update;
pub mod where_builder;

pub use select::{BuiltQuery, QueryBuilder};
pub use table::{ColumnRef, Join, JoinKind, Limit, Table};
pub use where_builder::{Connector, WhereBuilder};
