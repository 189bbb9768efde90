//! Naming conventions resolved against the schema cache.
//!
//! Recognized columns:
//! - soft delete flag (integer): `del_flag`, `delFlag`
//! - soft delete timestamp (datetime): `delete_at`, `deleteAt`
//! - create time (datetime): `ctime`, `create_at`, `createAt`, `create_time`, `createTime`
//! - update time (datetime): `update_at`, `updateAt`
//!
//! A missing table or column simply yields `None`.

use crate::ident::normalize;
use crate::record::FieldMeta;
use crate::schema::ColumnDescriptor;
use heck::ToLowerCamelCase;

const SOFT_DELETE_FLAGS: &[&str] = &["del_flag", "delFlag"];
const SOFT_DELETE_TIMES: &[&str] = &["delete_at", "deleteAt"];
const CREATE_TIMES: &[&str] = &["ctime", "create_at", "createAt", "create_time", "createTime"];
const UPDATE_TIMES: &[&str] = &["update_at", "updateAt"];

/// How a table marks rows as deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDeleteColumn<'a> {
    /// Integer flag: `1` deleted, `0` live.
    Flag(&'a str),
    /// Datetime: non-null deleted, null live.
    Timestamp(&'a str),
}

/// Convention lookups over one table's columns.
#[derive(Debug, Clone, Copy)]
pub struct Conventions<'a> {
    columns: &'a [ColumnDescriptor],
}

impl<'a> Conventions<'a> {
    pub fn new(columns: &'a [ColumnDescriptor]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &'a [ColumnDescriptor] {
        self.columns
    }

    fn find(
        &self,
        names: &[&str],
        predicate: impl Fn(&ColumnDescriptor) -> bool,
    ) -> Option<&'a ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| names.contains(&c.name.as_str()) && predicate(c))
    }

    /// Integer flag first, then datetime marker.
    pub fn soft_delete(&self) -> Option<SoftDeleteColumn<'a>> {
        if let Some(c) = self.find(SOFT_DELETE_FLAGS, ColumnDescriptor::is_integer) {
            return Some(SoftDeleteColumn::Flag(&c.name));
        }
        self.find(SOFT_DELETE_TIMES, ColumnDescriptor::is_datetime)
            .map(|c| SoftDeleteColumn::Timestamp(&c.name))
    }

    pub fn create_time(&self) -> Option<&'a str> {
        self.find(CREATE_TIMES, ColumnDescriptor::is_datetime)
            .map(|c| c.name.as_str())
    }

    pub fn update_time(&self) -> Option<&'a str> {
        self.find(UPDATE_TIMES, ColumnDescriptor::is_datetime)
            .map(|c| c.name.as_str())
    }

    pub fn primary_key(&self) -> Option<&'a str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&'a ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column name for a record field: annotation, then a separator-insensitive
    /// schema match, then the lower-camel form of the field name.
    pub fn column_for_field(&self, field: &FieldMeta) -> String {
        if let Some(column) = field.column {
            return column.to_string();
        }
        let wanted = normalize(field.name);
        self.columns
            .iter()
            .find(|c| normalize(&c.name) == wanted)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| field.name.to_lower_camel_case())
    }

    /// A field is the key if annotated so, or if its column is the schema key.
    pub fn is_primary_key(&self, field: &FieldMeta, column: &str) -> bool {
        field.primary_key || self.column(column).is_some_and(|c| c.primary_key)
    }
}
