//! Typed records.
//!
//! A [`Record`] exposes a static field-metadata table plus a getter/setter
//! pair keyed by field name. `#[derive(Record)]` generates all three; the
//! decoder and the model write paths only ever go through this table.
//!
//! ```ignore
//! use dbx::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[orm(id)]
//!     id: i64,
//!     #[orm(column = "user_name")]
//!     name: String,
//!     created_at: Option<chrono::NaiveDateTime>,
//! }
//! ```

use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Declared kind of a record field, selecting the decode rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Bool,
    Int,
    Float,
    Time,
}

/// Static metadata for one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Rust field name.
    pub name: &'static str,
    /// Explicit column name from `#[orm(column = "...")]`.
    pub column: Option<&'static str>,
    /// Set by `#[orm(id)]`.
    pub primary_key: bool,
    pub kind: FieldKind,
    /// `true` for `Option<T>` fields.
    pub nullable: bool,
}

impl FieldMeta {
    pub const fn new(
        name: &'static str,
        column: Option<&'static str>,
        primary_key: bool,
        kind: FieldKind,
        nullable: bool,
    ) -> Self {
        Self {
            name,
            column,
            primary_key,
            kind,
            nullable,
        }
    }
}

/// A field value moving between a record and the database layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Str(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Time(NaiveDateTime),
}

impl FieldValue {
    /// Convert to a bind value. Times are handled separately by the model
    /// write path, which needs the column type to pick a format.
    pub(crate) fn into_value(self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Str(s) => Value::Str(s),
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Int(v) => Value::Int(v),
            FieldValue::UInt(v) => Value::UInt(v),
            FieldValue::Float(v) => Value::Float(v),
            FieldValue::Time(t) => Value::from(t),
        }
    }
}

/// Record types with generated field metadata.
pub trait Record: Default + Send + Sync {
    fn fields() -> &'static [FieldMeta];

    /// Read a field by Rust name.
    fn get(&self, field: &str) -> Option<FieldValue>;

    /// Write a field by Rust name; returns `false` if the field is unknown or
    /// the value does not fit its type.
    fn set(&mut self, field: &str, value: FieldValue) -> bool;

    /// The field marked as primary key, if any.
    fn primary_key_field() -> Option<&'static FieldMeta> {
        Self::fields().iter().find(|f| f.primary_key)
    }
}

/// Rust types usable as record fields.
pub trait FieldType: Sized {
    const KIND: FieldKind;
    const NULLABLE: bool = false;

    fn to_field_value(&self) -> FieldValue;

    fn from_field_value(value: FieldValue) -> Option<Self>;
}

macro_rules! signed_field {
    ($($t:ty),*) => {$(
        impl FieldType for $t {
            const KIND: FieldKind = FieldKind::Int;

            fn to_field_value(&self) -> FieldValue {
                FieldValue::Int(i64::from(*self))
            }

            fn from_field_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::Int(v) => <$t>::try_from(v).ok(),
                    FieldValue::UInt(v) => <$t>::try_from(v).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($t:ty),*) => {$(
        impl FieldType for $t {
            const KIND: FieldKind = FieldKind::Int;

            fn to_field_value(&self) -> FieldValue {
                FieldValue::UInt(u64::from(*self))
            }

            fn from_field_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::Int(v) => <$t>::try_from(v).ok(),
                    FieldValue::UInt(v) => <$t>::try_from(v).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

signed_field!(i8, i16, i32, i64);
unsigned_field!(u8, u16, u32, u64);

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Str;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Str(self.clone())
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(b) => Some(b),
            FieldValue::Int(v) => Some(v == 1),
            _ => None,
        }
    }
}

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(v) => Some(v),
            FieldValue::Int(v) => Some(v as f64),
            _ => None,
        }
    }
}

impl FieldType for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(f64::from(*self))
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        f64::from_field_value(value).map(|v| v as f32)
    }
}

impl FieldType for NaiveDateTime {
    const KIND: FieldKind = FieldKind::Time;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Time(*self)
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Time(t) => Some(t),
            _ => None,
        }
    }
}

impl FieldType for NaiveDate {
    const KIND: FieldKind = FieldKind::Time;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Time(self.and_time(NaiveTime::MIN))
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        NaiveDateTime::from_field_value(value).map(|t| t.date())
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(v) => v.to_field_value(),
            None => FieldValue::Null,
        }
    }

    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_out_of_range_is_rejected() {
        assert_eq!(i8::from_field_value(FieldValue::Int(300)), None);
        assert_eq!(u32::from_field_value(FieldValue::Int(-1)), None);
        assert_eq!(u32::from_field_value(FieldValue::UInt(7)), Some(7));
    }

    #[test]
    fn option_fields_accept_null() {
        assert_eq!(
            Option::<i64>::from_field_value(FieldValue::Null),
            Some(None)
        );
        assert_eq!(
            Option::<i64>::from_field_value(FieldValue::Int(5)),
            Some(Some(5))
        );
        assert!(<Option<String> as FieldType>::NULLABLE);
        assert_eq!(<Option<String> as FieldType>::KIND, FieldKind::Str);
    }

    #[test]
    fn dates_round_trip_through_time() {
        let d = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(NaiveDate::from_field_value(d.to_field_value()), Some(d));
    }

    #[test]
    fn time_field_value_binds_as_text() {
        let t = NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(
            FieldValue::Time(t).into_value(),
            Value::Str("2023-01-02 03:04:05".into())
        );
    }
}
