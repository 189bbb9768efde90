//! Record-to-column mapping for model writes.

use super::select::QueryBuilder;
use crate::convention::Conventions;
use crate::record::{FieldKind, FieldMeta, FieldValue, Record};
use crate::schema::ColumnDescriptor;
use crate::value::{ColumnValues, DATE_FORMAT, DATETIME_FORMAT, Value};

/// The record's primary key, held apart from the column data.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PrimaryKey {
    pub column: String,
    pub field: &'static str,
    pub value: Value,
}

impl PrimaryKey {
    /// Null, zero and empty keys are left for the database to assign.
    pub fn is_unset(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::Int(v) => *v == 0,
            Value::UInt(v) => *v == 0,
            Value::Str(s) => s.is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ModelValues {
    pub data: ColumnValues,
    pub primary_key: Option<PrimaryKey>,
}

/// Bind value for a time field, or `None` to leave the column out.
///
/// The column must exist and be temporal. `date` columns get date-only
/// text; `NULL` is written only into nullable columns.
fn time_value(column: Option<&ColumnDescriptor>, value: FieldValue) -> Option<Value> {
    let column = column.filter(|c| c.is_temporal())?;
    match value {
        FieldValue::Null => column.nullable.then_some(Value::Null),
        FieldValue::Time(t) if column.data_type == "date" => {
            Some(Value::Str(t.format(DATE_FORMAT).to_string()))
        }
        FieldValue::Time(t) => Some(Value::Str(t.format(DATETIME_FORMAT).to_string())),
        _ => None,
    }
}

fn is_stamp(conventions: &Conventions<'_>, column: &str) -> bool {
    conventions.create_time() == Some(column) || conventions.update_time() == Some(column)
}

impl QueryBuilder {
    fn field_selected(&self, field: &FieldMeta) -> bool {
        let matches = |names: &[String]| names.iter().any(|n| n == field.name);
        if !self.include_fields.is_empty() && !matches(&self.include_fields) {
            return false;
        }
        !matches(&self.exclude_fields)
    }

    /// Map a record onto column values.
    ///
    /// The first field recognized as the primary key is returned separately,
    /// whatever the include/exclude lists say; other filtered-out fields are
    /// ignored.
    pub(crate) fn model_values<R: Record>(&self, record: &R) -> ModelValues {
        let table = self.table_name();
        let conventions: Conventions<'_> = self.schemas.conventions(&table);
        let mut out = ModelValues::default();

        for field in R::fields() {
            let Some(value) = record.get(field.name) else {
                continue;
            };
            let column = conventions.column_for_field(field);

            if out.primary_key.is_none() && conventions.is_primary_key(field, &column) {
                out.primary_key = Some(PrimaryKey {
                    column,
                    field: field.name,
                    value: value.into_value(),
                });
                continue;
            }
            if !self.field_selected(field) {
                continue;
            }

            let value = match field.kind {
                // unset timestamps are filled in by the statement builder
                FieldKind::Time if value == FieldValue::Null && is_stamp(&conventions, &column) => {
                    continue;
                }
                FieldKind::Time => match time_value(conventions.column(&column), value) {
                    Some(v) => v,
                    None => continue,
                },
                _ => value.into_value(),
            };
            out.data.insert(column, value);
        }

        out
    }

    pub(crate) fn reset_field_filters(&mut self) {
        self.include_fields.clear();
        self.exclude_fields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldType;
    use crate::schema::SchemaCache;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Post {
        id: i64,
        title: String,
        published_on: Option<chrono::NaiveDateTime>,
        edited_at: Option<chrono::NaiveDateTime>,
    }

    const POST_FIELDS: &[FieldMeta] = &[
        FieldMeta::new("id", None, false, FieldKind::Int, false),
        FieldMeta::new("title", None, false, FieldKind::Str, false),
        FieldMeta::new("published_on", None, false, FieldKind::Time, true),
        FieldMeta::new("edited_at", None, false, FieldKind::Time, true),
    ];

    impl Record for Post {
        fn fields() -> &'static [FieldMeta] {
            POST_FIELDS
        }

        fn get(&self, field: &str) -> Option<FieldValue> {
            match field {
                "id" => Some(self.id.to_field_value()),
                "title" => Some(self.title.to_field_value()),
                "published_on" => Some(self.published_on.to_field_value()),
                "edited_at" => Some(self.edited_at.to_field_value()),
                _ => None,
            }
        }

        fn set(&mut self, field: &str, value: FieldValue) -> bool {
            match field {
                "id" => i64::from_field_value(value).map(|v| self.id = v).is_some(),
                _ => false,
            }
        }
    }

    fn builder() -> QueryBuilder {
        let schemas = SchemaCache::new().with_table(
            "posts",
            vec![
                ColumnDescriptor::new("id", "int(11)").primary_key(),
                ColumnDescriptor::new("title", "varchar(64)"),
                ColumnDescriptor::new("published_on", "date").nullable(true),
                ColumnDescriptor::new("edited_at", "datetime"),
            ],
        );
        QueryBuilder::with_schemas("posts", Arc::new(schemas))
    }

    #[test]
    fn key_is_split_from_data() {
        let post = Post {
            id: 3,
            title: "hi".into(),
            ..Default::default()
        };
        let values = builder().model_values(&post);
        let pk = values.primary_key.unwrap();
        assert_eq!(pk.column, "id");
        assert_eq!(pk.value, Value::Int(3));
        assert!(!pk.is_unset());
        assert!(!values.data.contains("id"));
        assert_eq!(values.data.get("title"), Some(&Value::Str("hi".into())));
    }

    #[test]
    fn time_fields_follow_column_type() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let post = Post {
            published_on: Some(at),
            edited_at: None,
            ..Default::default()
        };
        let values = builder().model_values(&post);
        assert_eq!(
            values.data.get("published_on"),
            Some(&Value::Str("2024-03-01".into()))
        );
        // NULL into a NOT NULL column is left out
        assert!(!values.data.contains("edited_at"));

        let post = Post::default();
        let values = builder().model_values(&post);
        assert_eq!(values.data.get("published_on"), Some(&Value::Null));
    }

    #[test]
    fn time_fields_need_schema() {
        let post = Post {
            title: "x".into(),
            ..Default::default()
        };
        let values = QueryBuilder::new("posts").model_values(&post);
        assert!(!values.data.contains("publishedOn"));
        assert!(values.primary_key.is_none());
        assert!(values.data.contains("id"));
    }

    #[test]
    fn include_and_exclude_by_field_name() {
        let mut qb = builder();
        qb.include_fields("title");
        let values = qb.model_values(&Post::default());
        assert_eq!(values.data.len(), 1);
        assert!(values.primary_key.is_some());

        qb.reset_field_filters();
        qb.exclude_fields(vec!["title"]);
        let values = qb.model_values(&Post::default());
        assert!(!values.data.contains("title"));
        assert!(values.data.contains("published_on"));
    }
}
