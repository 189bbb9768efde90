//! Row decoding.
//!
//! Each result column gets a [`ScanTarget`] derived from the scan type the
//! driver reports. Cells are scanned into that target and then either
//! rendered into a [`RowMap`] or written into a [`Record`] through its field
//! metadata.
//!
//! Map rendering rules:
//! - nullable columns decode SQL `NULL` to a zero value (`""`, `false`, `0`,
//!   `"0.00"`), except time columns which decode to `null`
//! - floats are rendered by [`decimal_string`]
//! - times are rendered as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` depending on
//!   the database column type, never on the value itself

use crate::error::{DbxError, DbxResult};
use crate::ident::normalize;
use crate::record::{FieldKind, FieldValue, Record};
use crate::row::{Cell, Column, ResultSet, RowMap, ScanType};
use crate::value::{DATE_FORMAT, DATETIME_FORMAT};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;

/// What a column is scanned into before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTarget {
    NullString,
    NullBool,
    NullInt32,
    NullInt64,
    NullFloat64,
    NullTime,
    String,
    Bool,
    Int,
    Int64,
    Float64,
    Time,
    Opaque,
}

impl ScanTarget {
    /// Collapse a driver scan type into one of the decode targets.
    pub fn for_scan_type(scan_type: ScanType) -> Self {
        match scan_type {
            ScanType::NullString | ScanType::RawBytes => ScanTarget::NullString,
            ScanType::NullBool => ScanTarget::NullBool,
            ScanType::NullInt32 => ScanTarget::NullInt32,
            ScanType::NullInt64 => ScanTarget::NullInt64,
            ScanType::NullFloat64 => ScanTarget::NullFloat64,
            ScanType::NullTime => ScanTarget::NullTime,
            ScanType::String => ScanTarget::String,
            ScanType::Bool => ScanTarget::Bool,
            ScanType::Int8
            | ScanType::Int16
            | ScanType::Int32
            | ScanType::Uint8
            | ScanType::Uint16
            | ScanType::Uint32 => ScanTarget::Int,
            ScanType::Int64 | ScanType::Uint64 => ScanTarget::Int64,
            ScanType::Float32 | ScanType::Float64 => ScanTarget::Float64,
            ScanType::Time => ScanTarget::Time,
            ScanType::Unknown => ScanTarget::Opaque,
        }
    }
}

/// A cell after scanning into its target.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scanned {
    NullString(Option<String>),
    NullBool(Option<bool>),
    NullInt32(Option<i32>),
    NullInt64(Option<i64>),
    NullFloat64(Option<f64>),
    NullTime(Option<NaiveDateTime>),
    String(String),
    Bool(bool),
    Int(i64),
    Int64(i64),
    Float64(f64),
    Time(NaiveDateTime),
    Opaque(Cell),
}

/// Render a float with at most two fractional digits, truncated.
///
/// Trailing zeros are trimmed and an empty fraction is dropped:
/// `12.0 → "12"`, `12.345 → "12.34"`, `12.30 → "12.3"`.
pub fn decimal_string(value: f64) -> String {
    let text = format!("{value:.12}");
    let Some((int_part, fraction)) = text.split_once('.') else {
        return text;
    };
    let fraction: String = fraction.chars().take(2).collect();
    let fraction = fraction.trim_end_matches('0');
    let rendered = if fraction.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{fraction}")
    };
    if rendered == "-0" { "0".to_string() } else { rendered }
}

/// Parse `YYYY-MM-DD HH:MM:SS[.f]` or `YYYY-MM-DD`.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn scan_error(column: &str, from: &Cell, to: &str) -> DbxError {
    DbxError::mapping(format!(
        "column '{column}': cannot convert {from:?} into {to}"
    ))
}

fn cell_bool(cell: &Cell) -> Option<bool> {
    match cell {
        Cell::Bool(b) => Some(*b),
        Cell::Int(0) | Cell::UInt(0) => Some(false),
        Cell::Int(1) | Cell::UInt(1) => Some(true),
        Cell::Bytes(_) => match cell.to_text()?.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Some(true),
            "0" | "f" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn cell_i64(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Int(v) => Some(*v),
        Cell::UInt(v) => i64::try_from(*v).ok(),
        Cell::Bool(b) => Some(i64::from(*b)),
        Cell::Bytes(_) => cell.to_text()?.trim().parse().ok(),
        _ => None,
    }
}

fn cell_f64(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Float(v) => Some(*v),
        Cell::Int(v) => Some(*v as f64),
        Cell::UInt(v) => Some(*v as f64),
        Cell::Bytes(_) => cell.to_text()?.trim().parse().ok(),
        _ => None,
    }
}

fn cell_time(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Date(d) => Some(d.and_time(NaiveTime::MIN)),
        Cell::Bytes(_) => parse_datetime(&cell.to_text()?),
        _ => None,
    }
}

/// Scan one cell into its target. `NULL` into a non-nullable target and
/// unconvertible values are mapping errors.
pub(crate) fn scan_cell(cell: &Cell, target: ScanTarget, column: &str) -> DbxResult<Scanned> {
    fn nullable<T>(
        cell: &Cell,
        column: &str,
        to: &str,
        convert: impl Fn(&Cell) -> Option<T>,
    ) -> DbxResult<Option<T>> {
        if cell.is_null() {
            return Ok(None);
        }
        convert(cell).map(Some).ok_or_else(|| scan_error(column, cell, to))
    }

    fn required<T>(
        cell: &Cell,
        column: &str,
        to: &str,
        convert: impl Fn(&Cell) -> Option<T>,
    ) -> DbxResult<T> {
        convert(cell).ok_or_else(|| scan_error(column, cell, to))
    }

    Ok(match target {
        ScanTarget::NullString => Scanned::NullString(cell.to_text()),
        ScanTarget::NullBool => Scanned::NullBool(nullable(cell, column, "bool", cell_bool)?),
        ScanTarget::NullInt32 => Scanned::NullInt32(nullable(cell, column, "i32", |c| {
            cell_i64(c).and_then(|v| i32::try_from(v).ok())
        })?),
        ScanTarget::NullInt64 => Scanned::NullInt64(nullable(cell, column, "i64", cell_i64)?),
        ScanTarget::NullFloat64 => {
            Scanned::NullFloat64(nullable(cell, column, "f64", cell_f64)?)
        }
        ScanTarget::NullTime => Scanned::NullTime(nullable(cell, column, "datetime", cell_time)?),
        ScanTarget::String => Scanned::String(required(cell, column, "string", Cell::to_text)?),
        ScanTarget::Bool => Scanned::Bool(required(cell, column, "bool", cell_bool)?),
        ScanTarget::Int => Scanned::Int(required(cell, column, "int", cell_i64)?),
        ScanTarget::Int64 => Scanned::Int64(required(cell, column, "i64", cell_i64)?),
        ScanTarget::Float64 => Scanned::Float64(required(cell, column, "f64", cell_f64)?),
        ScanTarget::Time => Scanned::Time(required(cell, column, "datetime", cell_time)?),
        ScanTarget::Opaque => Scanned::Opaque(cell.clone()),
    })
}

fn render_time(value: NaiveDateTime, database_type: &str) -> JsonValue {
    if value.and_utc().timestamp() <= 0 {
        return JsonValue::Null;
    }
    let db_type = database_type.to_ascii_lowercase();
    let format = if db_type.contains("date") && !db_type.contains("datetime") {
        DATE_FORMAT
    } else {
        DATETIME_FORMAT
    };
    JsonValue::String(value.format(format).to_string())
}

fn opaque_json(cell: Cell) -> JsonValue {
    match cell {
        Cell::Null => JsonValue::Null,
        Cell::Bytes(b) => JsonValue::String(String::from_utf8_lossy(&b).into_owned()),
        Cell::Int(v) => v.into(),
        Cell::UInt(v) => v.into(),
        Cell::Float(v) => JsonValue::String(decimal_string(v)),
        Cell::Bool(v) => v.into(),
        other => other.to_text().map_or(JsonValue::Null, JsonValue::String),
    }
}

fn to_json(scanned: Scanned, column: &Column) -> JsonValue {
    match scanned {
        Scanned::NullString(v) => JsonValue::String(v.unwrap_or_default()),
        Scanned::NullBool(v) => JsonValue::Bool(v.unwrap_or(false)),
        Scanned::NullInt32(v) => v.unwrap_or(0).into(),
        Scanned::NullInt64(v) => v.unwrap_or(0).into(),
        Scanned::NullFloat64(v) => {
            JsonValue::String(v.map_or_else(|| "0.00".to_string(), decimal_string))
        }
        Scanned::NullTime(v) => {
            v.map_or(JsonValue::Null, |t| render_time(t, &column.database_type))
        }
        Scanned::String(s) => JsonValue::String(s),
        Scanned::Bool(b) => JsonValue::Bool(b),
        Scanned::Int(v) | Scanned::Int64(v) => v.into(),
        Scanned::Float64(v) => JsonValue::String(decimal_string(v)),
        Scanned::Time(t) => render_time(t, &column.database_type),
        Scanned::Opaque(cell) => opaque_json(cell),
    }
}

fn targets(rs: &ResultSet) -> DbxResult<Vec<ScanTarget>> {
    if rs.columns.is_empty() && !rs.rows.is_empty() {
        return Err(DbxError::mapping("result rows carry no column metadata"));
    }
    Ok(rs
        .columns
        .iter()
        .map(|c| ScanTarget::for_scan_type(c.scan_type))
        .collect())
}

fn check_width(rs: &ResultSet, row: &[Cell]) -> DbxResult<()> {
    if row.len() != rs.columns.len() {
        return Err(DbxError::mapping(format!(
            "expected {} scan arguments, row has {}",
            rs.columns.len(),
            row.len()
        )));
    }
    Ok(())
}

/// Decode every row into an ordered column → value mapping.
pub fn decode_maps(rs: &ResultSet) -> DbxResult<Vec<RowMap>> {
    let targets = targets(rs)?;
    let mut out = Vec::with_capacity(rs.rows.len());

    for row in &rs.rows {
        check_width(rs, row)?;
        let mut map = RowMap::new();
        for ((column, target), cell) in rs.columns.iter().zip(&targets).zip(row) {
            let scanned = scan_cell(cell, *target, &column.name)?;
            map.insert(column.name.clone(), to_json(scanned, column));
        }
        out.push(map);
    }

    Ok(out)
}

/// Per-kind conversion rules for typed records.
///
/// Returns `None` when the scanned value has no sensible conversion for the
/// declared kind; the field then keeps its current value.
fn field_value(kind: FieldKind, scanned: Scanned) -> Option<FieldValue> {
    use Scanned as S;

    match kind {
        FieldKind::Str => match scanned {
            S::NullString(Some(s)) | S::String(s) => Some(FieldValue::Str(s)),
            _ => None,
        },
        FieldKind::Bool => match scanned {
            S::NullBool(Some(b)) | S::Bool(b) => Some(FieldValue::Bool(b)),
            S::Int(v) | S::Int64(v) | S::NullInt64(Some(v)) => Some(FieldValue::Bool(v == 1)),
            S::NullInt32(Some(v)) => Some(FieldValue::Bool(v == 1)),
            _ => None,
        },
        FieldKind::Int => match scanned {
            S::NullInt64(Some(v)) | S::Int64(v) | S::Int(v) => Some(FieldValue::Int(v)),
            S::NullInt32(Some(v)) => Some(FieldValue::Int(i64::from(v))),
            S::NullString(Some(s)) | S::String(s) => s.trim().parse().ok().map(FieldValue::Int),
            _ => None,
        },
        FieldKind::Float => match scanned {
            S::NullFloat64(Some(v)) | S::Float64(v) => Some(FieldValue::Float(v)),
            S::NullInt64(Some(v)) | S::Int64(v) | S::Int(v) => Some(FieldValue::Float(v as f64)),
            S::NullString(Some(s)) | S::String(s) => {
                s.trim().parse().ok().map(FieldValue::Float)
            }
            _ => None,
        },
        FieldKind::Time => match scanned {
            S::NullTime(Some(t)) | S::Time(t) => Some(FieldValue::Time(t)),
            S::NullString(Some(s)) | S::String(s) => parse_datetime(&s).map(FieldValue::Time),
            _ => None,
        },
    }
}

/// Resolve each record field to a result column index.
///
/// An explicit column annotation wins; otherwise names are compared ignoring
/// case and `_` / `-` separators.
fn field_columns<R: Record>(columns: &[Column]) -> Vec<Option<usize>> {
    let normalized: Vec<String> = columns.iter().map(|c| normalize(&c.name)).collect();

    R::fields()
        .iter()
        .map(|meta| match meta.column {
            Some(column) => columns
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(column)),
            None => {
                let wanted = normalize(meta.name);
                normalized.iter().position(|n| *n == wanted)
            }
        })
        .collect()
}

/// Decode every row into a record. Unmatched fields keep their default.
pub fn decode_records<R: Record>(rs: &ResultSet) -> DbxResult<Vec<R>> {
    let targets = targets(rs)?;
    let mapping = field_columns::<R>(&rs.columns);
    let mut out = Vec::with_capacity(rs.rows.len());

    for row in &rs.rows {
        check_width(rs, row)?;
        let mut record = R::default();
        for (meta, index) in R::fields().iter().zip(&mapping) {
            let Some(index) = *index else { continue };
            let column = &rs.columns[index];
            let scanned = scan_cell(&row[index], targets[index], &column.name)?;
            if let Some(value) = field_value(meta.kind, scanned) {
                record.set(meta.name, value);
            }
        }
        out.push(record);
    }

    Ok(out)
}

/// First cell of the first row as an integer; `None` for no rows or `NULL`.
///
/// Decimal text (as returned by `SUM` over integers) is truncated.
pub(crate) fn first_i64(rs: &ResultSet) -> DbxResult<Option<i64>> {
    let Some(cell) = rs.rows.first().and_then(|r| r.first()) else {
        return Ok(None);
    };
    if cell.is_null() {
        return Ok(None);
    }
    cell_i64(cell)
        .or_else(|| cell_f64(cell).map(|v| v.trunc() as i64))
        .map(Some)
        .ok_or_else(|| scan_error(first_name(rs), cell, "i64"))
}

/// First cell of the first row as a float; `None` for no rows or `NULL`.
pub(crate) fn first_f64(rs: &ResultSet) -> DbxResult<Option<f64>> {
    let Some(cell) = rs.rows.first().and_then(|r| r.first()) else {
        return Ok(None);
    };
    if cell.is_null() {
        return Ok(None);
    }
    cell_f64(cell)
        .map(Some)
        .ok_or_else(|| scan_error(first_name(rs), cell, "f64"))
}

fn first_name(rs: &ResultSet) -> &str {
    rs.columns.first().map_or("", |c| c.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldMeta, FieldType};

    #[test]
    fn decimal_string_truncates_two_digits() {
        assert_eq!(decimal_string(12.0), "12");
        assert_eq!(decimal_string(12.345), "12.34");
        assert_eq!(decimal_string(12.30), "12.3");
        assert_eq!(decimal_string(0.999), "0.99");
        assert_eq!(decimal_string(-1.5), "-1.5");
        assert_eq!(decimal_string(-0.001), "0");
    }

    #[test]
    fn scan_types_collapse() {
        assert_eq!(ScanTarget::for_scan_type(ScanType::RawBytes), ScanTarget::NullString);
        assert_eq!(ScanTarget::for_scan_type(ScanType::Uint32), ScanTarget::Int);
        assert_eq!(ScanTarget::for_scan_type(ScanType::Uint64), ScanTarget::Int64);
        assert_eq!(ScanTarget::for_scan_type(ScanType::Float32), ScanTarget::Float64);
        assert_eq!(ScanTarget::for_scan_type(ScanType::Unknown), ScanTarget::Opaque);
    }

    fn sample() -> ResultSet {
        let created = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        ResultSet::new(vec![
            Column::new("id", ScanType::Int64, "BIGINT"),
            Column::new("user_name", ScanType::RawBytes, "VARCHAR"),
            Column::new("score", ScanType::NullFloat64, "DOUBLE"),
            Column::new("birthday", ScanType::NullTime, "DATE"),
            Column::new("created_at", ScanType::NullTime, "DATETIME"),
        ])
        .with_row(vec![
            Cell::Int(7),
            "alice".into(),
            Cell::Float(12.0),
            Cell::DateTime(created),
            Cell::DateTime(created),
        ])
        .with_row(vec![Cell::Int(8), Cell::Null, Cell::Null, Cell::Null, Cell::Null])
    }

    #[test]
    fn map_decode_renders_by_column_type() {
        let rows = decode_maps(&sample()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        let keys: Vec<_> = first.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "user_name", "score", "birthday", "created_at"]);
        assert_eq!(first["id"], 7);
        assert_eq!(first["user_name"], "alice");
        assert_eq!(first["score"], "12");
        assert_eq!(first["birthday"], "2024-05-01");
        assert_eq!(first["created_at"], "2024-05-01 10:30:00");
    }

    #[test]
    fn map_decode_null_defaults() {
        let rows = decode_maps(&sample()).unwrap();
        let second = &rows[1];
        assert_eq!(second["user_name"], "");
        assert_eq!(second["score"], "0.00");
        assert_eq!(second["birthday"], JsonValue::Null);
    }

    #[test]
    fn null_into_required_target_is_mapping_error() {
        let rs = ResultSet::new(vec![Column::new("id", ScanType::Int64, "BIGINT")])
            .with_row(vec![Cell::Null]);
        assert!(decode_maps(&rs).unwrap_err().is_mapping());
    }

    #[test]
    fn row_width_mismatch_is_mapping_error() {
        let rs = ResultSet::new(vec![Column::new("id", ScanType::Int64, "BIGINT")])
            .with_row(vec![Cell::Int(1), Cell::Int(2)]);
        assert!(decode_maps(&rs).unwrap_err().is_mapping());
    }

    #[derive(Debug, Default, PartialEq)]
    struct Member {
        id: i64,
        user_name: String,
        score: f64,
        created_at: Option<NaiveDateTime>,
        nick: String,
    }

    impl Record for Member {
        fn fields() -> &'static [FieldMeta] {
            const FIELDS: &[FieldMeta] = &[
                FieldMeta::new("id", None, true, <i64 as FieldType>::KIND, false),
                FieldMeta::new("user_name", None, false, <String as FieldType>::KIND, false),
                FieldMeta::new("score", None, false, <f64 as FieldType>::KIND, false),
                FieldMeta::new("created_at", Some("created_at"), false, FieldKind::Time, true),
                FieldMeta::new("nick", None, false, FieldKind::Str, false),
            ];
            FIELDS
        }

        fn get(&self, field: &str) -> Option<FieldValue> {
            match field {
                "id" => Some(self.id.to_field_value()),
                "user_name" => Some(self.user_name.to_field_value()),
                "score" => Some(self.score.to_field_value()),
                "created_at" => Some(self.created_at.to_field_value()),
                "nick" => Some(self.nick.to_field_value()),
                _ => None,
            }
        }

        fn set(&mut self, field: &str, value: FieldValue) -> bool {
            fn put<T: FieldType>(slot: &mut T, value: FieldValue) -> bool {
                T::from_field_value(value).map(|v| *slot = v).is_some()
            }
            match field {
                "id" => put(&mut self.id, value),
                "user_name" => put(&mut self.user_name, value),
                "score" => put(&mut self.score, value),
                "created_at" => put(&mut self.created_at, value),
                "nick" => put(&mut self.nick, value),
                _ => false,
            }
        }
    }

    #[test]
    fn record_decode_matches_fields() {
        let members: Vec<Member> = decode_records(&sample()).unwrap();
        assert_eq!(members[0].id, 7);
        assert_eq!(members[0].user_name, "alice");
        assert_eq!(members[0].score, 12.0);
        assert!(members[0].created_at.is_some());
        assert_eq!(members[0].nick, "");

        assert_eq!(members[1].id, 8);
        assert_eq!(members[1].user_name, "");
        assert_eq!(members[1].created_at, None);
    }

    #[test]
    fn record_decode_parses_numeric_text() {
        let rs = ResultSet::new(vec![
            Column::new("ID", ScanType::RawBytes, "VARCHAR"),
            Column::new("Score", ScanType::RawBytes, "DECIMAL"),
        ])
        .with_row(vec!["42".into(), "3.75".into()]);
        let members: Vec<Member> = decode_records(&rs).unwrap();
        assert_eq!(members[0].id, 42);
        assert_eq!(members[0].score, 3.75);
    }

    #[test]
    fn first_scalar_helpers() {
        let rs = ResultSet::new(vec![Column::new("s", ScanType::RawBytes, "DECIMAL")])
            .with_row(vec!["15.50".into()]);
        assert_eq!(first_i64(&rs).unwrap(), Some(15));
        assert_eq!(first_f64(&rs).unwrap(), Some(15.5));
        assert_eq!(first_i64(&ResultSet::default()).unwrap(), None);
    }
}
