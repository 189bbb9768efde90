//! Terminal operations run against a scripted executor.

mod common;

use common::Scripted;
use dbx::{
    Cell, Column, ColumnDescriptor, ColumnValues, Db, DbxError, DbxResult, QueryBuilder,
    ResultSet, ScanType, SchemaCache, Value,
};
use std::sync::Arc;
use std::time::Duration;

fn count_rs(n: i64) -> ResultSet {
    ResultSet::new(vec![Column::new("COUNT(*)", ScanType::Int64, "BIGINT")])
        .with_row(vec![Cell::Int(n)])
}

fn schema_cache() -> SchemaCache {
    SchemaCache::new()
        .with_table(
            "users",
            vec![
                ColumnDescriptor::new("id", "int(10) unsigned")
                    .primary_key()
                    .auto_increment(),
                ColumnDescriptor::new("name", "varchar(32)"),
                ColumnDescriptor::new("visits", "int(11)"),
                ColumnDescriptor::new("del_flag", "tinyint(1)"),
            ],
        )
        .with_table(
            "logs",
            vec![
                ColumnDescriptor::new("id", "bigint(20)").primary_key(),
                ColumnDescriptor::new("delete_at", "datetime").nullable(true),
            ],
        )
}

fn schemas() -> Arc<SchemaCache> {
    Arc::new(schema_cache())
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_get_decodes_rows_in_column_order() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_read(
        ResultSet::new(vec![
            Column::new("id", ScanType::Uint32, "INT"),
            Column::new("name", ScanType::RawBytes, "VARCHAR"),
            Column::new("score", ScanType::NullFloat64, "DOUBLE"),
        ])
        .with_row(vec![Cell::UInt(1), Cell::from("ann"), Cell::Float(2.5)])
        .with_row(vec![Cell::UInt(2), Cell::Null, Cell::Null]),
    );

    let rows = QueryBuilder::new("users")
        .and_cmp("id", "<", 10)
        .get(&exec)
        .await?;

    assert_eq!(rows.len(), 2);
    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, ["id", "name", "score"]);
    assert_eq!(rows[0]["name"], "ann");
    assert_eq!(rows[0]["score"], "2.5");
    assert_eq!(rows[1]["name"], "");
    assert_eq!(rows[1]["score"], "0.00");

    let calls = exec.calls();
    assert_eq!(calls[0].sql, "SELECT * FROM `users` WHERE `id` < ?");
    assert_eq!(calls[0].params, vec![Value::Int(10)]);
    Ok(())
}

#[tokio::test]
async fn test_first_limits_without_touching_builder() -> DbxResult<()> {
    let exec = Scripted::new();
    let mut qb = QueryBuilder::new("users");
    qb.and_eq("name", "ann").limit(50);

    assert_eq!(qb.first(&exec).await?, None);
    assert_eq!(
        exec.statements(),
        ["SELECT * FROM `users` WHERE `name` = ? LIMIT 1"]
    );
    assert!(qb.to_sql().ends_with("LIMIT 50"));
    Ok(())
}

#[tokio::test]
async fn test_value_reads_one_column() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_read(
        ResultSet::new(vec![Column::new("name", ScanType::RawBytes, "VARCHAR")])
            .with_row(vec![Cell::from("ann")]),
    );
    exec.push_read(
        ResultSet::new(vec![Column::new("visits", ScanType::Int32, "INT")])
            .with_row(vec![Cell::Int(12)]),
    );

    let mut qb = QueryBuilder::new("users u");
    qb.and_eq("u.id", 3);

    let name = qb.string_value(&exec, "u.name").await?;
    assert_eq!(name.as_deref(), Some("ann"));
    assert_eq!(qb.int_value(&exec, "visits").await?, Some(12));
    assert_eq!(qb.value(&exec, "visits").await?, None);

    let statements = exec.statements();
    assert_eq!(
        statements[0],
        "SELECT u.`name` FROM `users` AS u WHERE u.`id` = ? LIMIT 1"
    );
    assert_eq!(qb.to_sql(), "SELECT * FROM `users` AS u WHERE u.`id` = ?");
    Ok(())
}

#[tokio::test]
async fn test_value_finds_aliased_column() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_read(
        ResultSet::new(vec![Column::new("n", ScanType::RawBytes, "VARCHAR")])
            .with_row(vec![Cell::from("ann")]),
    );
    exec.push_read(
        ResultSet::new(vec![Column::new("nick", ScanType::RawBytes, "VARCHAR")])
            .with_row(vec![Cell::from("a")]),
    );

    let mut qb = QueryBuilder::new("users u");
    let name = qb.string_value(&exec, "u.name AS n").await?;
    assert_eq!(name.as_deref(), Some("ann"));
    let nick = qb.string_value(&exec, "u.nick_name nick").await?;
    assert_eq!(nick.as_deref(), Some("a"));

    assert_eq!(
        exec.statements()[0],
        "SELECT u.`name` AS n FROM `users` AS u LIMIT 1"
    );
    Ok(())
}

#[tokio::test]
async fn test_aggregates() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_read(count_rs(3));
    exec.push_read(count_rs(0));
    exec.push_read(
        ResultSet::new(vec![Column::new("SUM(`visits`)", ScanType::RawBytes, "DECIMAL")])
            .with_row(vec![Cell::from("41")]),
    );
    exec.push_read(
        ResultSet::new(vec![Column::new("SUM(`visits`)", ScanType::RawBytes, "DECIMAL")])
            .with_row(vec![Cell::Null]),
    );

    let mut qb = QueryBuilder::new("users");
    qb.and_eq("name", "ann");
    assert_eq!(qb.count(&exec).await?, 3);
    assert!(!qb.exists(&exec).await?);
    assert_eq!(qb.sum_int(&exec, "visits").await?, 41);
    assert_eq!(qb.sum_float(&exec, "visits").await?, 0.0);

    assert_eq!(
        exec.statements()[2],
        "SELECT SUM(`visits`) FROM `users` WHERE `name` = ? LIMIT 1"
    );
    Ok(())
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_insert_returns_generated_id() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_write(1, Some(9));

    let id = QueryBuilder::new("users")
        .insert(&exec, &ColumnValues::new().set("name", "ann").set("nick", None::<String>))
        .await?;

    assert_eq!(id, 9);
    let calls = exec.calls();
    assert_eq!(calls[0].sql, "INSERT INTO `users` (`name`, `nick`) VALUES (?, NULL)");
    assert_eq!(calls[0].params, vec![Value::Str("ann".into())]);
    Ok(())
}

#[tokio::test]
async fn test_empty_writes_fail_before_execution() {
    let exec = Scripted::new();
    let mut qb = QueryBuilder::new("users");

    let err = qb.insert(&exec, &ColumnValues::new()).await.unwrap_err();
    assert!(err.is_statement(), "{err}");
    let err = qb.update(&exec, &ColumnValues::new()).await.unwrap_err();
    assert!(err.is_statement(), "{err}");

    let err = QueryBuilder::new("").get(&exec).await.unwrap_err();
    assert!(err.is_statement(), "{err}");

    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn test_statement_error_passes_through() {
    let exec = Scripted::new();
    exec.fail_next_write("Duplicate entry 'ann' for key 'name'");

    let err = QueryBuilder::new("users")
        .insert(&exec, &ColumnValues::new().set("name", "ann"))
        .await
        .unwrap_err();

    assert!(err.is_statement());
    assert!(err.to_string().contains("Duplicate entry"));
}

#[tokio::test]
async fn test_increment_and_decrement() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_write(1, None);
    exec.push_write(1, None);

    let mut qb = QueryBuilder::new("users");
    qb.and_eq("id", 7);
    assert_eq!(qb.increment(&exec, "visits", 2).await?, 1);
    assert_eq!(qb.decrement(&exec, "balance", "1.5").await?, 1);

    // non-positive and non-numeric amounts are no-ops
    assert_eq!(qb.increment(&exec, "visits", 0).await?, 0);
    assert_eq!(qb.decrement(&exec, "visits", -3).await?, 0);
    assert_eq!(qb.increment(&exec, "visits", "many").await?, 0);

    let calls = exec.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].sql,
        "UPDATE `users` SET `visits` = `visits` + 2 WHERE `id` = ?"
    );
    assert_eq!(calls[0].params, vec![Value::Int(7)]);
    assert_eq!(
        calls[1].sql,
        "UPDATE `users` SET `balance` = `balance` - 1.5 WHERE `id` = ?"
    );
    Ok(())
}

#[tokio::test]
async fn test_soft_delete_follows_conventions() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_write(2, None);
    exec.push_write(1, None);

    let schemas = schemas();
    let mut users = QueryBuilder::with_schemas("users", Arc::clone(&schemas));
    users.and_in("id", [1, 2]);
    assert_eq!(users.soft_delete(&exec).await?, 2);

    let mut logs = QueryBuilder::with_schemas("logs", Arc::clone(&schemas));
    logs.and_eq("id", 5);
    assert_eq!(logs.soft_delete(&exec).await?, 1);

    // no convention column: nothing is run
    assert_eq!(QueryBuilder::new("users").soft_delete(&exec).await?, 0);

    let calls = exec.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].sql,
        "UPDATE `users` SET `del_flag` = ? WHERE `id` IN (?, ?)"
    );
    assert_eq!(calls[0].params[0], Value::Int(1));
    assert_eq!(calls[1].sql, "UPDATE `logs` SET `delete_at` = ? WHERE `id` = ?");
    assert!(matches!(&calls[1].params[0], Value::Str(s) if s.len() == 19));
    Ok(())
}

#[tokio::test]
async fn test_delete_and_raw_query() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_write(3, None);
    exec.push_write(1, None);

    let deleted = QueryBuilder::new("sessions")
        .and_date("expires", "<", "2024-01-01")
        .delete(&exec)
        .await?;
    assert_eq!(deleted, 3);

    let changed = dbx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind("bo")
        .bind(7)
        .execute(&exec)
        .await?;
    assert_eq!(changed, 1);

    let calls = exec.calls();
    assert_eq!(
        calls[0].sql,
        "DELETE FROM `sessions` WHERE DATE(`expires`) < ?"
    );
    assert_eq!(calls[1].params, vec![Value::Str("bo".into()), Value::Int(7)]);
    Ok(())
}

#[tokio::test]
async fn test_is_field_value_exists_excludes_row() -> DbxResult<()> {
    let exec = Scripted::new();
    exec.push_read(count_rs(1));

    let taken = dbx::is_field_value_exists(&exec, "users", "email", "a@b.c", Some(Value::Int(4)))
        .await?;

    assert!(taken);
    let calls = exec.calls();
    assert_eq!(
        calls[0].sql,
        "SELECT COUNT(*) FROM `users` WHERE `id` <> ? AND `email` = ?"
    );
    assert_eq!(calls[0].params, vec![Value::Int(4), Value::Str("a@b.c".into())]);
    Ok(())
}

// ============================================================================
// Deadlines and configuration
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_statement_times_out() {
    let exec = Scripted::new().with_delay(Duration::from_secs(10));
    let mut qb = QueryBuilder::new("users");

    let err = qb.get(&exec).await.unwrap_err();
    assert!(matches!(err, DbxError::Timeout(t) if t == Duration::from_secs(5)));

    // an override below the floor falls back to the default
    let err = qb
        .timeout(Duration::from_millis(200))
        .get(&exec)
        .await
        .unwrap_err();
    assert!(matches!(err, DbxError::Timeout(t) if t == Duration::from_secs(5)));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_override_applies_once() {
    let exec = Scripted::new().with_delay(Duration::from_secs(10));
    let mut qb = QueryBuilder::new("users");

    assert!(qb.timeout(Duration::from_secs(30)).count(&exec).await.is_ok());
    let err = qb.count(&exec).await.unwrap_err();
    assert!(err.is_timeout(), "{err}");
}

#[tokio::test]
async fn test_unconfigured_db_reports_config_error() {
    let db: Db<Scripted> = Db::unconfigured();
    let err = db.table("users").count(&db).await.unwrap_err();
    assert!(err.is_config(), "{err}");

    let err = db.is_field_value_exists("users", "name", "ann", None).await.unwrap_err();
    assert!(err.is_config(), "{err}");
}

#[tokio::test]
async fn test_db_builders_see_schema_conventions() -> DbxResult<()> {
    let exec = Scripted::new();
    let db = Db::new(exec.clone()).with_schemas(schema_cache());

    db.table("users").and_soft_deleted(false).count(&db).await?;
    assert_eq!(
        exec.statements(),
        ["SELECT COUNT(*) FROM `users` WHERE `del_flag` = ?"]
    );
    Ok(())
}
