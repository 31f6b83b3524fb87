use lotus_core::{LotusError, LotusResult, QueryResult, Value as LotusValue};
use lotus_dialect::BackendConnection;
use sqlx::{Column, Row};
use std::time::Instant;

/// Step 7: run the bound statement and collect every row. Column typing
/// is unknown ahead of time (the statement is caller-authored SQL), so
/// each cell is decoded with a cascading `try_get` — mirroring the
/// teacher's `row_to_json` — rather than trusting `information_schema`.
pub async fn execute(conn: &mut BackendConnection, sql: &str, params: &[LotusValue]) -> LotusResult<QueryResult> {
    let started = Instant::now();
    let rows = match conn {
        BackendConnection::Postgres(c) => {
            let mut query = sqlx::query(sql);
            for value in params {
                query = bind_postgres(query, value);
            }
            let rows = query.fetch_all(&mut **c).await.map_err(explain_err_pg)?;
            decode_rows(rows.iter(), decode_postgres_cell)
        }
        BackendConnection::Mysql(c) => {
            let mut query = sqlx::query(sql);
            for value in params {
                query = bind_mysql(query, value);
            }
            let rows = query.fetch_all(&mut **c).await.map_err(explain_err_mysql)?;
            decode_rows(rows.iter(), decode_mysql_cell)
        }
        BackendConnection::Sqlite(c) => {
            let mut query = sqlx::query(sql);
            for value in params {
                query = bind_sqlite(query, value);
            }
            let rows = query.fetch_all(&mut **c).await.map_err(explain_err_sqlite)?;
            decode_rows(rows.iter(), decode_sqlite_cell)
        }
    }?;

    let (columns, data) = rows;
    let num_rows = data.len() as u64;
    Ok(QueryResult {
        columns,
        rows: data,
        num_rows,
        duration_ms: started.elapsed().as_millis() as u64,
        command: "SELECT".to_string(),
        meta: serde_json::Value::Null,
        window: None,
    })
}

fn decode_rows<'r, R: Row + 'r>(
    rows: impl Iterator<Item = &'r R>,
    decode_cell: impl Fn(&'r R, &str) -> LotusValue,
) -> LotusResult<(Vec<String>, Vec<Vec<LotusValue>>)> {
    let mut columns: Vec<String> = Vec::new();
    let mut data = Vec::new();
    let mut first = true;
    for row in rows {
        if first {
            columns = row.columns().iter().map(|c| c.name().to_string()).collect();
            first = false;
        }
        let values: Vec<LotusValue> = columns.iter().map(|name| decode_cell(row, name)).collect();
        data.push(values);
    }
    Ok((columns, data))
}

fn decode_postgres_cell(row: &sqlx::postgres::PgRow, name: &str) -> LotusValue {
    if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
        return v.map(LotusValue::Integer).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(name) {
        return v.map(|n| LotusValue::Integer(n as i64)).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
        return v.map(LotusValue::Number).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(name) {
        return v.map(LotusValue::Boolean).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return v.map(|u| LotusValue::Uuid(u.to_string())).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return v.map(LotusValue::Json).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        return v.map(LotusValue::Text).unwrap_or(LotusValue::Null);
    }
    LotusValue::Null
}

fn decode_mysql_cell(row: &sqlx::mysql::MySqlRow, name: &str) -> LotusValue {
    if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
        return v.map(LotusValue::Integer).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
        return v.map(LotusValue::Number).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(name) {
        return v.map(LotusValue::Boolean).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return v.map(LotusValue::Json).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        return v.map(LotusValue::Text).unwrap_or(LotusValue::Null);
    }
    LotusValue::Null
}

fn decode_sqlite_cell(row: &sqlx::sqlite::SqliteRow, name: &str) -> LotusValue {
    if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
        return v.map(LotusValue::Integer).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
        return v.map(LotusValue::Number).unwrap_or(LotusValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        return v.map(LotusValue::Text).unwrap_or(LotusValue::Null);
    }
    LotusValue::Null
}

fn bind_postgres<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    value: &'q LotusValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match value {
        LotusValue::Null => query.bind(Option::<String>::None),
        LotusValue::Boolean(b) => query.bind(*b),
        LotusValue::Integer(i) => query.bind(*i),
        LotusValue::Number(n) => query.bind(*n),
        LotusValue::Text(s) | LotusValue::Date(s) | LotusValue::Time(s) | LotusValue::DateTime(s) | LotusValue::Uuid(s) => {
            query.bind(s.as_str())
        }
        LotusValue::Json(j) => query.bind(j.clone()),
        LotusValue::Array(_) => query.bind(value.as_display_string()),
    }
}

fn bind_mysql<'q>(
    query: sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>,
    value: &'q LotusValue,
) -> sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments> {
    match value {
        LotusValue::Null => query.bind(Option::<String>::None),
        LotusValue::Boolean(b) => query.bind(*b),
        LotusValue::Integer(i) => query.bind(*i),
        LotusValue::Number(n) => query.bind(*n),
        LotusValue::Text(s) | LotusValue::Date(s) | LotusValue::Time(s) | LotusValue::DateTime(s) | LotusValue::Uuid(s) => {
            query.bind(s.as_str())
        }
        LotusValue::Json(j) => query.bind(j.clone()),
        LotusValue::Array(_) => query.bind(value.as_display_string()),
    }
}

fn bind_sqlite<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &'q LotusValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        LotusValue::Null => query.bind(Option::<String>::None),
        LotusValue::Boolean(b) => query.bind(*b),
        LotusValue::Integer(i) => query.bind(*i),
        LotusValue::Number(n) => query.bind(*n),
        LotusValue::Text(s) | LotusValue::Date(s) | LotusValue::Time(s) | LotusValue::DateTime(s) | LotusValue::Uuid(s) => {
            query.bind(s.as_str())
        }
        LotusValue::Json(j) => query.bind(j.to_string()),
        LotusValue::Array(_) => query.bind(value.as_display_string()),
    }
}

fn explain_err_pg(e: sqlx::Error) -> LotusError {
    LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Postgres, &e))
}

fn explain_err_mysql(e: sqlx::Error) -> LotusError {
    LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Mysql, &e))
}

fn explain_err_sqlite(e: sqlx::Error) -> LotusError {
    LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Sqlite, &e))
}
