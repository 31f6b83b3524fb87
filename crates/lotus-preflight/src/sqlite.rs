use crate::relation::{dedup, TouchedRelation};
use lotus_core::{LotusError, LotusResult, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::pool::PoolConnection;
use sqlx::{Row, Sqlite};

const SAVEPOINT: &str = "lotus_preflight";

static SCAN_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:SCAN|SEARCH)\s+(?:TABLE\s+)?([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

/// SQLite preflight (§4.6): `EXPLAIN QUERY PLAN` on the bound statement,
/// extracting table names from each row's human-readable `detail`
/// column (SQLite doesn't expose a structured JSON plan). Runs inside a
/// savepoint, rolled back unconditionally. SQLite has a single implicit
/// schema (`main`) for the databases Lotus attaches.
pub async fn discover_relations(
    conn: &mut PoolConnection<Sqlite>,
    sql: &str,
    params: &[Value],
) -> LotusResult<Vec<TouchedRelation>> {
    sqlx::query(&format!("SAVEPOINT {SAVEPOINT}"))
        .execute(&mut **conn)
        .await
        .map_err(explain_err)?;

    let explain_sql = format!("EXPLAIN QUERY PLAN {sql}");
    let mut query = sqlx::query(&explain_sql);
    for value in params {
        query = bind_sqlite(query, value);
    }
    let result = query.fetch_all(&mut **conn).await;

    sqlx::query(&format!("ROLLBACK TO SAVEPOINT {SAVEPOINT}"))
        .execute(&mut **conn)
        .await
        .map_err(explain_err)?;

    let rows = result.map_err(explain_err)?;
    let mut relations = Vec::new();
    for row in rows {
        let detail: String = row.try_get("detail").unwrap_or_default();
        if let Some(caps) = SCAN_TABLE.captures(&detail) {
            relations.push(TouchedRelation::new("main", caps[1].to_string()));
        }
    }
    Ok(dedup(relations))
}

fn bind_sqlite<'q>(
    query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &'q Value,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Boolean(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::Number(n) => query.bind(*n),
        Value::Text(s) | Value::Date(s) | Value::Time(s) | Value::DateTime(s) | Value::Uuid(s) => query.bind(s.as_str()),
        Value::Json(j) => query.bind(j.to_string()),
        Value::Array(_) => query.bind(value.as_display_string()),
    }
}

fn explain_err(e: sqlx::Error) -> LotusError {
    LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Sqlite, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_table_regex_extracts_name() {
        let caps = SCAN_TABLE.captures("SCAN TABLE users").unwrap();
        assert_eq!(&caps[1], "users");
    }

    #[test]
    fn search_table_regex_extracts_name() {
        let caps = SCAN_TABLE.captures("SEARCH TABLE orders USING INDEX idx_orders_user").unwrap();
        assert_eq!(&caps[1], "orders");
    }
}
