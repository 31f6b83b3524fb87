use crate::relation::{dedup, TouchedRelation};
use lotus_core::{LotusError, LotusResult, Value};
use serde_json::Value as Json;
use sqlx::pool::PoolConnection;
use sqlx::{MySql, Row};

const SAVEPOINT: &str = "lotus_preflight";

/// MySQL preflight (§4.6): `EXPLAIN FORMAT=JSON` on the bound statement,
/// walking the plan tree for `table_name`, qualified against the
/// current database (MySQL's `EXPLAIN` output doesn't repeat the schema
/// per node). Runs inside a savepoint, rolled back unconditionally.
pub async fn discover_relations(
    conn: &mut PoolConnection<MySql>,
    sql: &str,
    params: &[Value],
    current_database: &str,
) -> LotusResult<Vec<TouchedRelation>> {
    sqlx::query(&format!("SAVEPOINT {SAVEPOINT}"))
        .execute(&mut **conn)
        .await
        .map_err(explain_err)?;

    let explain_sql = format!("EXPLAIN FORMAT=JSON {sql}");
    let mut query = sqlx::query(&explain_sql);
    for value in params {
        query = bind_mysql(query, value);
    }
    let result = query.fetch_one(&mut **conn).await;

    sqlx::query(&format!("ROLLBACK TO SAVEPOINT {SAVEPOINT}"))
        .execute(&mut **conn)
        .await
        .map_err(explain_err)?;

    let row = result.map_err(explain_err)?;
    let plan_text: String = row.try_get(0).map_err(explain_err)?;
    let plan: Json = serde_json::from_str(&plan_text).unwrap_or(Json::Null);

    let mut relations = Vec::new();
    walk_plan(&plan, current_database, &mut relations);
    Ok(dedup(relations))
}

fn bind_mysql<'q>(
    query: sqlx::query::Query<'q, MySql, sqlx::mysql::MySqlArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, MySql, sqlx::mysql::MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Boolean(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::Number(n) => query.bind(*n),
        Value::Text(s) | Value::Date(s) | Value::Time(s) | Value::DateTime(s) | Value::Uuid(s) => query.bind(s.as_str()),
        Value::Json(j) => query.bind(j.clone()),
        Value::Array(_) => query.bind(value.as_display_string()),
    }
}

fn walk_plan(node: &Json, current_database: &str, out: &mut Vec<TouchedRelation>) {
    match node {
        Json::Array(items) => {
            for item in items {
                walk_plan(item, current_database, out);
            }
        }
        Json::Object(map) => {
            if let Some(Json::String(table)) = map.get("table_name") {
                out.push(TouchedRelation::new(current_database, table.clone()));
            }
            for value in map.values() {
                walk_plan(value, current_database, out);
            }
        }
        _ => {}
    }
}

fn explain_err(e: sqlx::Error) -> LotusError {
    LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Mysql, &e))
}
