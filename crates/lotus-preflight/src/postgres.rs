use crate::relation::{dedup, TouchedRelation};
use lotus_core::{LotusError, LotusResult, Value};
use serde_json::Value as Json;
use sqlx::pool::PoolConnection;
use sqlx::{Postgres, Row};

const SAVEPOINT: &str = "lotus_preflight";

/// PostgreSQL preflight (§4.6): run `EXPLAIN (FORMAT JSON)` on the bound
/// statement inside a named savepoint, walk the plan tree collecting
/// every `Relation Name`/`Schema` pair, then unconditionally roll the
/// savepoint back so no planner side effect (a folded volatile function,
/// say) can leak into the real execution that follows.
pub async fn discover_relations(
    conn: &mut PoolConnection<Postgres>,
    sql: &str,
    params: &[Value],
) -> LotusResult<Vec<TouchedRelation>> {
    sqlx::query(&format!("SAVEPOINT {SAVEPOINT}"))
        .execute(&mut **conn)
        .await
        .map_err(explain_err)?;

    let explain_sql = format!("EXPLAIN (FORMAT JSON, VERBOSE) {sql}");
    let mut query = sqlx::query(&explain_sql);
    for value in params {
        query = bind_postgres(query, value);
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
    walk_plan(&plan, &mut relations);
    Ok(dedup(relations))
}

fn bind_postgres<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
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

fn walk_plan(node: &Json, out: &mut Vec<TouchedRelation>) {
    match node {
        Json::Array(items) => {
            for item in items {
                walk_plan(item, out);
            }
        }
        Json::Object(map) => {
            if let (Some(Json::String(table)), schema) = (map.get("Relation Name"), map.get("Schema")) {
                let schema = schema.and_then(Json::as_str).unwrap_or("public");
                out.push(TouchedRelation::new(schema, table.clone()));
            }
            for value in map.values() {
                walk_plan(value, out);
            }
        }
        _ => {}
    }
}

fn explain_err(e: sqlx::Error) -> LotusError {
    LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Postgres, &e))
}
