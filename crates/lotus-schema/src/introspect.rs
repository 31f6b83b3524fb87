use crate::column::{var_type_for_native, ColumnInfo};
use lotus_core::{DialectKind, LotusError, LotusResult};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{MySql, MySqlPool, PgPool, Postgres, Row, Sqlite, SqlitePool};

/// A connection pool for one of the three supported dialects, used for
/// administrative introspection queries outside the per-request
/// read-only session (§4.3).
#[derive(Clone)]
pub enum BackendPool {
    Postgres(PgPool),
    Mysql(MySqlPool),
    Sqlite(SqlitePool),
}

impl BackendPool {
    pub fn dialect(&self) -> DialectKind {
        match self {
            BackendPool::Postgres(_) => DialectKind::Postgres,
            BackendPool::Mysql(_) => DialectKind::Mysql,
            BackendPool::Sqlite(_) => DialectKind::Sqlite,
        }
    }
}

/// Build a pool for one backend, sized per its configured `pool_size`.
/// Mirrors the teacher's `PgPoolOptions::new().max_connections(..).connect(..)`
/// pattern, generalized across the three dialects.
pub async fn connect(dialect: DialectKind, url: &str, pool_size: u32) -> LotusResult<BackendPool> {
    match dialect {
        DialectKind::Postgres => PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await
            .map(BackendPool::Postgres)
            .map_err(|e| LotusError::backend_error(e.to_string())),
        DialectKind::Mysql => MySqlPoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await
            .map(BackendPool::Mysql)
            .map_err(|e| LotusError::backend_error(e.to_string())),
        DialectKind::Sqlite => SqlitePoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await
            .map(BackendPool::Sqlite)
            .map_err(|e| LotusError::backend_error(e.to_string())),
        other => Err(LotusError::backend_error(format!("no driver available for dialect {other:?}"))),
    }
}

/// `list_schemas(backend, opts) → [string]`, unfiltered by visibility —
/// the caller applies `VisibilityEngine::allowed_schema` afterward.
pub async fn list_schemas(pool: &BackendPool) -> LotusResult<Vec<String>> {
    match pool {
        BackendPool::Postgres(p) => {
            let rows = sqlx::query("SELECT schema_name FROM information_schema.schemata ORDER BY schema_name")
                .fetch_all(p)
                .await
                .map_err(|e| LotusError::backend_error(e.to_string()))?;
            Ok(rows.iter().map(|r| r.get::<String, _>("schema_name")).collect())
        }
        BackendPool::Mysql(p) => {
            let rows = sqlx::query("SELECT schema_name FROM information_schema.schemata ORDER BY schema_name")
                .fetch_all(p)
                .await
                .map_err(|e| LotusError::backend_error(e.to_string()))?;
            Ok(rows.iter().map(|r| r.get::<String, _>("schema_name")).collect())
        }
        BackendPool::Sqlite(_) => Ok(vec!["main".to_string()]),
    }
}

/// `list_tables(backend, opts) → [{schema?, table}]` (§4.3). `schema`
/// filters to a single schema when present.
pub async fn list_tables(pool: &BackendPool, schema: Option<&str>) -> LotusResult<Vec<(String, String)>> {
    match pool {
        BackendPool::Postgres(p) => {
            let rows = if let Some(schema) = schema {
                sqlx::query(
                    "SELECT table_schema, table_name FROM information_schema.tables \
                     WHERE table_type = 'BASE TABLE' AND table_schema = $1 ORDER BY table_name",
                )
                .bind(schema)
                .fetch_all(p)
                .await
            } else {
                sqlx::query(
                    "SELECT table_schema, table_name FROM information_schema.tables \
                     WHERE table_type = 'BASE TABLE' ORDER BY table_schema, table_name",
                )
                .fetch_all(p)
                .await
            }
            .map_err(|e| LotusError::backend_error(e.to_string()))?;
            Ok(rows
                .iter()
                .map(|r| (r.get::<String, _>("table_schema"), r.get::<String, _>("table_name")))
                .collect())
        }
        BackendPool::Mysql(p) => {
            let rows = if let Some(schema) = schema {
                sqlx::query(
                    "SELECT table_schema, table_name FROM information_schema.tables \
                     WHERE table_type = 'BASE TABLE' AND table_schema = ? ORDER BY table_name",
                )
                .bind(schema)
                .fetch_all(p)
                .await
            } else {
                sqlx::query(
                    "SELECT table_schema, table_name FROM information_schema.tables \
                     WHERE table_type = 'BASE TABLE' ORDER BY table_schema, table_name",
                )
                .fetch_all(p)
                .await
            }
            .map_err(|e| LotusError::backend_error(e.to_string()))?;
            Ok(rows
                .iter()
                .map(|r| (r.get::<String, _>("table_schema"), r.get::<String, _>("table_name")))
                .collect())
        }
        BackendPool::Sqlite(p) => {
            let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(p)
                .await
                .map_err(|e| LotusError::backend_error(e.to_string()))?;
            Ok(rows.iter().map(|r| ("main".to_string(), r.get::<String, _>("name"))).collect())
        }
    }
}

/// `get_table_schema(backend, table, opts) → [column]` (§4.3). Returns
/// raw column info, unfiltered by column policy — the caller applies
/// `VisibilityEngine::column_visible_in_schema` / masks `visibility`.
pub async fn get_table_schema(pool: &BackendPool, schema: &str, table: &str) -> LotusResult<Vec<ColumnInfo>> {
    let dialect = pool.dialect();
    match pool {
        BackendPool::Postgres(p) => {
            let rows = sqlx::query(
                "SELECT column_name, data_type, is_nullable, column_default \
                 FROM information_schema.columns WHERE table_schema = $1 AND table_name = $2 \
                 ORDER BY ordinal_position",
            )
            .bind(schema)
            .bind(table)
            .fetch_all(p)
            .await
            .map_err(|e| LotusError::backend_error(e.to_string()))?;

            let pk_rows = sqlx::query(
                "SELECT kcu.column_name FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
                 WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = $1 AND tc.table_name = $2",
            )
            .bind(schema)
            .bind(table)
            .fetch_all(p)
            .await
            .map_err(|e| LotusError::backend_error(e.to_string()))?;
            let pk_columns: Vec<String> = pk_rows.iter().map(|r| r.get::<String, _>("column_name")).collect();

            Ok(rows
                .iter()
                .map(|r| {
                    let name: String = r.get("column_name");
                    let native_type: String = r.get("data_type");
                    let nullable: String = r.get("is_nullable");
                    ColumnInfo {
                        var_type: var_type_for_native(dialect, &native_type),
                        primary_key: pk_columns.contains(&name),
                        name,
                        native_type,
                        nullable: nullable == "YES",
                        default: r.get::<Option<String>, _>("column_default"),
                        visibility: None,
                    }
                })
                .collect())
        }
        BackendPool::Mysql(p) => {
            let rows = sqlx::query(
                "SELECT column_name, data_type, is_nullable, column_default, column_key \
                 FROM information_schema.columns WHERE table_schema = ? AND table_name = ? \
                 ORDER BY ordinal_position",
            )
            .bind(schema)
            .bind(table)
            .fetch_all(p)
            .await
            .map_err(|e| LotusError::backend_error(e.to_string()))?;

            Ok(rows
                .iter()
                .map(|r| {
                    let native_type: String = r.get("data_type");
                    let nullable: String = r.get("is_nullable");
                    let key: String = r.get("column_key");
                    ColumnInfo {
                        name: r.get("column_name"),
                        var_type: var_type_for_native(dialect, &native_type),
                        native_type,
                        nullable: nullable == "YES",
                        default: r.get::<Option<String>, _>("column_default"),
                        primary_key: key == "PRI",
                        visibility: None,
                    }
                })
                .collect())
        }
        BackendPool::Sqlite(p) => {
            let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
                .fetch_all(p)
                .await
                .map_err(|e| LotusError::backend_error(e.to_string()))?;
            Ok(rows
                .iter()
                .map(|r| {
                    let native_type: String = r.get("type");
                    let notnull: i64 = r.get("notnull");
                    let pk: i64 = r.get("pk");
                    ColumnInfo {
                        name: r.get("name"),
                        var_type: var_type_for_native(dialect, &native_type),
                        native_type,
                        nullable: notnull == 0,
                        default: r.get::<Option<String>, _>("dflt_value"),
                        primary_key: pk != 0,
                        visibility: None,
                    }
                })
                .collect())
        }
    }
}

/// `get_table_stats(backend, table, opts) → {row_count}` (§4.3).
pub async fn get_table_stats(pool: &BackendPool, schema: &str, table: &str) -> LotusResult<i64> {
    let qualified = match pool.dialect() {
        DialectKind::Postgres | DialectKind::Mysql => format!("{schema}.{table}"),
        _ => table.to_string(),
    };
    let count: (i64,) = match pool {
        BackendPool::Postgres(p) => sqlx::query_as::<Postgres, (i64,)>(&format!("SELECT COUNT(*) FROM {qualified}"))
            .fetch_one(p)
            .await
            .map_err(|e| LotusError::backend_error(e.to_string()))?,
        BackendPool::Mysql(p) => sqlx::query_as::<MySql, (i64,)>(&format!("SELECT COUNT(*) FROM {qualified}"))
            .fetch_one(p)
            .await
            .map_err(|e| LotusError::backend_error(e.to_string()))?,
        BackendPool::Sqlite(p) => sqlx::query_as::<Sqlite, (i64,)>(&format!("SELECT COUNT(*) FROM {qualified}"))
            .fetch_one(p)
            .await
            .map_err(|e| LotusError::backend_error(e.to_string()))?,
    };
    Ok(count.0)
}
