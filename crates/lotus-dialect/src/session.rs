use lotus_core::{DialectKind, LotusError, LotusResult};
use sqlx::{MySql, Postgres, Sqlite};
use std::future::Future;

/// A pool connection for one of the three supported dialects. Owned for
/// the duration of a single request; never shared across tasks (§5).
pub enum BackendConnection {
    Postgres(sqlx::pool::PoolConnection<Postgres>),
    Mysql(sqlx::pool::PoolConnection<MySql>),
    Sqlite(sqlx::pool::PoolConnection<Sqlite>),
}

impl BackendConnection {
    pub fn dialect(&self) -> DialectKind {
        match self {
            BackendConnection::Postgres(_) => DialectKind::Postgres,
            BackendConnection::Mysql(_) => DialectKind::Mysql,
            BackendConnection::Sqlite(_) => DialectKind::Sqlite,
        }
    }
}

/// Requested session state for one query (§4.1).
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub statement_timeout_ms: u64,
    pub search_path: Option<String>,
}

/// The pre-run state captured so it can be restored verbatim, one variant
/// per dialect's snapshot shape (§4.1, §9 "Session snapshot/restore").
#[derive(Debug, Clone)]
enum SessionSnapshot {
    /// PostgreSQL settings are applied with `SET LOCAL` inside the query's
    /// own transaction, so they revert automatically on commit/rollback —
    /// nothing to snapshot explicitly.
    Postgres,
    Mysql {
        transaction_read_only: String,
        transaction_isolation: String,
        max_execution_time: String,
    },
    Sqlite {
        query_only: bool,
    },
}

/// Apply read-only session state, run `body`, then restore — guaranteed on
/// every exit path including an error or panic-unwind from `body`. This is
/// the scoped-guard idiom from the redesign notes, expressed as a function
/// that owns both halves rather than a `Drop` impl (restoring here is
/// async, which `Drop` cannot express).
pub async fn scoped_read_only<F, Fut, T>(
    conn: &mut BackendConnection,
    opts: &SessionOptions,
    body: F,
) -> LotusResult<T>
where
    F: FnOnce(&mut BackendConnection) -> Fut,
    Fut: Future<Output = LotusResult<T>>,
{
    let snapshot = begin_read_only(conn, opts).await?;
    let outcome = body(conn).await;
    if let Err(restore_err) = end_read_only(conn, snapshot).await {
        tracing::warn!(error = %restore_err, "session restore failed; primary result preserved");
    }
    outcome
}

async fn begin_read_only(conn: &mut BackendConnection, opts: &SessionOptions) -> LotusResult<SessionSnapshot> {
    match conn {
        BackendConnection::Postgres(c) => {
            sqlx::query("SET LOCAL transaction_read_only = on")
                .execute(&mut **c)
                .await
                .map_err(|e| LotusError::backend_error(format_postgres_error(&e)))?;
            sqlx::query(&format!(
                "SET LOCAL statement_timeout = {}",
                opts.statement_timeout_ms
            ))
            .execute(&mut **c)
            .await
            .map_err(|e| LotusError::backend_error(format_postgres_error(&e)))?;
            if let Some(path) = &opts.search_path {
                sqlx::query(&format!("SET LOCAL search_path = {path}"))
                    .execute(&mut **c)
                    .await
                    .map_err(|e| LotusError::backend_error(format_postgres_error(&e)))?;
            }
            Ok(SessionSnapshot::Postgres)
        }
        BackendConnection::Mysql(c) => {
            let row: (String, String, String) = sqlx::query_as(
                "SELECT @@session.transaction_read_only, @@session.transaction_isolation, @@session.max_execution_time",
            )
            .fetch_one(&mut **c)
            .await
            .map_err(|e| LotusError::backend_error(format_mysql_error(&e)))?;
            sqlx::query("SET SESSION transaction_read_only = 1")
                .execute(&mut **c)
                .await
                .map_err(|e| LotusError::backend_error(format_mysql_error(&e)))?;
            sqlx::query(&format!(
                "SET SESSION max_execution_time = {}",
                opts.statement_timeout_ms
            ))
            .execute(&mut **c)
            .await
            .map_err(|e| LotusError::backend_error(format_mysql_error(&e)))?;
            Ok(SessionSnapshot::Mysql {
                transaction_read_only: row.0,
                transaction_isolation: row.1,
                max_execution_time: row.2,
            })
        }
        BackendConnection::Sqlite(c) => {
            let previous: (i64,) = sqlx::query_as("PRAGMA query_only")
                .fetch_one(&mut **c)
                .await
                .unwrap_or((0,));
            // Unsupported on very old SQLite builds; failing to set it is
            // non-fatal, matching "silently skip if unsupported" (§4.1).
            let _ = sqlx::query("PRAGMA query_only = ON").execute(&mut **c).await;
            Ok(SessionSnapshot::Sqlite { query_only: previous.0 != 0 })
        }
    }
}

async fn end_read_only(conn: &mut BackendConnection, snapshot: SessionSnapshot) -> LotusResult<()> {
    match (conn, snapshot) {
        (BackendConnection::Postgres(_), SessionSnapshot::Postgres) => Ok(()),
        (
            BackendConnection::Mysql(c),
            SessionSnapshot::Mysql { transaction_read_only, transaction_isolation, max_execution_time },
        ) => {
            sqlx::query(&format!(
                "SET SESSION transaction_read_only = {transaction_read_only}, \
                 transaction_isolation = '{transaction_isolation}', \
                 max_execution_time = {max_execution_time}"
            ))
            .execute(&mut **c)
            .await
            .map_err(|e| LotusError::backend_error(format_mysql_error(&e)))?;
            Ok(())
        }
        (BackendConnection::Sqlite(c), SessionSnapshot::Sqlite { query_only }) => {
            let value = if query_only { "ON" } else { "OFF" };
            let _ = sqlx::query(&format!("PRAGMA query_only = {value}")).execute(&mut **c).await;
            Ok(())
        }
        _ => Ok(()),
    }
}

pub fn format_postgres_error(err: &sqlx::Error) -> String {
    crate::error_format::format_driver_error(DialectKind::Postgres, err)
}

pub fn format_mysql_error(err: &sqlx::Error) -> String {
    crate::error_format::format_driver_error(DialectKind::Mysql, err)
}
