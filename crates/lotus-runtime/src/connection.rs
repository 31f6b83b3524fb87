use lotus_core::{LotusError, LotusResult};
use lotus_dialect::BackendConnection;
use lotus_schema::BackendPool;

/// Acquire a pooled connection and wrap it as the dialect-agnostic
/// `BackendConnection` the rest of the pipeline (C1, C6) operates on.
pub async fn acquire(pool: &BackendPool) -> LotusResult<BackendConnection> {
    match pool {
        BackendPool::Postgres(p) => p
            .acquire()
            .await
            .map(BackendConnection::Postgres)
            .map_err(|e| LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Postgres, &e))),
        BackendPool::Mysql(p) => p
            .acquire()
            .await
            .map(BackendConnection::Mysql)
            .map_err(|e| LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Mysql, &e))),
        BackendPool::Sqlite(p) => p
            .acquire()
            .await
            .map(BackendConnection::Sqlite)
            .map_err(|e| LotusError::backend_error(lotus_dialect::format_driver_error(lotus_core::DialectKind::Sqlite, &e))),
    }
}

/// Step 4: open the outer transaction session state (C1) and preflight's
/// savepoint (C6) both execute inside.
pub async fn begin(conn: &mut BackendConnection) -> LotusResult<()> {
    let result = match conn {
        BackendConnection::Postgres(c) => sqlx::query("BEGIN").execute(&mut **c).await,
        BackendConnection::Mysql(c) => sqlx::query("BEGIN").execute(&mut **c).await,
        BackendConnection::Sqlite(c) => sqlx::query("BEGIN").execute(&mut **c).await,
    };
    result.map(|_| ()).map_err(|e| LotusError::backend_error(lotus_dialect::format_driver_error(conn.dialect(), &e)))
}

/// Step 8: unconditionally roll back. Read-only means commit and rollback
/// are equally safe, so rollback is simplest and also guarantees any
/// `SET LOCAL` session state (Postgres) reverts with the transaction.
/// Failures here are logged, never propagated — a stuck rollback must
/// not shadow the query's real outcome.
pub async fn rollback(conn: &mut BackendConnection) {
    let result = match conn {
        BackendConnection::Postgres(c) => sqlx::query("ROLLBACK").execute(&mut **c).await,
        BackendConnection::Mysql(c) => sqlx::query("ROLLBACK").execute(&mut **c).await,
        BackendConnection::Sqlite(c) => sqlx::query("ROLLBACK").execute(&mut **c).await,
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to roll back runner transaction");
    }
}
