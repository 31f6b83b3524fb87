//! Preflight authorization (C6): the key security design decision in
//! Lotus is that it never parses SQL. Instead it asks the engine itself
//! which relations a statement touches, then evaluates those relations
//! against the visibility engine before the real execution proceeds.

pub mod mysql;
pub mod postgres;
pub mod relation;
pub mod sqlite;

pub use relation::TouchedRelation;

use lotus_core::{LotusError, LotusResult, Value};
use lotus_dialect::BackendConnection;
use lotus_policy::VisibilityEngine;

/// Discover the relations `sql` touches (dispatching per dialect), then
/// check every one against `engine`. Returns the relation list on
/// success so the caller (C7) can stash it for the post-processor (C9);
/// returns `BlockedTable` listing the offending relations on denial.
pub async fn authorize(
    conn: &mut BackendConnection,
    sql: &str,
    params: &[Value],
    current_database: &str,
    engine: &VisibilityEngine<'_>,
) -> LotusResult<Vec<TouchedRelation>> {
    let relations = match conn {
        BackendConnection::Postgres(c) => postgres::discover_relations(c, sql, params).await?,
        BackendConnection::Mysql(c) => mysql::discover_relations(c, sql, params, current_database).await?,
        BackendConnection::Sqlite(c) => sqlite::discover_relations(c, sql, params).await?,
    };

    let pairs: Vec<(String, String)> = relations.iter().map(|r| (r.schema.clone(), r.table.clone())).collect();
    let blocked = engine.blocked_relations(&pairs);
    if !blocked.is_empty() {
        tracing::info!(relations = ?blocked, "preflight denied query");
        return Err(LotusError::blocked_table(&blocked));
    }

    Ok(relations)
}
