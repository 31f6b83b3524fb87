//! The runner (C7): orchestrates C1-C6, C8, C9 for a single query inside
//! a read-only transaction (§4.7). This is the one crate that depends on
//! nearly everything else in the workspace — it is glue, not policy.

pub mod connection;
pub mod execute;
pub mod tags;

use lotus_config::{CompiledConfig, RuleBundle};
use lotus_core::{DialectKind, LotusError, LotusResult, QuerySpec, QueryResult};
use lotus_policy::{apply_column_policy, ColumnOrigin, VisibilityEngine};
use lotus_preflight::TouchedRelation;
use lotus_schema::{BackendPool, CachedColumnTypes, SchemaCache};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

/// How a call interacts with the result cache (§4.8 "Modes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Auto,
    Bypass,
    Refresh,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub deadline: Duration,
    pub cache_mode: CacheMode,
    pub query_id: Option<String>,
    pub cache_ttl: Option<Duration>,
    pub cache_profile: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            deadline: Duration::from_secs(5),
            cache_mode: CacheMode::Auto,
            query_id: None,
            cache_ttl: None,
            cache_profile: None,
        }
    }
}

pub struct Runner {
    config: Arc<CompiledConfig>,
    pools: HashMap<String, BackendPool>,
    schema_cache: Arc<SchemaCache>,
    result_cache: Arc<lotus_cache::CacheStore>,
    lotus_version: String,
}

impl Runner {
    pub fn new(
        config: Arc<CompiledConfig>,
        pools: HashMap<String, BackendPool>,
        schema_cache: Arc<SchemaCache>,
        result_cache: Arc<lotus_cache::CacheStore>,
    ) -> Self {
        Runner {
            config,
            pools,
            schema_cache,
            result_cache,
            lotus_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Run one query end to end (§4.7's ten steps), honoring `opts.deadline`
    /// as a hard ceiling — on expiry the engine-side statement timeout is
    /// expected to fire first, but the runner still bounds its own wait.
    pub async fn run(
        &self,
        backend_name: &str,
        query: &QuerySpec,
        inputs: &HashMap<String, serde_json::Value>,
        opts: &RunOptions,
    ) -> LotusResult<QueryResult> {
        let span = tracing::info_span!("lotus_run", backend = backend_name, query_id = opts.query_id.as_deref());
        let _enter = span.enter();

        tokio::time::timeout(opts.deadline, self.run_inner(backend_name, query, inputs, opts))
            .await
            .unwrap_or_else(|_| Err(LotusError::timeout()))
    }

    async fn run_inner(
        &self,
        backend_name: &str,
        query: &QuerySpec,
        inputs: &HashMap<String, serde_json::Value>,
        opts: &RunOptions,
    ) -> LotusResult<QueryResult> {
        // Step 1: resolve backend and rules.
        let backend_config = self
            .config
            .backend(backend_name)
            .ok_or_else(|| LotusError::unknown_backend(backend_name))?;
        let pool = self
            .pools
            .get(backend_name)
            .ok_or_else(|| LotusError::unknown_backend(backend_name))?;
        let default_bundle = RuleBundle::default();
        let bundle = self.config.rule_bundle(backend_name).unwrap_or(&default_bundle);
        let column_index = self.config.column_index(backend_name);
        let engine = VisibilityEngine::new(backend_config.dialect, bundle, column_index);

        // Step 2: bind variables and transform SQL (C4).
        let default_schema = default_schema_for(backend_config.dialect, query);
        let lookup = CachedColumnTypes {
            cache: &self.schema_cache,
            backend: backend_name,
            default_schema: &default_schema,
        };
        let bound = lotus_binder::bind(query, inputs, backend_config.dialect, &lookup)?;

        // Step 3: deny-list validate (C5), unless write mode is enabled.
        if self.config.raw.read_only {
            lotus_validator::check(&bound.sql)?;
        }

        let search_path = query.search_path.as_deref();
        let params = lotus_cache::CacheParams::List(bound.params.clone());
        let cache_key = lotus_cache::derive_key(backend_name, search_path, &self.lotus_version, &bound.sql, &params);

        let base_tags = tags::automatic_tags(backend_name, opts.query_id.as_deref(), &[]);
        let (ttl, profile_tags) = lotus_cache::resolve_profile(&self.config.raw.cache, opts.cache_profile.as_deref());
        let ttl = opts.cache_ttl.unwrap_or(ttl);
        let mut put_tags = base_tags;
        put_tags.extend(profile_tags);

        let search_path_sql = if backend_config.dialect.supports_search_path() {
            query.search_path.clone().or_else(|| Some(default_schema.clone()))
        } else {
            None
        };
        let statement_timeout_ms = backend_config.statement_timeout_ms;

        match opts.cache_mode {
            CacheMode::Bypass => {
                let (result, _relations) = self
                    .execute_pipeline(pool, &engine, &default_schema, search_path_sql.as_deref(), statement_timeout_ms, &bound)
                    .await?;
                Ok(result)
            }
            CacheMode::Refresh => {
                let (result, relations) = self
                    .execute_pipeline(pool, &engine, &default_schema, search_path_sql.as_deref(), statement_timeout_ms, &bound)
                    .await?;
                let mut all_tags = put_tags;
                all_tags.extend(tags::automatic_tags(backend_name, None, &relations));
                self.store_result(&cache_key, &result, ttl, all_tags).await;
                Ok(result)
            }
            CacheMode::Auto => {
                if let Some(cached) = self.result_cache.get(&cache_key).await {
                    tracing::info!(backend = backend_name, key = %cache_key, "cache hit");
                    return deserialize_result(&cached);
                }
                tracing::info!(backend = backend_name, key = %cache_key, "cache miss");

                let relations_cell: Arc<AsyncMutex<Option<Vec<TouchedRelation>>>> = Arc::new(AsyncMutex::new(None));
                let relations_cell2 = relations_cell.clone();

                let put_opts = lotus_cache::PutOptions { tags: put_tags, max_bytes: None, compress: None };
                let payload = self
                    .result_cache
                    .get_or_store(&cache_key, ttl, put_opts, || async move {
                        let (result, relations) = self
                            .execute_pipeline(
                                pool,
                                &engine,
                                &default_schema,
                                search_path_sql.as_deref(),
                                statement_timeout_ms,
                                &bound,
                            )
                            .await?;
                        *relations_cell2.lock().await = Some(relations);
                        serialize_result(&result)
                    })
                    .await?;

                if let Some(relations) = relations_cell.lock().await.take() {
                    let table_tags = tags::automatic_tags(backend_name, None, &relations);
                    self.result_cache.add_tags(&cache_key, &table_tags).await;
                }

                deserialize_result(&payload)
            }
        }
    }

    /// Steps 4-10: open a read-only session, preflight-authorize, execute,
    /// close the transaction, restore session state (guaranteed), and
    /// post-process rows/columns.
    #[allow(clippy::too_many_arguments)]
    async fn execute_pipeline(
        &self,
        pool: &BackendPool,
        engine: &VisibilityEngine<'_>,
        default_schema: &str,
        search_path_sql: Option<&str>,
        statement_timeout_ms: u64,
        bound: &lotus_binder::BoundQuery,
    ) -> LotusResult<(QueryResult, Vec<TouchedRelation>)> {
        let mut conn = connection::acquire(pool).await?;

        connection::begin(&mut conn).await?;

        let session_opts = lotus_dialect::SessionOptions {
            statement_timeout_ms,
            search_path: search_path_sql.map(|s| s.to_string()),
        };

        let outcome = lotus_dialect::scoped_read_only(&mut conn, &session_opts, |conn| async move {
            let relations = lotus_preflight::authorize(conn, &bound.sql, &bound.params, default_schema, engine).await?;
            let result = execute::execute(conn, &bound.sql, &bound.params).await?;
            Ok((result, relations))
        })
        .await;

        connection::rollback(&mut conn).await;

        let (result, relations) = outcome?;
        let origins = build_origins(&result.columns, &relations);
        let (columns, rows) = apply_column_policy(engine, &origins, result.columns, result.rows)?;

        Ok((
            QueryResult {
                columns,
                rows,
                num_rows: result.num_rows,
                duration_ms: result.duration_ms,
                command: result.command,
                meta: result.meta,
                window: result.window,
            },
            relations,
        ))
    }

    async fn store_result(&self, key: &str, result: &QueryResult, ttl: Duration, tags: HashSet<String>) {
        match serialize_result(result) {
            Ok(payload) => {
                self.result_cache
                    .put(key, payload, ttl, lotus_cache::PutOptions { tags, max_bytes: None, compress: None })
                    .await;
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize result for cache"),
        }
    }
}

fn default_schema_for(dialect: DialectKind, query: &QuerySpec) -> String {
    if let Some(first) = query.search_path_elements().first() {
        return (*first).to_string();
    }
    match dialect {
        DialectKind::Postgres => "public".to_string(),
        DialectKind::Sqlite => "main".to_string(),
        _ => String::new(),
    }
}

/// Column provenance from a single touched relation is unambiguous; with
/// a join across several, a column rule can still apply by bare name
/// (`ColumnPolicyIndex::resolve_bare`), so origins fall back to unscoped
/// rather than guessing which side of the join a column came from.
fn build_origins(columns: &[String], relations: &[TouchedRelation]) -> Vec<ColumnOrigin> {
    match relations {
        [one] => columns.iter().map(|c| ColumnOrigin::scoped(c.clone(), one.schema.clone(), one.table.clone())).collect(),
        _ => columns.iter().map(|c| ColumnOrigin::unscoped(c.clone())).collect(),
    }
}

fn serialize_result(result: &QueryResult) -> LotusResult<Vec<u8>> {
    serde_json::to_vec(result).map_err(|e| LotusError::backend_error(format!("cache encode error: {e}")))
}

fn deserialize_result(payload: &[u8]) -> LotusResult<QueryResult> {
    serde_json::from_slice(payload).map_err(|e| LotusError::backend_error(format!("cache decode error: {e}")))
}
