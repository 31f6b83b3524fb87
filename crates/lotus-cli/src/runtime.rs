//! Shared startup path for every subcommand that needs a live `Runner`:
//! load config, connect one pool per backend, and wire up the two caches.

use anyhow::{Context, Result};
use lotus_config::{CompiledConfig, LotusConfig};
use lotus_runtime::Runner;
use lotus_schema::{BackendPool, SchemaCache};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub fn load_config(path: &Path) -> Result<CompiledConfig> {
    let raw = LotusConfig::from_file(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    raw.compile().context("config failed validation")
}

pub async fn connect_pools(config: &CompiledConfig) -> Result<HashMap<String, BackendPool>> {
    let mut pools = HashMap::new();
    for (name, backend) in &config.raw.backends {
        let url = backend
            .resolve_connection_url()
            .with_context(|| format!("backend '{name}' has no usable connection URL"))?;
        let pool = lotus_schema::connect(backend.dialect, &url, backend.pool_size)
            .await
            .with_context(|| format!("failed to connect to backend '{name}'"))?;
        pools.insert(name.clone(), pool);
    }
    Ok(pools)
}

pub async fn build_runner(config_path: &Path) -> Result<(Arc<CompiledConfig>, Runner)> {
    let config = Arc::new(load_config(config_path)?);
    let pools = connect_pools(&config).await?;
    let schema_cache = Arc::new(SchemaCache::with_default_ttl());
    let result_cache = Arc::new(lotus_cache::CacheStore::from_config(&config.raw.cache));
    let runner = Runner::new(config.clone(), pools, schema_cache, result_cache);
    Ok((config, runner))
}
