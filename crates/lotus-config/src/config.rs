use crate::rules::{ColumnPolicyIndex, ColumnRule, SchemaRules, TableRules};
use lotus_core::DialectKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    pub dialect: DialectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_url_env: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

fn default_pool_size() -> u32 {
    5
}

fn default_statement_timeout_ms() -> u64 {
    5_000
}

impl BackendConfig {
    /// Resolve the connection string: explicit field, then named env var,
    /// then a backend-specific default env var, mirroring the teacher's
    /// `build_database_url()` fallback chain.
    pub fn resolve_connection_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.connection_url {
            return Ok(url.clone());
        }
        if let Some(env_var) = &self.connection_url_env {
            if let Ok(url) = env::var(env_var) {
                return Ok(url);
            }
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            return Ok(url);
        }
        Err(ConfigError::Config(format!(
            "no connection URL configured for backend '{}'",
            self.name
        )))
    }
}

fn default_cache_ttl_ms() -> u64 {
    60_000
}

fn default_cache_max_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_lock_wait_timeout_ms() -> u64 {
    30_000
}

/// A named set of cache defaults, selectable per call (§4.8 "Profiles").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheProfile {
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub profiles: HashMap<String, CacheProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    #[serde(default = "default_cache_ttl_ms")]
    pub default_ttl_ms: u64,
    #[serde(default = "default_cache_max_bytes")]
    pub max_bytes: u64,
    #[serde(default)]
    pub compress: bool,
    #[serde(default = "default_lock_wait_timeout_ms")]
    pub lock_wait_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            profiles: HashMap::new(),
            default_profile: None,
            default_ttl_ms: default_cache_ttl_ms(),
            max_bytes: default_cache_max_bytes(),
            compress: false,
            lock_wait_timeout_ms: default_lock_wait_timeout_ms(),
        }
    }
}

fn default_page_size() -> u64 {
    1000
}

fn default_read_only() -> bool {
    true
}

/// Per-backend rule bundle, keyed in `LotusConfig` with a `"default"`
/// fallback for backends that don't have their own entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleBundle {
    #[serde(default)]
    pub schema_rules: SchemaRules,
    #[serde(default)]
    pub table_rules: TableRules,
    #[serde(default)]
    pub column_rules: Vec<ColumnRule>,
}

/// Immutable, process-wide configuration. Validated once at startup;
/// lookups at runtime are pure (§4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotusConfig {
    pub backends: HashMap<String, BackendConfig>,
    pub default_backend: String,
    #[serde(default)]
    pub rules: HashMap<String, RuleBundle>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_read_only")]
    pub read_only: bool,
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
}

/// The compiled, load-time-validated form of a `LotusConfig`: regex
/// patterns are already compiled and column rules are already indexed.
/// Constructed once via `LotusConfig::compile` and then never mutated.
pub struct CompiledConfig {
    pub raw: LotusConfig,
    column_indexes: HashMap<String, ColumnPolicyIndex>,
}

impl CompiledConfig {
    pub fn column_index(&self, backend: &str) -> &ColumnPolicyIndex {
        self.column_indexes
            .get(backend)
            .or_else(|| self.column_indexes.get("default"))
            .unwrap_or_else(|| self.column_indexes.get("__empty__").expect("empty index seeded"))
    }

    pub fn rule_bundle(&self, backend: &str) -> Option<&RuleBundle> {
        self.raw.rules.get(backend).or_else(|| self.raw.rules.get("default"))
    }

    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.raw.backends.get(name)
    }
}

impl LotusConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate and compile: every regex pattern, every column rule
    /// normalized into its precedence index, `default_backend` must exist.
    /// Fails closed on the first error encountered, naming it.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        if !self.backends.contains_key(&self.default_backend) {
            return Err(ConfigError::Config(format!(
                "default_backend '{}' is not a configured backend",
                self.default_backend
            )));
        }

        let mut column_indexes = HashMap::new();
        column_indexes.insert("__empty__".to_string(), ColumnPolicyIndex::default());
        for (backend, bundle) in &self.rules {
            let index = ColumnPolicyIndex::build(&bundle.column_rules);
            column_indexes.insert(backend.clone(), index);
        }

        Ok(CompiledConfig {
            raw: self,
            column_indexes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
default_backend: main
backends:
  main:
    name: main
    dialect: postgres
    connection_url: "postgres://localhost/app"
rules:
  default:
    column_rules:
      - table: users
        column: email
        action: mask
        strategy:
          type: partial
          keep_last: 4
"#
    }

    #[test]
    fn parses_and_compiles_minimal_config() {
        let config = LotusConfig::from_yaml(sample_yaml()).unwrap();
        let compiled = config.compile().unwrap();
        assert_eq!(compiled.raw.default_backend, "main");
        assert!(compiled.backend("main").is_some());
    }

    #[test]
    fn rejects_unknown_default_backend() {
        let yaml = "default_backend: missing\nbackends: {}\n";
        let config = LotusConfig::from_yaml(yaml).unwrap();
        assert!(config.compile().is_err());
    }

    #[test]
    fn connection_url_env_fallback() {
        let backend = BackendConfig {
            name: "main".into(),
            dialect: DialectKind::Postgres,
            connection_url: None,
            connection_url_env: Some("LOTUS_TEST_DB_URL_UNSET_XYZ".into()),
            pool_size: 5,
            statement_timeout_ms: 5000,
        };
        assert!(backend.resolve_connection_url().is_err());
    }
}
