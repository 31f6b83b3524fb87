//! Immutable, process-wide configuration: backend descriptors, visibility
//! rules, and the cache profile table. Regex patterns are compiled once at
//! `LotusConfig::compile` and rejected with a load-time error if invalid.

pub mod builtins;
pub mod config;
pub mod pattern;
pub mod rules;

pub use builtins::{builtin_schema_rules, builtin_table_rules};
pub use config::{BackendConfig, CacheConfig, CacheProfile, CompiledConfig, ConfigError, LotusConfig, RuleBundle};
pub use pattern::Pattern;
pub use rules::{ColumnAction, ColumnPolicyIndex, ColumnRule, MaskStrategy, SchemaRules, TableRule, TableRules};
