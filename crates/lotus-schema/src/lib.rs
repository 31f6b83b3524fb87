//! Schema introspection and caching (C3): lists schemas/tables, fetches
//! column metadata per dialect, and caches it with a TTL so the binder
//! (C4) can infer placeholder types without hitting the database on
//! every bind.

pub mod cache;
pub mod column;
pub mod introspect;

pub use cache::SchemaCache;
pub use column::{var_type_for_native, ColumnInfo};
pub use introspect::{connect, get_table_schema, get_table_stats, list_schemas, list_tables, BackendPool};

use lotus_core::{ColumnTypeLookup, VarType};

/// Adapts a `SchemaCache` scoped to one backend into the
/// `lotus_core::ColumnTypeLookup` trait `lotus-binder` consults for
/// automatic type inference. A cache miss is non-fatal (§4.3): it just
/// returns `None`, same as `NoColumnTypes`.
pub struct CachedColumnTypes<'a> {
    pub cache: &'a SchemaCache,
    pub backend: &'a str,
    pub default_schema: &'a str,
}

impl ColumnTypeLookup for CachedColumnTypes<'_> {
    fn column_type(&self, schema: Option<&str>, table: Option<&str>, column: &str) -> Option<VarType> {
        let schema = schema.unwrap_or(self.default_schema);
        let table = table?;
        self.cache.column_type(self.backend, schema, table, column)
    }
}
