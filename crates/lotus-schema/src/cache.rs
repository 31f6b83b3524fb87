use crate::column::ColumnInfo;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry {
    columns: Vec<ColumnInfo>,
    expires_at: Instant,
}

/// Process-wide `(backend, schema, table) -> columns` cache with a TTL
/// (§4.3, default 5 minutes). Guarded by a `std::sync::RwLock`, matching
/// the teacher's preference for an explicit lock type over an ad hoc
/// `Mutex<HashMap<..>>` (§5).
pub struct SchemaCache {
    ttl: Duration,
    entries: RwLock<HashMap<(String, String, String), Entry>>,
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }

    pub fn get(&self, backend: &str, schema: &str, table: &str) -> Option<Vec<ColumnInfo>> {
        let key = (backend.to_string(), schema.to_string(), table.to_string());
        let entries = self.entries.read().unwrap();
        let entry = entries.get(&key)?;
        if entry.expires_at < Instant::now() {
            return None;
        }
        Some(entry.columns.clone())
    }

    pub fn put(&self, backend: &str, schema: &str, table: &str, columns: Vec<ColumnInfo>) {
        let key = (backend.to_string(), schema.to_string(), table.to_string());
        let mut entries = self.entries.write().unwrap();
        entries.insert(key, Entry { columns, expires_at: Instant::now() + self.ttl });
    }

    /// Out-of-band DDL invalidation signal (§3: "invalidated on DDL
    /// signal, out of band").
    pub fn invalidate(&self, backend: &str, schema: &str, table: &str) {
        let key = (backend.to_string(), schema.to_string(), table.to_string());
        self.entries.write().unwrap().remove(&key);
    }

    pub fn column_type(&self, backend: &str, schema: &str, table: &str, column: &str) -> Option<lotus_core::VarType> {
        self.get(backend, schema, table)?
            .into_iter()
            .find(|c| c.name == column)
            .map(|c| c.var_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotus_core::VarType;

    fn col(name: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            native_type: "text".to_string(),
            var_type: VarType::Text,
            nullable: true,
            default: None,
            primary_key: false,
            visibility: None,
        }
    }

    #[test]
    fn miss_then_hit_after_put() {
        let cache = SchemaCache::with_default_ttl();
        assert!(cache.get("pg", "public", "users").is_none());
        cache.put("pg", "public", "users", vec![col("id")]);
        assert!(cache.get("pg", "public", "users").is_some());
    }

    #[test]
    fn expired_entry_reports_miss() {
        let cache = SchemaCache::new(Duration::from_millis(1));
        cache.put("pg", "public", "users", vec![col("id")]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("pg", "public", "users").is_none());
    }

    #[test]
    fn invalidate_clears_entry() {
        let cache = SchemaCache::with_default_ttl();
        cache.put("pg", "public", "users", vec![col("id")]);
        cache.invalidate("pg", "public", "users");
        assert!(cache.get("pg", "public", "users").is_none());
    }
}
