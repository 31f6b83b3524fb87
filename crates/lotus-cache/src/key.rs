use lotus_core::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// The parameter shape a call was made with. List and map inputs with
/// the same underlying values must hash to *different* keys (§4.8), so
/// canonicalization tags the shape rather than flattening it away.
#[derive(Debug, Clone)]
pub enum CacheParams {
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl CacheParams {
    fn canonical(&self) -> String {
        match self {
            CacheParams::List(values) => {
                let json: Vec<serde_json::Value> = values.iter().map(Value::as_json).collect();
                format!("L:{}", serde_json::Value::Array(json))
            }
            CacheParams::Map(map) => {
                // BTreeMap already iterates in sorted key order.
                let json: serde_json::Map<String, serde_json::Value> =
                    map.iter().map(|(k, v)| (k.clone(), v.as_json())).collect();
                format!("M:{}", serde_json::Value::Object(json))
            }
        }
    }
}

/// `key = sha256(backend || search_path || lotus_version || sql ||
/// canonical(params))`, rendered as `"result:<backend>:<hex>"` (§4.8).
pub fn derive_key(
    backend_name: &str,
    search_path: Option<&str>,
    lotus_version: &str,
    sql: &str,
    params: &CacheParams,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(backend_name.as_bytes());
    hasher.update(b"\x01");
    hasher.update(search_path.unwrap_or("").as_bytes());
    hasher.update(b"\x01");
    hasher.update(lotus_version.as_bytes());
    hasher.update(b"\x01");
    hasher.update(sql.as_bytes());
    hasher.update(b"\x01");
    hasher.update(params.canonical().as_bytes());
    let hex: String = hasher.finalize().iter().map(|b| format!("{b:02x}")).collect();
    format!("result:{backend_name}:{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_calls_hash_identically() {
        let params = CacheParams::List(vec![Value::Integer(1)]);
        let a = derive_key("main", None, "0.1.0", "SELECT 1", &params);
        let b = derive_key("main", None, "0.1.0", "SELECT 1", &params);
        assert_eq!(a, b);
    }

    #[test]
    fn different_sql_changes_key() {
        let params = CacheParams::List(vec![]);
        let a = derive_key("main", None, "0.1.0", "SELECT 1", &params);
        let b = derive_key("main", None, "0.1.0", "SELECT 2", &params);
        assert_ne!(a, b);
    }

    #[test]
    fn different_search_path_changes_key() {
        let params = CacheParams::List(vec![]);
        let a = derive_key("main", Some("tenant_a"), "0.1.0", "SELECT 1", &params);
        let b = derive_key("main", Some("tenant_b"), "0.1.0", "SELECT 1", &params);
        assert_ne!(a, b);
    }

    #[test]
    fn list_and_map_with_same_values_hash_differently() {
        let list = CacheParams::List(vec![Value::Text("x".into())]);
        let mut map = BTreeMap::new();
        map.insert("0".to_string(), Value::Text("x".into()));
        let map = CacheParams::Map(map);
        let a = derive_key("main", None, "0.1.0", "SELECT 1", &list);
        let b = derive_key("main", None, "0.1.0", "SELECT 1", &map);
        assert_ne!(a, b);
    }

    #[test]
    fn key_has_expected_prefix_shape() {
        let params = CacheParams::List(vec![]);
        let key = derive_key("main", None, "0.1.0", "SELECT 1", &params);
        assert!(key.starts_with("result:main:"));
        assert_eq!(key.len(), "result:main:".len() + 64);
    }
}
