//! Result cache (C8): a content-addressed, tag-invalidatable cache for
//! query results, sitting in front of the runner's execute step.

pub mod entry;
pub mod key;
pub mod store;

pub use entry::CacheEntry;
pub use key::{derive_key, CacheParams};
pub use store::{CacheStore, PutOptions};

use lotus_config::CacheConfig;
use std::time::Duration;

impl CacheStore {
    /// Build a store from the compiled `[cache]` section, applying the
    /// configured defaults for TTL, size limit, compression and the
    /// single-flight lock-wait deadline.
    pub fn from_config(config: &CacheConfig) -> Self {
        CacheStore::new(
            Duration::from_millis(config.default_ttl_ms),
            config.max_bytes,
            config.compress,
            Duration::from_millis(config.lock_wait_timeout_ms),
        )
    }
}

/// Resolve a named profile's TTL and base tags, falling back to the
/// cache's defaults when no profile name is given or it isn't found.
pub fn resolve_profile(config: &CacheConfig, profile: Option<&str>) -> (Duration, Vec<String>) {
    let name = profile.or(config.default_profile.as_deref());
    match name.and_then(|n| config.profiles.get(n)) {
        Some(p) => (Duration::from_millis(p.ttl_ms), p.tags.clone()),
        None => (Duration::from_millis(config.default_ttl_ms), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with_profile() -> CacheConfig {
        let mut profiles = HashMap::new();
        profiles.insert(
            "short".to_string(),
            lotus_config::CacheProfile { ttl_ms: 1_000, tags: vec!["short".to_string()] },
        );
        CacheConfig {
            namespace: "test".to_string(),
            profiles,
            default_profile: None,
            default_ttl_ms: 60_000,
            max_bytes: 1024,
            compress: false,
            lock_wait_timeout_ms: 5_000,
        }
    }

    #[test]
    fn resolve_named_profile() {
        let config = config_with_profile();
        let (ttl, tags) = resolve_profile(&config, Some("short"));
        assert_eq!(ttl, Duration::from_millis(1_000));
        assert_eq!(tags, vec!["short".to_string()]);
    }

    #[test]
    fn falls_back_to_defaults_when_profile_missing() {
        let config = config_with_profile();
        let (ttl, tags) = resolve_profile(&config, Some("nonexistent"));
        assert_eq!(ttl, Duration::from_millis(60_000));
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn from_config_builds_usable_store() {
        let config = config_with_profile();
        let store = CacheStore::from_config(&config);
        store.put("k", b"v".to_vec(), Duration::from_secs(1), PutOptions::default()).await;
        assert_eq!(store.get("k").await, Some(b"v".to_vec()));
    }
}
