use crate::entry::CacheEntry;
use lotus_core::LotusResult;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, RwLock};

/// Per-call overrides for a `put`/`get_or_store`; anything left `None`
/// falls back to the store's configured defaults (§4.8 "Profiles").
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub tags: HashSet<String>,
    pub max_bytes: Option<u64>,
    pub compress: Option<bool>,
}

/// Content-addressed result cache: a main entry map, a secondary tag
/// index for bulk invalidation, and a per-key single-flight lock table
/// so concurrent misses on the same key coalesce into one computation
/// (§4.8). Lock types are explicit, matching `SchemaCache`'s style.
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    tags: RwLock<HashMap<String, HashSet<String>>>,
    locks: std::sync::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    default_ttl: Duration,
    max_bytes: u64,
    compress: bool,
    lock_wait_timeout: Duration,
}

impl CacheStore {
    pub fn new(default_ttl: Duration, max_bytes: u64, compress: bool, lock_wait_timeout: Duration) -> Self {
        CacheStore {
            entries: RwLock::new(HashMap::new()),
            tags: RwLock::new(HashMap::new()),
            locks: std::sync::Mutex::new(HashMap::new()),
            default_ttl,
            max_bytes,
            compress,
            lock_wait_timeout,
        }
    }

    /// Compression has no grounding anywhere in the reference corpus, so
    /// the `compress` flag is honored for accounting purposes but the
    /// encoding itself is currently the identity transform.
    fn encode(&self, payload: Vec<u8>, _compress: bool) -> Vec<u8> {
        payload
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if !entry.is_expired() {
                    return Some(entry.payload.clone());
                }
            } else {
                return None;
            }
        }
        // Lazy expiration: drop it now that we know it's stale.
        self.delete(key).await;
        None
    }

    pub async fn put(&self, key: &str, payload: Vec<u8>, ttl: Duration, opts: PutOptions) {
        let max_bytes = opts.max_bytes.unwrap_or(self.max_bytes);
        let compress = opts.compress.unwrap_or(self.compress);
        let encoded = self.encode(payload, compress);
        if encoded.len() as u64 > max_bytes {
            tracing::debug!(key, size = encoded.len(), max_bytes, "cache entry exceeds max_bytes, skipping put");
            return;
        }

        let entry = CacheEntry::new(encoded, ttl, opts.tags.clone());
        self.entries.write().await.insert(key.to_string(), entry);

        if !opts.tags.is_empty() {
            let mut tag_index = self.tags.write().await;
            for tag in &opts.tags {
                tag_index.entry(tag.clone()).or_default().insert(key.to_string());
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        let removed = self.entries.write().await.remove(key);
        if let Some(entry) = removed {
            if !entry.tags.is_empty() {
                let mut tag_index = self.tags.write().await;
                for tag in &entry.tags {
                    if let Some(keys) = tag_index.get_mut(tag) {
                        keys.remove(key);
                    }
                }
            }
        }
    }

    pub async fn touch(&self, key: &str, ttl: Duration) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.touch(ttl);
                true
            }
            _ => false,
        }
    }

    /// Merge extra tags onto a live entry — used when a tag (e.g. the
    /// touched-table tag) is only known after the value that fills the
    /// entry has already been computed. A no-op if the entry is gone.
    pub async fn add_tags(&self, key: &str, tags: &HashSet<String>) {
        if tags.is_empty() {
            return;
        }
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.tags.extend(tags.iter().cloned());
        drop(entries);

        let mut tag_index = self.tags.write().await;
        for tag in tags {
            tag_index.entry(tag.clone()).or_default().insert(key.to_string());
        }
    }

    pub async fn invalidate_tags(&self, tags: &[String]) {
        let keys: HashSet<String> = {
            let tag_index = self.tags.read().await;
            tags.iter()
                .filter_map(|tag| tag_index.get(tag))
                .flat_map(|keys| keys.iter().cloned())
                .collect()
        };
        for key in &keys {
            self.delete(key).await;
        }
    }

    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        locks.entry(key.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Single-flight fetch-or-compute. On a miss, concurrent callers on
    /// the same key block on one computation; a caller that can't
    /// acquire the slot within `lock_wait_timeout` falls back to
    /// computing the value itself rather than failing (§4.8).
    pub async fn get_or_store<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        opts: PutOptions,
        compute: F,
    ) -> LotusResult<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LotusResult<Vec<u8>>>,
    {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }

        let lock = self.lock_for(key);
        let acquired = tokio::time::timeout(self.lock_wait_timeout, lock.lock()).await;
        let slot = match acquired {
            Ok(g) => Some(g),
            Err(_) => {
                tracing::debug!(key, "cache single-flight lock timed out, computing independently");
                None
            }
        };

        if slot.is_some() {
            if let Some(hit) = self.get(key).await {
                return Ok(hit);
            }
        }

        let value = compute().await?;
        self.put(key, value.clone(), ttl, opts).await;
        Ok(value)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
