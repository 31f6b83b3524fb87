use std::collections::HashSet;
use std::time::{Duration, Instant};

/// A stored result set plus the bookkeeping the store needs: expiry,
/// tags for bulk invalidation, and the encoded size charged against
/// `max_bytes`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Vec<u8>,
    pub tags: HashSet<String>,
    pub size_bytes: usize,
    expires_at: Instant,
}

impl CacheEntry {
    pub fn new(payload: Vec<u8>, ttl: Duration, tags: HashSet<String>) -> Self {
        let size_bytes = payload.len();
        CacheEntry {
            payload,
            tags,
            size_bytes,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn touch(&mut self, ttl: Duration) {
        self.expires_at = Instant::now() + ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_not_expired() {
        let entry = CacheEntry::new(vec![1, 2, 3], Duration::from_secs(60), HashSet::new());
        assert!(!entry.is_expired());
        assert_eq!(entry.size_bytes, 3);
    }

    #[test]
    fn zero_ttl_entry_is_immediately_expired() {
        let entry = CacheEntry::new(vec![], Duration::from_millis(0), HashSet::new());
        std::thread::sleep(Duration::from_millis(5));
        assert!(entry.is_expired());
    }

    #[test]
    fn touch_extends_expiry() {
        let mut entry = CacheEntry::new(vec![], Duration::from_millis(0), HashSet::new());
        std::thread::sleep(Duration::from_millis(5));
        assert!(entry.is_expired());
        entry.touch(Duration::from_secs(60));
        assert!(!entry.is_expired());
    }
}
