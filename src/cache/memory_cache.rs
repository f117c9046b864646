use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{glob_to_regex, CacheStore};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache with the same TTL and pattern semantics as Redis
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // expired: drop it
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear_by_pattern(&self, pattern: &str) -> Result<u64> {
        let matcher = glob_to_regex(pattern)?;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !matcher.is_match(key));
        Ok((before - entries.len()) as u64)
    }

    async fn is_connected(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del_round_trip() {
        let cache = MemoryCache::new();
        cache.set("key", "val".into(), 60).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some("val".to_string()));

        cache.del("key").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_entry_is_never_returned() {
        let cache = MemoryCache::new();
        cache.set("short", "v".into(), 0).await.unwrap();
        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_clear_by_pattern_only_removes_matches() {
        let cache = MemoryCache::new();
        cache.set("vendor_hierarchy_a", "1".into(), 60).await.unwrap();
        cache.set("vendor_hierarchy_b", "2".into(), 60).await.unwrap();
        cache.set("fleet_stats_a", "3".into(), 60).await.unwrap();

        let removed = cache.clear_by_pattern("vendor_hierarchy_*").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get("fleet_stats_a").await.unwrap(), Some("3".to_string()));
        assert_eq!(cache.get("vendor_hierarchy_a").await.unwrap(), None);
    }
}
