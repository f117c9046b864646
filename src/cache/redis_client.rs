use anyhow::Result;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, AsyncIter};
use tracing::{debug, info, warn};

use super::{CacheConfig, CacheStore};

/// Redis client over a multiplexed connection manager
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    pub async fn new(config: CacheConfig) -> Result<Self> {
        info!("🔗 Connecting to Redis: {}", config.redis_url);

        let client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(client).await?;

        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis connected");
        Ok(Self { manager, config })
    }

    /// Namespaced key as stored in Redis
    fn make_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(self.make_key(key)).await?;
        match &value {
            Some(_) => debug!("📥 Cache HIT: {}", key),
            None => debug!("❌ Cache MISS: {}", key),
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        let mut conn = self.manager.clone();
        let ttl = if ttl_secs == 0 { self.config.default_ttl } else { ttl_secs };
        redis::cmd("SET")
            .arg(self.make_key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!("💾 Cache SET: {} (TTL {}s)", key, ttl);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn.del(self.make_key(key)).await?;
        debug!("🗑️ Cache DEL: {} ({} removed)", key, removed);
        Ok(())
    }

    async fn clear_by_pattern(&self, pattern: &str) -> Result<u64> {
        let full_pattern = self.make_key(pattern);

        let mut scan_conn = self.manager.clone();
        let keys: Vec<String> = {
            let mut iter: AsyncIter<'_, String> = scan_conn.scan_match(&full_pattern).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.manager.clone();
        let removed: u64 = conn.del(&keys).await?;
        info!("🧹 Cache cleared {} keys matching {}", removed, pattern);
        Ok(removed)
    }

    async fn is_connected(&self) -> bool {
        let mut conn = self.manager.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) => response == "PONG",
            Err(e) => {
                warn!("⚠️ Redis PING failed: {}", e);
                false
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

