//! Cache
//!
//! Key/value stores with TTL and glob-pattern deletion. Values are JSON
//! strings; typed access goes through `services::cache_service`.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

pub mod cache_config;
pub mod memory_cache;
pub mod redis_client;

pub use cache_config::{CacheConfig, AGGREGATE_TTL_SECS, HIERARCHY_TTL_SECS};
pub use memory_cache::MemoryCache;
pub use redis_client::RedisClient;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()>;
    async fn del(&self, key: &str) -> Result<()>;
    /// Delete every key matching a Redis-style glob (`*`, `?`). Returns the
    /// number of keys removed.
    async fn clear_by_pattern(&self, pattern: &str) -> Result<u64>;
    async fn is_connected(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

/// Compile a Redis glob into an anchored regex
pub fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Ok(Regex::new(&expr)?)
}
