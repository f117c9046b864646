//! Cache configuration
//!
//! Connection settings and the TTLs used by the read-through wrappers.

use serde::{Deserialize, Serialize};

/// Hierarchy trees change rarely
pub const HIERARCHY_TTL_SECS: u64 = 600;
/// Fleet, document and compliance aggregates
pub const AGGREGATE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub redis_url: String,
    pub default_ttl: u64,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            default_ttl: AGGREGATE_TTL_SECS,
            key_prefix: "fleet".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn with_url(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            ..Self::default()
        }
    }
}
