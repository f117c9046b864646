//! Read-through cache
//!
//! Wraps an optional `CacheStore`. Every cache failure is logged, counted and
//! treated as a miss: callers always get the freshly computed value when the
//! cache misbehaves, never a cache error.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{CacheStore, AGGREGATE_TTL_SECS, HIERARCHY_TTL_SECS};
use crate::models::EntityType;
use crate::utils::errors::AppResult;
use crate::utils::metrics::{CACHE_ERRORS, CACHE_HITS, CACHE_MISSES};

pub fn hierarchy_key(vendor_id: Uuid) -> String {
    format!("vendor_hierarchy_{}", vendor_id)
}

pub fn fleet_stats_key(vendor_id: Uuid) -> String {
    format!("fleet_stats_{}", vendor_id)
}

pub fn compliance_key(vendor_id: Uuid) -> String {
    format!("compliance_report_{}", vendor_id)
}

pub fn document_status_key(entity_type: EntityType, entity_id: Uuid) -> String {
    format!("document_status_{}_{}", entity_type.as_str().to_lowercase(), entity_id)
}

#[derive(Clone, Default)]
pub struct CacheService {
    store: Option<Arc<dyn CacheStore>>,
}

impl CacheService {
    pub fn new(store: Option<Arc<dyn CacheStore>>) -> Self {
        Self { store }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.as_ref().map(|s| s.backend_name()).unwrap_or("disabled")
    }

    pub async fn is_connected(&self) -> bool {
        match &self.store {
            Some(store) => store.is_connected().await,
            None => false,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("⚠️ Discarding undecodable cache entry {}: {}", key, e);
                    CACHE_ERRORS.inc();
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("⚠️ Cache read failed for {}: {}", key, e);
                CACHE_ERRORS.inc();
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("⚠️ Could not serialize cache value for {}: {}", key, e);
                CACHE_ERRORS.inc();
                return;
            }
        };
        if let Err(e) = store.set(key, raw, ttl_secs).await {
            warn!("⚠️ Cache write failed for {}: {}", key, e);
            CACHE_ERRORS.inc();
        }
    }

    pub async fn del(&self, key: &str) {
        if let Some(store) = self.store.as_ref() {
            if let Err(e) = store.del(key).await {
                warn!("⚠️ Cache delete failed for {}: {}", key, e);
                CACHE_ERRORS.inc();
            }
        }
    }

    pub async fn clear_by_pattern(&self, pattern: &str) -> u64 {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };
        match store.clear_by_pattern(pattern).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!("⚠️ Cache pattern clear failed for {}: {}", pattern, e);
                CACHE_ERRORS.inc();
                0
            }
        }
    }

    /// Return the cached value for `key`, or run `compute`, store its result
    /// with `ttl_secs` and return it. Concurrent misses each compute.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl_secs: u64, compute: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            debug!("📥 Read-through HIT: {}", key);
            CACHE_HITS.inc();
            return Ok(cached);
        }

        if self.is_enabled() {
            CACHE_MISSES.inc();
        }
        let value = compute().await?;
        self.set(key, &value, ttl_secs).await;
        Ok(value)
    }

    pub async fn cache_vendor_hierarchy<T, F, Fut>(&self, vendor_id: Uuid, compute: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.get_or_compute(&hierarchy_key(vendor_id), HIERARCHY_TTL_SECS, compute)
            .await
    }

    pub async fn cache_fleet_stats<T, F, Fut>(&self, vendor_id: Uuid, compute: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.get_or_compute(&fleet_stats_key(vendor_id), AGGREGATE_TTL_SECS, compute)
            .await
    }

    /// Drop every cached vendor tree. Used when a whole subtree moves.
    pub async fn clear_vendor_hierarchies(&self) -> u64 {
        let removed = self.clear_by_pattern("vendor_hierarchy_*").await;
        debug!("🧹 Cleared {} cached vendor trees", removed);
        removed
    }

    /// Drop every aggregate derived from a vendor's fleet and documents
    pub async fn invalidate_vendor_aggregates(&self, vendor_id: Uuid) {
        self.del(&fleet_stats_key(vendor_id)).await;
        self.del(&compliance_key(vendor_id)).await;
    }

    pub async fn invalidate_document_status(&self, entity_type: EntityType, entity_id: Uuid) {
        self.del(&document_status_key(entity_type, entity_id)).await;
    }
}
