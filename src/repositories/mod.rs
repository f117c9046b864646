//! Repositories
//!
//! One trait per collection. `Pg*` implementations talk to PostgreSQL through
//! SQLx; the `memory` implementations back development runs without a database
//! and the test-suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Document, DocumentType, Driver, EntityType, Vehicle, Vendor, VendorType};
use crate::utils::errors::{AppError, AppResult};

pub mod document_repository;
pub mod driver_repository;
pub mod memory;
pub mod vehicle_repository;
pub mod vendor_repository;

pub use document_repository::PgDocumentRepository;
pub use driver_repository::PgDriverRepository;
pub use vehicle_repository::PgVehicleRepository;
pub use vendor_repository::PgVendorRepository;

#[async_trait]
pub trait VendorRepository: Send + Sync {
    async fn create(&self, vendor: &Vendor) -> AppResult<Vendor>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vendor>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Vendor>>;
    /// Direct children of `parent_id` restricted to `types`
    async fn find_children(&self, parent_id: Uuid, types: &[VendorType]) -> AppResult<Vec<Vendor>>;
    async fn update(&self, vendor: &Vendor) -> AppResult<Vendor>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn find_by_registration(&self, registration_number: &str) -> AppResult<Option<Vehicle>>;
    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Vehicle>>;
    async fn update(&self, vehicle: &Vehicle) -> AppResult<Vehicle>;
    async fn set_assigned_driver(&self, vehicle_id: Uuid, driver_id: Option<Uuid>) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait DriverRepository: Send + Sync {
    async fn create(&self, driver: &Driver) -> AppResult<Driver>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Driver>>;
    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Driver>>;
    async fn update(&self, driver: &Driver) -> AppResult<Driver>;
    async fn set_assigned_vehicle(&self, driver_id: Uuid, vehicle_id: Option<Uuid>) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &Document) -> AppResult<Document>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>>;
    async fn find_for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<Vec<Document>>;
    async fn find_by_entity_and_type(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        document_type: DocumentType,
    ) -> AppResult<Option<Document>>;
    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Document>>;
    /// Documents with an expiry on or before `cutoff`, already expired ones included
    async fn find_expiring_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<Vec<Document>>;
    /// Documents whose stored status is not EXPIRED although their expiry has passed
    async fn find_stale_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<Document>>;
    async fn update(&self, document: &Document) -> AppResult<Document>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn delete_for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<u64>;
    async fn count(&self) -> AppResult<i64>;
}

/// The four stores used by the services, plus the pool when they are
/// PostgreSQL-backed
#[derive(Clone)]
pub struct Repositories {
    pub vendors: Arc<dyn VendorRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub drivers: Arc<dyn DriverRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub pool: Option<PgPool>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            vendors: Arc::new(PgVendorRepository::new(pool.clone())),
            vehicles: Arc::new(PgVehicleRepository::new(pool.clone())),
            drivers: Arc::new(PgDriverRepository::new(pool.clone())),
            documents: Arc::new(PgDocumentRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            vendors: Arc::new(memory::InMemoryVendorRepository::new()),
            vehicles: Arc::new(memory::InMemoryVehicleRepository::new()),
            drivers: Arc::new(memory::InMemoryDriverRepository::new()),
            documents: Arc::new(memory::InMemoryDocumentRepository::new()),
            pool: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Store reachability; the in-memory store is always up
    pub async fn is_healthy(&self) -> bool {
        match &self.pool {
            Some(pool) => crate::database::connection::ping(pool).await,
            None => true,
        }
    }
}

/// Translate unique-constraint violations into 409s, everything else stays a
/// database error.
pub(crate) fn map_write_error(err: sqlx::Error, resource: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return AppError::Conflict(format!("{} already exists", resource));
        }
    }
    AppError::Database(err)
}
