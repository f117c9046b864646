//! In-memory repositories
//!
//! Used when no `DATABASE_URL` is configured and by the tests. Uniqueness rules
//! mirror the PostgreSQL constraints so both backends answer with the same
//! conflicts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentRepository, DriverRepository, VehicleRepository, VendorRepository};
use crate::models::{Document, DocumentStatus, DocumentType, Driver, EntityType, Vehicle, Vendor, VendorType};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Default)]
pub struct InMemoryVendorRepository {
    vendors: RwLock<HashMap<Uuid, Vendor>>,
}

impl InMemoryVendorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VendorRepository for InMemoryVendorRepository {
    async fn create(&self, vendor: &Vendor) -> AppResult<Vendor> {
        let mut vendors = self.vendors.write().await;
        if vendors.values().any(|v| v.email == vendor.email) {
            return Err(AppError::Conflict("Vendor email already exists".to_string()));
        }
        vendors.insert(vendor.id, vendor.clone());
        Ok(vendor.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vendor>> {
        Ok(self.vendors.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Vendor>> {
        let email = email.trim().to_lowercase();
        Ok(self.vendors.read().await.values().find(|v| v.email == email).cloned())
    }

    async fn find_children(&self, parent_id: Uuid, types: &[VendorType]) -> AppResult<Vec<Vendor>> {
        let mut children: Vec<Vendor> = self
            .vendors
            .read()
            .await
            .values()
            .filter(|v| v.parent_vendor == Some(parent_id) && types.contains(&v.vendor_type))
            .cloned()
            .collect();
        children.sort_by_key(|v| v.created_at);
        Ok(children)
    }

    async fn update(&self, vendor: &Vendor) -> AppResult<Vendor> {
        let mut vendors = self.vendors.write().await;
        let stored = vendors
            .get_mut(&vendor.id)
            .ok_or_else(|| not_found_error("Vendor", vendor.id))?;
        *stored = Vendor {
            updated_at: Utc::now(),
            ..vendor.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.vendors.write().await.remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.vendors.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryVehicleRepository {
    vehicles: RwLock<HashMap<Uuid, Vehicle>>,
}

impl InMemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let mut vehicles = self.vehicles.write().await;
        if vehicles
            .values()
            .any(|v| v.registration_number == vehicle.registration_number)
        {
            return Err(AppError::Conflict(
                "Vehicle registration number already exists".to_string(),
            ));
        }
        vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.vehicles.read().await.get(&id).cloned())
    }

    async fn find_by_registration(&self, registration_number: &str) -> AppResult<Option<Vehicle>> {
        Ok(self
            .vehicles
            .read()
            .await
            .values()
            .find(|v| v.registration_number == registration_number)
            .cloned())
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let mut list: Vec<Vehicle> = self
            .vehicles
            .read()
            .await
            .values()
            .filter(|v| v.vendor == vendor_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let mut vehicles = self.vehicles.write().await;
        if vehicles
            .values()
            .any(|v| v.id != vehicle.id && v.registration_number == vehicle.registration_number)
        {
            return Err(AppError::Conflict(
                "Vehicle registration number already exists".to_string(),
            ));
        }
        let stored = vehicles
            .get_mut(&vehicle.id)
            .ok_or_else(|| not_found_error("Vehicle", vehicle.id))?;
        *stored = Vehicle {
            updated_at: Utc::now(),
            ..vehicle.clone()
        };
        Ok(stored.clone())
    }

    async fn set_assigned_driver(&self, vehicle_id: Uuid, driver_id: Option<Uuid>) -> AppResult<()> {
        if let Some(vehicle) = self.vehicles.write().await.get_mut(&vehicle_id) {
            vehicle.assigned_driver = driver_id;
            vehicle.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.vehicles.write().await.remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.vehicles.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryDriverRepository {
    drivers: RwLock<HashMap<Uuid, Driver>>,
}

impl InMemoryDriverRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DriverRepository for InMemoryDriverRepository {
    async fn create(&self, driver: &Driver) -> AppResult<Driver> {
        let mut drivers = self.drivers.write().await;
        if drivers.values().any(|d| d.email == driver.email) {
            return Err(AppError::Conflict("Driver email already exists".to_string()));
        }
        drivers.insert(driver.id, driver.clone());
        Ok(driver.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.drivers.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Driver>> {
        let email = email.trim().to_lowercase();
        Ok(self.drivers.read().await.values().find(|d| d.email == email).cloned())
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Driver>> {
        let mut list: Vec<Driver> = self
            .drivers
            .read()
            .await
            .values()
            .filter(|d| d.vendor == vendor_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update(&self, driver: &Driver) -> AppResult<Driver> {
        let mut drivers = self.drivers.write().await;
        if drivers
            .values()
            .any(|d| d.id != driver.id && d.email == driver.email)
        {
            return Err(AppError::Conflict("Driver email already exists".to_string()));
        }
        let stored = drivers
            .get_mut(&driver.id)
            .ok_or_else(|| not_found_error("Driver", driver.id))?;
        *stored = Driver {
            updated_at: Utc::now(),
            ..driver.clone()
        };
        Ok(stored.clone())
    }

    async fn set_assigned_vehicle(&self, driver_id: Uuid, vehicle_id: Option<Uuid>) -> AppResult<()> {
        if let Some(driver) = self.drivers.write().await.get_mut(&driver_id) {
            driver.assigned_vehicle = vehicle_id;
            driver.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.drivers.write().await.remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.drivers.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(&self, document: &Document) -> AppResult<Document> {
        let mut documents = self.documents.write().await;
        if documents.values().any(|d| {
            d.entity_type == document.entity_type
                && d.entity_id == document.entity_id
                && d.document_type == document.document_type
        }) {
            return Err(AppError::Conflict(
                "Document of this type for the entity already exists".to_string(),
            ));
        }
        documents.insert(document.id, document.clone());
        Ok(document.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn find_for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<Vec<Document>> {
        let mut list: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.entity_type == entity_type && d.entity_id == entity_id)
            .cloned()
            .collect();
        list.sort_by_key(|d| d.created_at);
        Ok(list)
    }

    async fn find_by_entity_and_type(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        document_type: DocumentType,
    ) -> AppResult<Option<Document>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .find(|d| {
                d.entity_type == entity_type
                    && d.entity_id == entity_id
                    && d.document_type == document_type
            })
            .cloned())
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Document>> {
        let mut list: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.vendor == vendor_id)
            .cloned()
            .collect();
        list.sort_by_key(|d| d.expiry_date.unwrap_or(DateTime::<Utc>::MAX_UTC));
        Ok(list)
    }

    async fn find_expiring_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<Vec<Document>> {
        let mut list: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.expiry_date.is_some_and(|date| date >= from && date <= to))
            .cloned()
            .collect();
        list.sort_by_key(|d| d.expiry_date);
        Ok(list)
    }

    async fn find_stale_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.status != DocumentStatus::Expired && d.is_expired(now))
            .cloned()
            .collect())
    }

    async fn update(&self, document: &Document) -> AppResult<Document> {
        let mut documents = self.documents.write().await;
        let stored = documents
            .get_mut(&document.id)
            .ok_or_else(|| not_found_error("Document", document.id))?;
        *stored = Document {
            updated_at: Utc::now(),
            ..document.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.documents.write().await.remove(&id).is_some())
    }

    async fn delete_for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<u64> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|_, d| !(d.entity_type == entity_type && d.entity_id == entity_id));
        Ok((before - documents.len()) as u64)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.documents.read().await.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FuelType, OperatingArea};

    #[tokio::test]
    async fn test_vendor_email_is_unique() {
        let repo = InMemoryVendorRepository::new();
        let vendor = Vendor::new(
            "Acme".into(),
            "ops@acme.test".into(),
            "hash".into(),
            VendorType::Super,
            None,
            vec![],
            OperatingArea::default(),
        );
        repo.create(&vendor).await.unwrap();

        let duplicate = Vendor::new(
            "Acme 2".into(),
            "OPS@acme.test".into(),
            "hash".into(),
            VendorType::Super,
            None,
            vec![],
            OperatingArea::default(),
        );
        assert!(matches!(repo.create(&duplicate).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_children_filters_by_type() {
        let repo = InMemoryVendorRepository::new();
        let root = Vendor::new("Root".into(), "root@x.test".into(), "h".into(), VendorType::Super, None, vec![], OperatingArea::default());
        let city = Vendor::new("City".into(), "city@x.test".into(), "h".into(), VendorType::City, Some(root.id), vec![], OperatingArea::default());
        let regional = Vendor::new("Reg".into(), "reg@x.test".into(), "h".into(), VendorType::Regional, Some(root.id), vec![], OperatingArea::default());
        for v in [&root, &city, &regional] {
            repo.create(v).await.unwrap();
        }

        let cities = repo.find_children(root.id, &[VendorType::City]).await.unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].id, city.id);

        let all = repo
            .find_children(root.id, &[VendorType::City, VendorType::Regional])
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_vehicle_assignment_pointer() {
        let repo = InMemoryVehicleRepository::new();
        let vehicle = Vehicle::new(Uuid::new_v4(), "KA01AB1234".into(), "Van".into(), 8, FuelType::Cng);
        repo.create(&vehicle).await.unwrap();

        let driver_id = Uuid::new_v4();
        repo.set_assigned_driver(vehicle.id, Some(driver_id)).await.unwrap();
        let stored = repo.find_by_id(vehicle.id).await.unwrap().unwrap();
        assert_eq!(stored.assigned_driver, Some(driver_id));
    }
}
