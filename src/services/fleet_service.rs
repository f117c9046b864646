//! Vehicles, drivers and their assignment
//!
//! A vehicle and a driver point at each other or at nobody. Assignment writes
//! both pointers one after the other without a transaction; a failure between
//! the two writes can leave a one-sided pointer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::models::vehicle::normalize_registration;
use crate::models::{Driver, DriverStatus, EntityType, Vehicle, VehicleStatus};
use crate::repositories::{DriverRepository, VehicleRepository};
use crate::services::cache_service::CacheService;
use crate::services::document_service::DocumentService;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStats {
    pub total: usize,
    pub by_status: HashMap<VehicleStatus, usize>,
    pub assigned: usize,
    pub unassigned: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStats {
    pub total: usize,
    pub by_status: HashMap<DriverStatus, usize>,
    pub assigned: usize,
    pub unassigned: usize,
    pub average_rating: f64,
    pub total_trips: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub vendor_id: Uuid,
    pub vehicles: VehicleStats,
    pub drivers: DriverStats,
}

pub fn compute_fleet_stats(vendor_id: Uuid, vehicles: &[Vehicle], drivers: &[Driver]) -> FleetStats {
    let mut vehicle_stats = VehicleStats {
        total: vehicles.len(),
        ..Default::default()
    };
    for vehicle in vehicles {
        *vehicle_stats.by_status.entry(vehicle.status).or_default() += 1;
        if vehicle.assigned_driver.is_some() {
            vehicle_stats.assigned += 1;
        }
    }
    vehicle_stats.unassigned = vehicle_stats.total - vehicle_stats.assigned;

    let mut driver_stats = DriverStats {
        total: drivers.len(),
        ..Default::default()
    };
    let mut rating_sum = 0.0;
    for driver in drivers {
        *driver_stats.by_status.entry(driver.status).or_default() += 1;
        if driver.assigned_vehicle.is_some() {
            driver_stats.assigned += 1;
        }
        rating_sum += driver.rating;
        driver_stats.total_trips += driver.total_trips;
    }
    driver_stats.unassigned = driver_stats.total - driver_stats.assigned;
    if !drivers.is_empty() {
        // two decimals
        driver_stats.average_rating = (rating_sum / drivers.len() as f64 * 100.0).round() / 100.0;
    }

    FleetStats {
        vendor_id,
        vehicles: vehicle_stats,
        drivers: driver_stats,
    }
}

#[derive(Clone)]
pub struct FleetService {
    vehicles: Arc<dyn VehicleRepository>,
    drivers: Arc<dyn DriverRepository>,
    documents: DocumentService,
    cache: CacheService,
}

impl FleetService {
    pub fn new(
        vehicles: Arc<dyn VehicleRepository>,
        drivers: Arc<dyn DriverRepository>,
        documents: DocumentService,
        cache: CacheService,
    ) -> Self {
        Self {
            vehicles,
            drivers,
            documents,
            cache,
        }
    }

    // ---- vehicles ----

    pub async fn get_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    pub async fn list_vehicles(&self, vendor_id: Uuid) -> AppResult<Vec<Vehicle>> {
        self.vehicles.list_by_vendor(vendor_id).await
    }

    pub async fn create_vehicle(&self, vendor_id: Uuid, request: CreateVehicleRequest) -> AppResult<Vehicle> {
        let registration = normalize_registration(&request.registration_number);
        if self.vehicles.find_by_registration(&registration).await?.is_some() {
            return Err(conflict_error("Vehicle", "registration number", &registration));
        }

        let vehicle = Vehicle::new(
            vendor_id,
            registration,
            request.model.trim().to_string(),
            request.seating_capacity,
            request.fuel_type,
        );
        let created = self.vehicles.create(&vehicle).await?;

        if let Some(documents) = request.documents {
            self.documents
                .create_from_inputs(vendor_id, EntityType::Vehicle, created.id, documents.into_entries())
                .await?;
        }
        self.cache.invalidate_vendor_aggregates(vendor_id).await;
        info!("🚐 Vehicle {} registered for vendor {}", created.registration_number, vendor_id);
        Ok(created)
    }

    pub async fn update_vehicle(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<Vehicle> {
        let mut vehicle = self.get_vehicle(id).await?;
        if let Some(model) = request.model {
            vehicle.model = model.trim().to_string();
        }
        if let Some(seats) = request.seating_capacity {
            vehicle.seating_capacity = seats;
        }
        if let Some(fuel) = request.fuel_type {
            vehicle.fuel_type = fuel;
        }
        if let Some(status) = request.status {
            vehicle.status = status;
        }

        if !vehicle.is_assignable() {
            if let Some(driver_id) = vehicle.assigned_driver.take() {
                self.drivers.set_assigned_vehicle(driver_id, None).await?;
                info!("🔓 Vehicle {} is {:?}, released driver {}", id, vehicle.status, driver_id);
            }
        }

        vehicle.updated_at = chrono::Utc::now();
        let updated = self.vehicles.update(&vehicle).await?;
        self.cache.invalidate_vendor_aggregates(updated.vendor).await;
        Ok(updated)
    }

    /// Delete the vehicle, release its driver and drop its documents
    pub async fn delete_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        let vehicle = self.get_vehicle(id).await?;
        if let Some(driver_id) = vehicle.assigned_driver {
            self.drivers.set_assigned_vehicle(driver_id, None).await?;
        }
        self.documents
            .delete_for_entity(vehicle.vendor, EntityType::Vehicle, id)
            .await?;
        self.vehicles.delete(id).await?;
        self.cache.invalidate_vendor_aggregates(vehicle.vendor).await;
        info!("🗑️ Vehicle {} deleted", vehicle.registration_number);
        Ok(vehicle)
    }

    // ---- drivers ----

    pub async fn get_driver(&self, id: Uuid) -> AppResult<Driver> {
        self.drivers
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Driver", id))
    }

    pub async fn list_drivers(&self, vendor_id: Uuid) -> AppResult<Vec<Driver>> {
        self.drivers.list_by_vendor(vendor_id).await
    }

    pub async fn create_driver(&self, vendor_id: Uuid, request: CreateDriverRequest) -> AppResult<Driver> {
        let email = request.email.trim().to_lowercase();
        if self.drivers.find_by_email(&email).await?.is_some() {
            return Err(conflict_error("Driver", "email", &email));
        }

        let driver = Driver::new(vendor_id, request.name.trim().to_string(), email, request.phone);
        let created = self.drivers.create(&driver).await?;

        if let Some(documents) = request.documents {
            self.documents
                .create_from_inputs(vendor_id, EntityType::Driver, created.id, documents.into_entries())
                .await?;
        }
        self.cache.invalidate_vendor_aggregates(vendor_id).await;
        info!("🧑‍✈️ Driver {} registered for vendor {}", created.email, vendor_id);
        Ok(created)
    }

    pub async fn update_driver(&self, id: Uuid, request: UpdateDriverRequest) -> AppResult<Driver> {
        let mut driver = self.get_driver(id).await?;
        if let Some(name) = request.name {
            driver.name = name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            driver.phone = phone;
        }
        if let Some(status) = request.status {
            driver.status = status;
        }
        if let Some(rating) = request.rating {
            driver.rating = rating;
        }
        if let Some(trips) = request.total_trips {
            driver.total_trips = trips;
        }

        if !driver.is_assignable() {
            if let Some(vehicle_id) = driver.assigned_vehicle.take() {
                self.vehicles.set_assigned_driver(vehicle_id, None).await?;
                info!("🔓 Driver {} is {:?}, released vehicle {}", id, driver.status, vehicle_id);
            }
        }

        driver.updated_at = chrono::Utc::now();
        let updated = self.drivers.update(&driver).await?;
        self.cache.invalidate_vendor_aggregates(updated.vendor).await;
        Ok(updated)
    }

    /// Delete the driver, release its vehicle and drop its documents
    pub async fn delete_driver(&self, id: Uuid) -> AppResult<Driver> {
        let driver = self.get_driver(id).await?;
        if let Some(vehicle_id) = driver.assigned_vehicle {
            self.vehicles.set_assigned_driver(vehicle_id, None).await?;
        }
        self.documents
            .delete_for_entity(driver.vendor, EntityType::Driver, id)
            .await?;
        self.drivers.delete(id).await?;
        self.cache.invalidate_vendor_aggregates(driver.vendor).await;
        info!("🗑️ Driver {} deleted", driver.email);
        Ok(driver)
    }

    // ---- assignment ----

    /// Pair a vehicle with a driver, releasing any previous partner of either
    pub async fn assign_vehicle_to_driver(&self, vehicle_id: Uuid, driver_id: Uuid) -> AppResult<(Vehicle, Driver)> {
        let (vehicle, driver) = futures::try_join!(self.get_vehicle(vehicle_id), self.get_driver(driver_id))?;

        if vehicle.vendor != driver.vendor {
            return Err(AppError::BadRequest(
                "Vehicle and driver belong to different vendors".to_string(),
            ));
        }
        if !vehicle.is_assignable() {
            return Err(AppError::BadRequest(format!(
                "Vehicle {} is {:?} and cannot be assigned",
                vehicle.registration_number, vehicle.status
            )));
        }
        if !driver.is_assignable() {
            return Err(AppError::BadRequest(format!(
                "Driver {} is {:?} and cannot be assigned",
                driver.email, driver.status
            )));
        }

        if let Some(previous_driver) = vehicle.assigned_driver.filter(|d| *d != driver_id) {
            warn!("🔁 Vehicle {} was assigned to {}, releasing", vehicle_id, previous_driver);
            self.drivers.set_assigned_vehicle(previous_driver, None).await?;
        }
        if let Some(previous_vehicle) = driver.assigned_vehicle.filter(|v| *v != vehicle_id) {
            warn!("🔁 Driver {} was assigned to {}, releasing", driver_id, previous_vehicle);
            self.vehicles.set_assigned_driver(previous_vehicle, None).await?;
        }

        self.vehicles.set_assigned_driver(vehicle_id, Some(driver_id)).await?;
        self.drivers.set_assigned_vehicle(driver_id, Some(vehicle_id)).await?;
        self.cache.invalidate_vendor_aggregates(vehicle.vendor).await;

        info!("🔗 Vehicle {} assigned to driver {}", vehicle_id, driver_id);
        futures::try_join!(self.get_vehicle(vehicle_id), self.get_driver(driver_id))
    }

    /// Clear the vehicle's assignment on both sides
    pub async fn unassign_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let vehicle = self.get_vehicle(vehicle_id).await?;
        if let Some(driver_id) = vehicle.assigned_driver {
            self.drivers.set_assigned_vehicle(driver_id, None).await?;
        }
        self.vehicles.set_assigned_driver(vehicle_id, None).await?;
        self.cache.invalidate_vendor_aggregates(vehicle.vendor).await;
        self.get_vehicle(vehicle_id).await
    }

    /// Clear the driver's assignment on both sides
    pub async fn unassign_driver(&self, driver_id: Uuid) -> AppResult<Driver> {
        let driver = self.get_driver(driver_id).await?;
        if let Some(vehicle_id) = driver.assigned_vehicle {
            self.vehicles.set_assigned_driver(vehicle_id, None).await?;
        }
        self.drivers.set_assigned_vehicle(driver_id, None).await?;
        self.cache.invalidate_vendor_aggregates(driver.vendor).await;
        self.get_driver(driver_id).await
    }

    // ---- stats ----

    pub async fn fleet_stats(&self, vendor_id: Uuid) -> AppResult<FleetStats> {
        let vehicles = self.vehicles.clone();
        let drivers = self.drivers.clone();
        self.cache
            .cache_fleet_stats(vendor_id, move || async move {
                let (vehicle_list, driver_list) =
                    futures::try_join!(vehicles.list_by_vendor(vendor_id), drivers.list_by_vendor(vendor_id))?;
                Ok(compute_fleet_stats(vendor_id, &vehicle_list, &driver_list))
            })
            .await
    }

    /// Whether the vendor still owns any vehicle or driver
    pub async fn vendor_has_fleet(&self, vendor_id: Uuid) -> AppResult<bool> {
        let (vehicles, drivers) =
            futures::try_join!(self.vehicles.list_by_vendor(vendor_id), self.drivers.list_by_vendor(vendor_id))?;
        Ok(!vehicles.is_empty() || !drivers.is_empty())
    }
}
