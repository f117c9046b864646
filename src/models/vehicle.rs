//! Vehicle model
//!
//! Maps to the `vehicles` table. Compliance documents live in the `documents`
//! table and reference the vehicle through `entity_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Vehicle status - maps to the `vehicle_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Active,
    Inactive,
    Maintenance,
    Suspended,
}

/// Fuel type - maps to the `fuel_type` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "fuel_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Petrol,
    Diesel,
    Cng,
    Electric,
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub registration_number: String,
    pub model: String,
    pub seating_capacity: i32,
    pub fuel_type: FuelType,
    pub vendor: Uuid,
    pub status: VehicleStatus,
    pub assigned_driver: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(
        vendor: Uuid,
        registration_number: String,
        model: String,
        seating_capacity: i32,
        fuel_type: FuelType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            registration_number: normalize_registration(&registration_number),
            model,
            seating_capacity,
            fuel_type,
            vendor,
            status: VehicleStatus::Active,
            assigned_driver: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Suspended and inactive vehicles cannot take a driver
    pub fn is_assignable(&self) -> bool {
        !matches!(self.status, VehicleStatus::Suspended | VehicleStatus::Inactive)
    }
}

/// Registration numbers are stored upper-case without spaces
pub fn normalize_registration(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_is_normalized() {
        assert_eq!(normalize_registration("ka 01 ab 1234"), "KA01AB1234");
    }

    #[test]
    fn test_new_vehicle_is_active_and_unassigned() {
        let vehicle = Vehicle::new(Uuid::new_v4(), "mh12xy9999".into(), "Tempo".into(), 12, FuelType::Diesel);
        assert!(vehicle.is_assignable());
        assert!(vehicle.assigned_driver.is_none());
        assert_eq!(vehicle.registration_number, "MH12XY9999");
    }
}
