//! Driver model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Driver status - maps to the `driver_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "driver_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub vendor: Uuid,
    pub status: DriverStatus,
    pub assigned_vehicle: Option<Uuid>,
    pub rating: f64,
    pub total_trips: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(vendor: Uuid, name: String, email: String, phone: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: email.trim().to_lowercase(),
            phone,
            vendor,
            status: DriverStatus::Active,
            assigned_vehicle: None,
            rating: 0.0,
            total_trips: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_assignable(&self) -> bool {
        self.status == DriverStatus::Active
    }
}
