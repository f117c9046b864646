use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_write_error, VehicleRepository};
use crate::models::vehicle::{FuelType, Vehicle, VehicleStatus};
use crate::utils::errors::AppResult;

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    registration_number: String,
    model: String,
    seating_capacity: i32,
    fuel_type: FuelType,
    vendor: Uuid,
    status: VehicleStatus,
    assigned_driver: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Self {
            id: row.id,
            registration_number: row.registration_number,
            model: row.model,
            seating_capacity: row.seating_capacity,
            fuel_type: row.fuel_type,
            vendor: row.vendor,
            status: row.status,
            assigned_driver: row.assigned_driver,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicles (id, registration_number, model, seating_capacity, fuel_type,
                                  vendor, status, assigned_driver, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.registration_number)
        .bind(&vehicle.model)
        .bind(vehicle.seating_capacity)
        .bind(vehicle.fuel_type)
        .bind(vehicle.vendor)
        .bind(vehicle.status)
        .bind(vehicle.assigned_driver)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Vehicle registration number"))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_registration(&self, registration_number: &str) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles WHERE registration_number = $1",
        )
        .bind(registration_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles WHERE vendor = $1 ORDER BY created_at DESC",
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            UPDATE vehicles
            SET registration_number = $2, model = $3, seating_capacity = $4, fuel_type = $5,
                status = $6, assigned_driver = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.registration_number)
        .bind(&vehicle.model)
        .bind(vehicle.seating_capacity)
        .bind(vehicle.fuel_type)
        .bind(vehicle.status)
        .bind(vehicle.assigned_driver)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Vehicle registration number"))?;

        Ok(row.into())
    }

    async fn set_assigned_driver(&self, vehicle_id: Uuid, driver_id: Option<Uuid>) -> AppResult<()> {
        sqlx::query("UPDATE vehicles SET assigned_driver = $2, updated_at = NOW() WHERE id = $1")
            .bind(vehicle_id)
            .bind(driver_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vehicles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
