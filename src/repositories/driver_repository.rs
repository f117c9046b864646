use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_write_error, DriverRepository};
use crate::models::driver::{Driver, DriverStatus};
use crate::utils::errors::AppResult;

#[derive(Debug, sqlx::FromRow)]
struct DriverRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    vendor: Uuid,
    status: DriverStatus,
    assigned_vehicle: Option<Uuid>,
    rating: f64,
    total_trips: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<DriverRow> for Driver {
    fn from(row: DriverRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            vendor: row.vendor,
            status: row.status,
            assigned_vehicle: row.assigned_vehicle,
            rating: row.rating,
            total_trips: row.total_trips,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgDriverRepository {
    pool: PgPool,
}

impl PgDriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverRepository for PgDriverRepository {
    async fn create(&self, driver: &Driver) -> AppResult<Driver> {
        let row = sqlx::query_as::<_, DriverRow>(
            r#"
            INSERT INTO drivers (id, name, email, phone, vendor, status, assigned_vehicle,
                                 rating, total_trips, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(driver.id)
        .bind(&driver.name)
        .bind(&driver.email)
        .bind(&driver.phone)
        .bind(driver.vendor)
        .bind(driver.status)
        .bind(driver.assigned_vehicle)
        .bind(driver.rating)
        .bind(driver.total_trips)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Driver email"))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        let row = sqlx::query_as::<_, DriverRow>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Driver>> {
        let row = sqlx::query_as::<_, DriverRow>("SELECT * FROM drivers WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Driver>> {
        let rows = sqlx::query_as::<_, DriverRow>(
            "SELECT * FROM drivers WHERE vendor = $1 ORDER BY created_at DESC",
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, driver: &Driver) -> AppResult<Driver> {
        let row = sqlx::query_as::<_, DriverRow>(
            r#"
            UPDATE drivers
            SET name = $2, email = $3, phone = $4, status = $5, assigned_vehicle = $6,
                rating = $7, total_trips = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(driver.id)
        .bind(&driver.name)
        .bind(&driver.email)
        .bind(&driver.phone)
        .bind(driver.status)
        .bind(driver.assigned_vehicle)
        .bind(driver.rating)
        .bind(driver.total_trips)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Driver email"))?;

        Ok(row.into())
    }

    async fn set_assigned_vehicle(&self, driver_id: Uuid, vehicle_id: Option<Uuid>) -> AppResult<()> {
        sqlx::query("UPDATE drivers SET assigned_vehicle = $2, updated_at = NOW() WHERE id = $1")
            .bind(driver_id)
            .bind(vehicle_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM drivers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
