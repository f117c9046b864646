use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_write_error, VendorRepository};
use crate::models::{OperatingArea, Permission, Vendor, VendorType};
use crate::utils::errors::AppResult;

#[derive(Debug, sqlx::FromRow)]
struct VendorRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    vendor_type: VendorType,
    parent_vendor: Option<Uuid>,
    permissions: Json<Vec<Permission>>,
    operating_area: Json<OperatingArea>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VendorRow> for Vendor {
    fn from(row: VendorRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            vendor_type: row.vendor_type,
            parent_vendor: row.parent_vendor,
            permissions: row.permissions.0,
            operating_area: row.operating_area.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgVendorRepository {
    pool: PgPool,
}

impl PgVendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VendorRepository for PgVendorRepository {
    async fn create(&self, vendor: &Vendor) -> AppResult<Vendor> {
        let row = sqlx::query_as::<_, VendorRow>(
            r#"
            INSERT INTO vendors (id, name, email, password_hash, vendor_type, parent_vendor,
                                 permissions, operating_area, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(vendor.id)
        .bind(&vendor.name)
        .bind(&vendor.email)
        .bind(&vendor.password_hash)
        .bind(vendor.vendor_type)
        .bind(vendor.parent_vendor)
        .bind(Json(&vendor.permissions))
        .bind(Json(&vendor.operating_area))
        .bind(vendor.is_active)
        .bind(vendor.created_at)
        .bind(vendor.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Vendor email"))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vendor>> {
        let row = sqlx::query_as::<_, VendorRow>("SELECT * FROM vendors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Vendor>> {
        let row = sqlx::query_as::<_, VendorRow>("SELECT * FROM vendors WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_children(&self, parent_id: Uuid, types: &[VendorType]) -> AppResult<Vec<Vendor>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let type_names: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, VendorRow>(
            r#"
            SELECT * FROM vendors
            WHERE parent_vendor = $1 AND vendor_type::text = ANY($2)
            ORDER BY created_at
            "#,
        )
        .bind(parent_id)
        .bind(type_names)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, vendor: &Vendor) -> AppResult<Vendor> {
        let row = sqlx::query_as::<_, VendorRow>(
            r#"
            UPDATE vendors
            SET name = $2, parent_vendor = $3, permissions = $4, operating_area = $5,
                is_active = $6, password_hash = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(vendor.id)
        .bind(&vendor.name)
        .bind(vendor.parent_vendor)
        .bind(Json(&vendor.permissions))
        .bind(Json(&vendor.operating_area))
        .bind(vendor.is_active)
        .bind(&vendor.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM vendors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vendors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
