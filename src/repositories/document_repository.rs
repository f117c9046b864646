use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_write_error, DocumentRepository};
use crate::models::document::{Document, DocumentStatus, DocumentType, EntityType};
use crate::utils::errors::AppResult;

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    entity_type: EntityType,
    entity_id: Uuid,
    document_type: DocumentType,
    document_number: String,
    document_url: Option<String>,
    expiry_date: Option<DateTime<Utc>>,
    is_verified: bool,
    verified_by: Option<Uuid>,
    verified_at: Option<DateTime<Utc>>,
    vendor: Uuid,
    status: DocumentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            document_type: row.document_type,
            document_number: row.document_number,
            document_url: row.document_url,
            expiry_date: row.expiry_date,
            is_verified: row.is_verified,
            verified_by: row.verified_by,
            verified_at: row.verified_at,
            vendor: row.vendor,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn create(&self, document: &Document) -> AppResult<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (id, entity_type, entity_id, document_type, document_number,
                                   document_url, expiry_date, is_verified, verified_by, verified_at,
                                   vendor, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(document.id)
        .bind(document.entity_type)
        .bind(document.entity_id)
        .bind(document.document_type)
        .bind(&document.document_number)
        .bind(&document.document_url)
        .bind(document.expiry_date)
        .bind(document.is_verified)
        .bind(document.verified_by)
        .bind(document.verified_at)
        .bind(document.vendor)
        .bind(document.status)
        .bind(document.created_at)
        .bind(document.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Document of this type for the entity"))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT * FROM documents
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY document_type
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_entity_and_type(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        document_type: DocumentType,
    ) -> AppResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT * FROM documents
            WHERE entity_type = $1 AND entity_id = $2 AND document_type = $3
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(document_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents WHERE vendor = $1 ORDER BY expiry_date NULLS LAST",
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_expiring_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> AppResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT * FROM documents
            WHERE expiry_date BETWEEN $1 AND $2
            ORDER BY expiry_date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_stale_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT * FROM documents
            WHERE expiry_date IS NOT NULL AND expiry_date < $1 AND status <> 'EXPIRED'
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, document: &Document) -> AppResult<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET document_number = $2, document_url = $3, expiry_date = $4, is_verified = $5,
                verified_by = $6, verified_at = $7, status = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(document.id)
        .bind(&document.document_number)
        .bind(&document.document_url)
        .bind(document.expiry_date)
        .bind(document.is_verified)
        .bind(document.verified_by)
        .bind(document.verified_at)
        .bind(document.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE entity_type = $1 AND entity_id = $2")
            .bind(entity_type)
            .bind(entity_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
