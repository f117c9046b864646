//! Document store operations
//!
//! Every write recomputes the stored status and drops the cached aggregates
//! that depend on the document.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::dto::document_dto::{CreateDocumentRequest, DocumentInput, UpdateDocumentRequest};
use crate::models::{Document, DocumentType, EntityType};
use crate::repositories::{DocumentRepository, DriverRepository, VehicleRepository, VendorRepository};
use crate::services::cache_service::CacheService;
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
    vendors: Arc<dyn VendorRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    drivers: Arc<dyn DriverRepository>,
    cache: CacheService,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        vendors: Arc<dyn VendorRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        drivers: Arc<dyn DriverRepository>,
        cache: CacheService,
    ) -> Self {
        Self {
            documents,
            vendors,
            vehicles,
            drivers,
            cache,
        }
    }

    /// Vendor owning the vehicle, driver or vendor referenced by a document
    pub async fn resolve_owner(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<Uuid> {
        let owner = match entity_type {
            EntityType::Vehicle => self.vehicles.find_by_id(entity_id).await?.map(|v| v.vendor),
            EntityType::Driver => self.drivers.find_by_id(entity_id).await?.map(|d| d.vendor),
            EntityType::Vendor => self.vendors.find_by_id(entity_id).await?.map(|v| v.id),
        };
        owner.ok_or_else(|| not_found_error(entity_label(entity_type), entity_id))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Document> {
        self.documents
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Document", id))
    }

    pub async fn list_for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<Vec<Document>> {
        self.documents.find_for_entity(entity_type, entity_id).await
    }

    pub async fn create(&self, request: CreateDocumentRequest) -> AppResult<Document> {
        ensure_type_allowed(request.document_type, request.entity_type)?;
        let owner = self.resolve_owner(request.entity_type, request.entity_id).await?;

        let document = Document::new(
            owner,
            request.entity_type,
            request.entity_id,
            request.document_type,
            request.document_number.trim().to_string(),
            request.document_url,
            request.expiry_date,
        );
        let created = self.documents.create(&document).await?;
        self.invalidate(&created).await;
        info!(
            "📄 Document {} ({}) added to {} {}",
            created.id, created.document_type.label(), created.entity_type, created.entity_id
        );
        Ok(created)
    }

    /// Store the documents supplied inline on vehicle or driver creation
    pub async fn create_from_inputs(
        &self,
        owner: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        entries: Vec<(DocumentType, DocumentInput)>,
    ) -> AppResult<Vec<Document>> {
        let mut created = Vec::with_capacity(entries.len());
        for (document_type, input) in entries {
            ensure_type_allowed(document_type, entity_type)?;
            let document = Document::new(
                owner,
                entity_type,
                entity_id,
                document_type,
                input.number.trim().to_string(),
                input.document_url,
                input.expiry_date,
            );
            created.push(self.documents.create(&document).await?);
        }
        if !created.is_empty() {
            self.cache.invalidate_document_status(entity_type, entity_id).await;
            self.cache.invalidate_vendor_aggregates(owner).await;
        }
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, request: UpdateDocumentRequest) -> AppResult<Document> {
        let mut document = self.get(id).await?;
        let mut changed = false;

        if let Some(number) = request.document_number {
            document.document_number = number.trim().to_string();
            changed = true;
        }
        if let Some(url) = request.document_url {
            document.document_url = Some(url);
            changed = true;
        }
        if let Some(expiry) = request.expiry_date {
            document.expiry_date = Some(expiry);
            changed = true;
        }

        let now = Utc::now();
        if changed {
            document.clear_verification();
        }
        document.refresh_status(now);
        document.updated_at = now;

        let updated = self.documents.update(&document).await?;
        self.invalidate(&updated).await;
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<Document> {
        let document = self.get(id).await?;
        self.documents.delete(id).await?;
        self.invalidate(&document).await;
        Ok(document)
    }

    pub async fn delete_for_entity(&self, owner: Uuid, entity_type: EntityType, entity_id: Uuid) -> AppResult<u64> {
        let removed = self.documents.delete_for_entity(entity_type, entity_id).await?;
        self.cache.invalidate_document_status(entity_type, entity_id).await;
        self.cache.invalidate_vendor_aggregates(owner).await;
        Ok(removed)
    }

    pub async fn verify(&self, id: Uuid, verifier: Uuid) -> AppResult<Document> {
        let mut document = self.get(id).await?;
        document.mark_verified(verifier, Utc::now());
        let updated = self.documents.update(&document).await?;
        self.invalidate(&updated).await;
        info!("✅ Document {} verified by {}", id, verifier);
        Ok(updated)
    }

    /// Verify the entity's documents, all of them or only `types`
    pub async fn verify_entity(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        types: Option<&[DocumentType]>,
        verifier: Uuid,
    ) -> AppResult<Vec<Document>> {
        let documents = self.documents.find_for_entity(entity_type, entity_id).await?;
        if let Some(types) = types {
            if let Some(missing) = types
                .iter()
                .find(|t| !documents.iter().any(|d| d.document_type == **t))
            {
                return Err(AppError::NotFound(format!(
                    "{} not found for {} {}",
                    missing.label(),
                    entity_type,
                    entity_id
                )));
            }
        }

        let now = Utc::now();
        let mut verified = Vec::new();
        for mut document in documents {
            if types.is_some_and(|t| !t.contains(&document.document_type)) {
                continue;
            }
            document.mark_verified(verifier, now);
            verified.push(self.documents.update(&document).await?);
        }

        if let Some(first) = verified.first() {
            self.cache.invalidate_document_status(entity_type, entity_id).await;
            self.cache.invalidate_vendor_aggregates(first.vendor).await;
        }
        Ok(verified)
    }

    async fn invalidate(&self, document: &Document) {
        self.cache
            .invalidate_document_status(document.entity_type, document.entity_id)
            .await;
        self.cache.invalidate_vendor_aggregates(document.vendor).await;
    }
}

fn entity_label(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Vehicle => "Vehicle",
        EntityType::Driver => "Driver",
        EntityType::Vendor => "Vendor",
    }
}

fn ensure_type_allowed(document_type: DocumentType, entity_type: EntityType) -> AppResult<()> {
    if document_type.allowed_for(entity_type) {
        return Ok(());
    }
    Err(AppError::BadRequest(format!(
        "{} is not a valid document for a {}",
        document_type.label(),
        entity_label(entity_type).to_lowercase()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentStatus, FuelType, Vehicle};
    use crate::repositories::memory::{
        InMemoryDocumentRepository, InMemoryDriverRepository, InMemoryVehicleRepository,
        InMemoryVendorRepository,
    };
    use chrono::Duration;

    async fn setup() -> (DocumentService, Vehicle) {
        let vehicles = Arc::new(InMemoryVehicleRepository::new());
        let vehicle = vehicles
            .create(&Vehicle::new(Uuid::new_v4(), "KA01AB1234".into(), "Bus".into(), 40, FuelType::Cng))
            .await
            .unwrap();
        let service = DocumentService::new(
            Arc::new(InMemoryDocumentRepository::new()),
            Arc::new(InMemoryVendorRepository::new()),
            vehicles,
            Arc::new(InMemoryDriverRepository::new()),
            CacheService::disabled(),
        );
        (service, vehicle)
    }

    fn request(vehicle: &Vehicle, document_type: DocumentType) -> CreateDocumentRequest {
        CreateDocumentRequest {
            entity_type: EntityType::Vehicle,
            entity_id: vehicle.id,
            document_type,
            document_number: " PRM-9 ".into(),
            document_url: None,
            expiry_date: Some(Utc::now() + Duration::days(120)),
        }
    }

    #[tokio::test]
    async fn test_create_takes_owner_from_entity() {
        let (service, vehicle) = setup().await;
        let document = service.create(request(&vehicle, DocumentType::Permit)).await.unwrap();
        assert_eq!(document.vendor, vehicle.vendor);
        assert_eq!(document.document_number, "PRM-9");
        assert_eq!(document.status, DocumentStatus::PendingVerification);
    }

    #[tokio::test]
    async fn test_driver_document_type_rejected_for_vehicle() {
        let (service, vehicle) = setup().await;
        let result = service.create(request(&vehicle, DocumentType::DrivingLicense)).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_duplicate_type_conflicts() {
        let (service, vehicle) = setup().await;
        service.create(request(&vehicle, DocumentType::Permit)).await.unwrap();
        let duplicate = service.create(request(&vehicle, DocumentType::Permit)).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_resets_verification() {
        let (service, vehicle) = setup().await;
        let document = service.create(request(&vehicle, DocumentType::Permit)).await.unwrap();
        let verified = service.verify(document.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(verified.status, DocumentStatus::Active);

        let updated = service
            .update(
                document.id,
                UpdateDocumentRequest {
                    document_number: Some("PRM-10".into()),
                    document_url: None,
                    expiry_date: None,
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_verified);
        assert!(updated.verified_by.is_none());
        assert_eq!(updated.status, DocumentStatus::PendingVerification);
    }

    #[tokio::test]
    async fn test_verify_entity_only_listed_types() {
        let (service, vehicle) = setup().await;
        service.create(request(&vehicle, DocumentType::Permit)).await.unwrap();
        service.create(request(&vehicle, DocumentType::Insurance)).await.unwrap();

        let verified = service
            .verify_entity(EntityType::Vehicle, vehicle.id, Some(&[DocumentType::Insurance]), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].document_type, DocumentType::Insurance);

        let missing = service
            .verify_entity(EntityType::Vehicle, vehicle.id, Some(&[DocumentType::FitnessCertificate]), Uuid::new_v4())
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_entity_is_not_found() {
        let (service, _) = setup().await;
        let result = service.resolve_owner(EntityType::Driver, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
