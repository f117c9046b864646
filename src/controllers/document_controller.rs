//! Document handlers
//!
//! Writes need the permission that manages the owning entity; reads only need
//! the owning vendor to be in the actor's subtree.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::config::MAX_EXPIRY_THRESHOLD_DAYS;
use crate::dto::document_dto::{CreateDocumentRequest, DocumentListQuery, ExpiringQuery, UpdateDocumentRequest};
use crate::dto::{ApiResponse, ListResponse};
use crate::middleware::AuthenticatedVendor;
use crate::models::{Document, EntityType, Permission};
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

fn manage_permission(entity_type: EntityType) -> Permission {
    match entity_type {
        EntityType::Vendor => Permission::ManageVendors,
        EntityType::Vehicle => Permission::ManageVehicles,
        EntityType::Driver => Permission::ManageDrivers,
    }
}

pub async fn create_document(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Json(request): Json<CreateDocumentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Document>>)> {
    request.validate()?;
    let owner = state
        .documents
        .resolve_owner(request.entity_type, request.entity_id)
        .await?;
    state
        .authorization
        .authorize(&actor, owner, manage_permission(request.entity_type))
        .await?;

    let document = state.documents.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(document, "Document created")),
    ))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Query(query): Query<DocumentListQuery>,
) -> AppResult<Json<ApiResponse<ListResponse<Document>>>> {
    let owner = state
        .documents
        .resolve_owner(query.entity_type, query.entity_id)
        .await?;
    state.authorization.ensure_vendor_scope(&actor, owner).await?;
    let documents = state
        .documents
        .list_for_entity(query.entity_type, query.entity_id)
        .await?;
    Ok(Json(ApiResponse::success(documents.into())))
}

pub async fn list_expiring(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<ApiResponse<ListResponse<Document>>>> {
    let days = query.days.unwrap_or_else(|| state.compliance.threshold_days());
    if !(0..=MAX_EXPIRY_THRESHOLD_DAYS).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 0 and {}",
            MAX_EXPIRY_THRESHOLD_DAYS
        )));
    }
    let scope = state.authorization.scope_vendor_ids(&actor).await?;
    let documents = state.compliance.expiring_documents(days, Some(&scope)).await?;
    Ok(Json(ApiResponse::success(documents.into())))
}

pub async fn get_document(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Document>>> {
    let document = state.documents.get(id).await?;
    state.authorization.ensure_vendor_scope(&actor, document.vendor).await?;
    Ok(Json(ApiResponse::success(document)))
}

pub async fn update_document(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDocumentRequest>,
) -> AppResult<Json<ApiResponse<Document>>> {
    request.validate()?;
    let document = state.documents.get(id).await?;
    state
        .authorization
        .authorize(&actor, document.vendor, manage_permission(document.entity_type))
        .await?;
    let document = state.documents.update(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(document, "Document updated")))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Document>>> {
    let document = state.documents.get(id).await?;
    state
        .authorization
        .authorize(&actor, document.vendor, manage_permission(document.entity_type))
        .await?;
    let document = state.documents.delete(id).await?;
    Ok(Json(ApiResponse::success_with_message(document, "Document deleted")))
}

pub async fn verify_document(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Document>>> {
    let document = state.documents.get(id).await?;
    state
        .authorization
        .authorize(&actor, document.vendor, Permission::VerifyDocuments)
        .await?;
    let document = state.documents.verify(id, actor.id).await?;
    Ok(Json(ApiResponse::success_with_message(document, "Document verified")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_entity_has_its_manage_permission() {
        assert_eq!(manage_permission(EntityType::Vendor), Permission::ManageVendors);
        assert_eq!(manage_permission(EntityType::Vehicle), Permission::ManageVehicles);
        assert_eq!(manage_permission(EntityType::Driver), Permission::ManageDrivers);
    }
}
