//! Vendor handlers
//!
//! `/api/vendors`: authentication, vendor management, hierarchy views and
//! vendor-level reports.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse, RegisterSuperVendorRequest};
use crate::dto::vendor_dto::{
    ComplianceQuery, CreateVendorRequest, TransferVendorRequest, UpdateVendorRequest, ValidateHierarchyQuery,
};
use crate::dto::{ApiResponse, ListResponse};
use crate::middleware::AuthenticatedVendor;
use crate::models::{EntityType, Permission, Vendor};
use crate::services::compliance_service::EntityDocumentStatus;
use crate::services::fleet_service::FleetStats;
use crate::services::hierarchy_service::VendorHierarchy;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterSuperVendorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vendor>>)> {
    request.validate()?;
    let vendor = state.auth.register_super_vendor(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(vendor, "SUPER vendor registered")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    request.validate()?;
    let response = state.auth.login(request).await?;
    Ok(Json(ApiResponse::success(response)))
}

pub async fn me(Extension(actor): Extension<AuthenticatedVendor>) -> Json<ApiResponse<Vendor>> {
    Json(ApiResponse::success(actor.0))
}

pub async fn create_vendor(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Json(request): Json<CreateVendorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vendor>>)> {
    request.validate()?;
    let vendor = state.vendors.create_vendor(&actor, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(vendor, "Vendor created")),
    ))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    state.authorization.ensure_vendor_scope(&actor, id).await?;
    let vendor = state.hierarchy.get_vendor(id).await?;
    Ok(Json(ApiResponse::success(vendor)))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVendorRequest>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    request.validate()?;
    if actor.id != id {
        state
            .authorization
            .authorize(&actor, id, Permission::ManageVendors)
            .await?;
    }
    let vendor = state.vendors.update_vendor(&actor, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(vendor, "Vendor updated")))
}

pub async fn delete_vendor(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    if actor.id == id {
        return Err(AppError::BadRequest("A vendor cannot delete itself".to_string()));
    }
    state
        .authorization
        .authorize(&actor, id, Permission::ManageVendors)
        .await?;
    let vendor = state.vendors.delete_vendor(id).await?;
    Ok(Json(ApiResponse::success_with_message(vendor, "Vendor deleted")))
}

pub async fn get_hierarchy(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VendorHierarchy>>> {
    state.authorization.ensure_vendor_scope(&actor, id).await?;
    let tree = state.hierarchy.get_vendor_hierarchy(id).await?;
    Ok(Json(ApiResponse::success(tree)))
}

pub async fn get_all_sub_vendors(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ListResponse<Vendor>>>> {
    state.authorization.ensure_vendor_scope(&actor, id).await?;
    let vendors = state.hierarchy.get_all_sub_vendors(id).await?;
    Ok(Json(ApiResponse::success(vendors.into())))
}

/// Ancestors are returned only up to the actor; a vendor never learns about
/// the vendors above it.
pub async fn get_parent_chain(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ListResponse<Vendor>>>> {
    state.authorization.ensure_vendor_scope(&actor, id).await?;
    let mut chain = state.hierarchy.get_parent_chain(id).await?;
    if let Some(pos) = chain.iter().position(|v| v.id == actor.id) {
        chain.truncate(pos + 1);
    } else {
        chain.clear();
    }
    Ok(Json(ApiResponse::success(chain.into())))
}

pub async fn transfer_vendor(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransferVendorRequest>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    if actor.id == id {
        return Err(AppError::BadRequest("A vendor cannot transfer itself".to_string()));
    }
    state
        .authorization
        .authorize(&actor, id, Permission::ManageVendors)
        .await?;
    state
        .authorization
        .ensure_vendor_scope(&actor, request.new_parent_id)
        .await?;
    let vendor = state.hierarchy.transfer_vendor(id, request.new_parent_id).await?;
    Ok(Json(ApiResponse::success_with_message(vendor, "Vendor transferred")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyCheck {
    pub child_id: Uuid,
    pub parent_id: Uuid,
    pub valid: bool,
}

pub async fn validate_hierarchy(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Query(query): Query<ValidateHierarchyQuery>,
) -> AppResult<Json<ApiResponse<HierarchyCheck>>> {
    state.authorization.ensure_vendor_scope(&actor, query.child_id).await?;
    state.authorization.ensure_vendor_scope(&actor, query.parent_id).await?;
    let valid = state
        .hierarchy
        .validate_hierarchy(query.child_id, query.parent_id)
        .await?;
    Ok(Json(ApiResponse::success(HierarchyCheck {
        child_id: query.child_id,
        parent_id: query.parent_id,
        valid,
    })))
}

pub async fn get_fleet_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FleetStats>>> {
    state
        .authorization
        .authorize(&actor, id, Permission::ViewReports)
        .await?;
    let stats = state.fleet.fleet_stats(id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn get_compliance_report(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    Query(query): Query<ComplianceQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state
        .authorization
        .authorize(&actor, id, Permission::ViewReports)
        .await?;

    let report = if query.include_sub_vendors {
        serde_json::to_value(state.compliance.network_compliance_report(id).await?)
    } else {
        serde_json::to_value(state.compliance.vendor_compliance_report(id).await?)
    }
    .map_err(|e| AppError::Internal(format!("Could not encode report: {}", e)))?;

    Ok(Json(ApiResponse::success(report)))
}

pub async fn get_document_status(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<EntityDocumentStatus>>> {
    state.authorization.ensure_vendor_scope(&actor, id).await?;
    state.hierarchy.get_vendor(id).await?;
    let status = state
        .compliance
        .entity_document_status(EntityType::Vendor, id)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}
