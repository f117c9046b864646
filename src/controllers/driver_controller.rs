//! Driver handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use super::vehicle_controller::AssignmentResponse;
use crate::dto::document_dto::VerifyDocumentsRequest;
use crate::dto::driver_dto::{AssignVehicleRequest, CreateDriverRequest, UpdateDriverRequest};
use crate::dto::{ApiResponse, ListResponse, VendorFilterQuery};
use crate::middleware::AuthenticatedVendor;
use crate::models::{Document, Driver, EntityType, Permission};
use crate::services::compliance_service::EntityDocumentStatus;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub async fn create_driver(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Json(request): Json<CreateDriverRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Driver>>)> {
    request.validate()?;
    let vendor_id = request.vendor.unwrap_or(actor.id);
    state
        .authorization
        .authorize(&actor, vendor_id, Permission::ManageDrivers)
        .await?;
    state.hierarchy.get_vendor(vendor_id).await?;

    let driver = state.fleet.create_driver(vendor_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(driver, "Driver created")),
    ))
}

pub async fn list_drivers(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Query(query): Query<VendorFilterQuery>,
) -> AppResult<Json<ApiResponse<ListResponse<Driver>>>> {
    let vendor_id = query.vendor_id.unwrap_or(actor.id);
    state.authorization.ensure_vendor_scope(&actor, vendor_id).await?;
    let drivers = state.fleet.list_drivers(vendor_id).await?;
    Ok(Json(ApiResponse::success(drivers.into())))
}

pub async fn get_driver(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let driver = state.fleet.get_driver(id).await?;
    state.authorization.ensure_vendor_scope(&actor, driver.vendor).await?;
    Ok(Json(ApiResponse::success(driver)))
}

pub async fn update_driver(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDriverRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    request.validate()?;
    let driver = state.fleet.get_driver(id).await?;
    state
        .authorization
        .authorize(&actor, driver.vendor, Permission::ManageDrivers)
        .await?;
    let driver = state.fleet.update_driver(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(driver, "Driver updated")))
}

pub async fn delete_driver(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let driver = state.fleet.get_driver(id).await?;
    state
        .authorization
        .authorize(&actor, driver.vendor, Permission::ManageDrivers)
        .await?;
    let driver = state.fleet.delete_driver(id).await?;
    Ok(Json(ApiResponse::success_with_message(driver, "Driver deleted")))
}

pub async fn assign_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignVehicleRequest>,
) -> AppResult<Json<ApiResponse<AssignmentResponse>>> {
    let driver = state.fleet.get_driver(id).await?;
    state
        .authorization
        .authorize(&actor, driver.vendor, Permission::ManageDrivers)
        .await?;
    let (vehicle, driver) = state
        .fleet
        .assign_vehicle_to_driver(request.vehicle_id, id)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        AssignmentResponse { vehicle, driver },
        "Vehicle assigned",
    )))
}

pub async fn unassign_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let driver = state.fleet.get_driver(id).await?;
    state
        .authorization
        .authorize(&actor, driver.vendor, Permission::ManageDrivers)
        .await?;
    let driver = state.fleet.unassign_driver(id).await?;
    Ok(Json(ApiResponse::success_with_message(driver, "Vehicle unassigned")))
}

pub async fn get_document_status(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<EntityDocumentStatus>>> {
    let driver = state.fleet.get_driver(id).await?;
    state.authorization.ensure_vendor_scope(&actor, driver.vendor).await?;
    let status = state
        .compliance
        .entity_document_status(EntityType::Driver, id)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn verify_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    request: Option<Json<VerifyDocumentsRequest>>,
) -> AppResult<Json<ApiResponse<ListResponse<Document>>>> {
    let driver = state.fleet.get_driver(id).await?;
    state
        .authorization
        .authorize(&actor, driver.vendor, Permission::VerifyDocuments)
        .await?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let documents = state
        .documents
        .verify_entity(EntityType::Driver, id, request.document_types.as_deref(), actor.id)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        documents.into(),
        "Driver documents verified",
    )))
}
