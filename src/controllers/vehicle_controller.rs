//! Vehicle handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::dto::document_dto::VerifyDocumentsRequest;
use crate::dto::vehicle_dto::{AssignDriverRequest, CreateVehicleRequest, UpdateVehicleRequest};
use crate::dto::{ApiResponse, ListResponse, VendorFilterQuery};
use crate::middleware::AuthenticatedVendor;
use crate::models::{Document, Driver, EntityType, Permission, Vehicle};
use crate::services::compliance_service::EntityDocumentStatus;
use crate::state::AppState;
use crate::utils::errors::AppResult;

/// Both sides of an assignment after it was applied
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub vehicle: Vehicle,
    pub driver: Driver,
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Json(request): Json<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vehicle>>)> {
    request.validate()?;
    let vendor_id = request.vendor.unwrap_or(actor.id);
    state
        .authorization
        .authorize(&actor, vendor_id, Permission::ManageVehicles)
        .await?;
    state.hierarchy.get_vendor(vendor_id).await?;

    let vehicle = state.fleet.create_vehicle(vendor_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(vehicle, "Vehicle created")),
    ))
}

pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Query(query): Query<VendorFilterQuery>,
) -> AppResult<Json<ApiResponse<ListResponse<Vehicle>>>> {
    let vendor_id = query.vendor_id.unwrap_or(actor.id);
    state.authorization.ensure_vendor_scope(&actor, vendor_id).await?;
    let vehicles = state.fleet.list_vehicles(vendor_id).await?;
    Ok(Json(ApiResponse::success(vehicles.into())))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let vehicle = state.fleet.get_vehicle(id).await?;
    state.authorization.ensure_vendor_scope(&actor, vehicle.vendor).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    request.validate()?;
    let vehicle = state.fleet.get_vehicle(id).await?;
    state
        .authorization
        .authorize(&actor, vehicle.vendor, Permission::ManageVehicles)
        .await?;
    let vehicle = state.fleet.update_vehicle(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(vehicle, "Vehicle updated")))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let vehicle = state.fleet.get_vehicle(id).await?;
    state
        .authorization
        .authorize(&actor, vehicle.vendor, Permission::ManageVehicles)
        .await?;
    let vehicle = state.fleet.delete_vehicle(id).await?;
    Ok(Json(ApiResponse::success_with_message(vehicle, "Vehicle deleted")))
}

pub async fn assign_driver(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignDriverRequest>,
) -> AppResult<Json<ApiResponse<AssignmentResponse>>> {
    let vehicle = state.fleet.get_vehicle(id).await?;
    state
        .authorization
        .authorize(&actor, vehicle.vendor, Permission::ManageVehicles)
        .await?;
    let (vehicle, driver) = state
        .fleet
        .assign_vehicle_to_driver(id, request.driver_id)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        AssignmentResponse { vehicle, driver },
        "Driver assigned",
    )))
}

pub async fn unassign_driver(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let vehicle = state.fleet.get_vehicle(id).await?;
    state
        .authorization
        .authorize(&actor, vehicle.vendor, Permission::ManageVehicles)
        .await?;
    let vehicle = state.fleet.unassign_vehicle(id).await?;
    Ok(Json(ApiResponse::success_with_message(vehicle, "Driver unassigned")))
}

pub async fn get_document_status(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<EntityDocumentStatus>>> {
    let vehicle = state.fleet.get_vehicle(id).await?;
    state.authorization.ensure_vendor_scope(&actor, vehicle.vendor).await?;
    let status = state
        .compliance
        .entity_document_status(EntityType::Vehicle, id)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn verify_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
    Path(id): Path<Uuid>,
    request: Option<Json<VerifyDocumentsRequest>>,
) -> AppResult<Json<ApiResponse<ListResponse<Document>>>> {
    let vehicle = state.fleet.get_vehicle(id).await?;
    state
        .authorization
        .authorize(&actor, vehicle.vendor, Permission::VerifyDocuments)
        .await?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let documents = state
        .documents
        .verify_entity(EntityType::Vehicle, id, request.document_types.as_deref(), actor.id)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        documents.into(),
        "Vehicle documents verified",
    )))
}
