use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::controllers::vehicle_controller;
use crate::middleware::auth_middleware;
use crate::state::AppState;

pub fn create_vehicle_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(vehicle_controller::create_vehicle).get(vehicle_controller::list_vehicles),
        )
        .route(
            "/:id",
            get(vehicle_controller::get_vehicle)
                .put(vehicle_controller::update_vehicle)
                .delete(vehicle_controller::delete_vehicle),
        )
        .route("/:id/assign-driver", post(vehicle_controller::assign_driver))
        .route("/:id/unassign", post(vehicle_controller::unassign_driver))
        .route("/:id/documents/status", get(vehicle_controller::get_document_status))
        .route("/:id/verify-documents", post(vehicle_controller::verify_documents))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}
