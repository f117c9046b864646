use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::controllers::driver_controller;
use crate::middleware::auth_middleware;
use crate::state::AppState;

pub fn create_driver_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(driver_controller::create_driver).get(driver_controller::list_drivers),
        )
        .route(
            "/:id",
            get(driver_controller::get_driver)
                .put(driver_controller::update_driver)
                .delete(driver_controller::delete_driver),
        )
        .route("/:id/assign-vehicle", post(driver_controller::assign_vehicle))
        .route("/:id/unassign", post(driver_controller::unassign_vehicle))
        .route("/:id/documents/status", get(driver_controller::get_document_status))
        .route("/:id/verify-documents", post(driver_controller::verify_documents))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}
