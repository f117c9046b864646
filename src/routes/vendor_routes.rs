use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::controllers::vendor_controller;
use crate::middleware::auth_middleware;
use crate::state::AppState;

pub fn create_vendor_router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(vendor_controller::me))
        .route("/", post(vendor_controller::create_vendor))
        .route("/validate-hierarchy", get(vendor_controller::validate_hierarchy))
        .route(
            "/:id",
            get(vendor_controller::get_vendor)
                .put(vendor_controller::update_vendor)
                .delete(vendor_controller::delete_vendor),
        )
        .route("/:id/hierarchy", get(vendor_controller::get_hierarchy))
        .route("/:id/all-vendors", get(vendor_controller::get_all_sub_vendors))
        .route("/:id/parent-chain", get(vendor_controller::get_parent_chain))
        .route("/:id/transfer", post(vendor_controller::transfer_vendor))
        .route("/:id/fleet-stats", get(vendor_controller::get_fleet_stats))
        .route("/:id/compliance-reports", get(vendor_controller::get_compliance_report))
        .route("/:id/documents/status", get(vendor_controller::get_document_status))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/register", post(vendor_controller::register))
        .route("/login", post(vendor_controller::login))
        .merge(protected)
}
