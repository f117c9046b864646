use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::controllers::document_controller;
use crate::middleware::auth_middleware;
use crate::state::AppState;

pub fn create_document_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(document_controller::create_document).get(document_controller::list_documents),
        )
        .route("/expiring", get(document_controller::list_expiring))
        .route(
            "/:id",
            get(document_controller::get_document)
                .put(document_controller::update_document)
                .delete(document_controller::delete_document),
        )
        .route("/:id/verify", post(document_controller::verify_document))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}
