use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::controllers::monitoring_controller;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// `/health` and `/metrics` stay public for probes and scrapers
pub fn create_monitoring_router(state: &AppState) -> Router<AppState> {
    let jobs = Router::new()
        .route("/jobs", get(monitoring_controller::list_jobs))
        .route(
            "/jobs/expiring-documents/run",
            post(monitoring_controller::run_expiring_documents),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(monitoring_controller::health))
        .route("/metrics", get(monitoring_controller::metrics))
        .merge(jobs)
}
