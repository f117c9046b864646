//! Fleet management backend
//!
//! Vendors organised in a four-level hierarchy, their vehicles and drivers,
//! and the compliance documents attached to all three.

pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::{error_handling::HandleErrorLayer, middleware::from_fn, middleware::from_fn_with_state, BoxError, Router};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{cors_layer, metrics_middleware, rate_limit_middleware};
use crate::routes::{document_routes, driver_routes, monitoring_routes, vehicle_routes, vendor_routes};
use crate::state::AppState;
use crate::utils::errors::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Full HTTP surface with its middleware stack
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/vendors", vendor_routes::create_vendor_router(&state))
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router(&state))
        .nest("/api/drivers", driver_routes::create_driver_router(&state))
        .nest("/api/documents", document_routes::create_document_router(&state))
        .nest("/api/v1/monitoring", monitoring_routes::create_monitoring_router(&state))
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

async fn handle_timeout(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(err.to_string())
    }
}
