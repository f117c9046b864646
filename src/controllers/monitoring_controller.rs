//! Monitoring handlers: health, metrics and scheduler jobs

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use crate::dto::{ApiResponse, ListResponse};
use crate::middleware::AuthenticatedVendor;
use crate::models::Permission;
use crate::services::compliance_service::NotificationSummary;
use crate::services::scheduler::JobInfo;
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::metrics;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub backend: &'static str,
    pub healthy: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub uptime_secs: u64,
    pub storage: ComponentHealth,
    pub cache: ComponentHealth,
    pub mailer: &'static str,
}

/// 200 while the store answers; a missing cache only degrades the report
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (storage_ok, cache_ok) = tokio::join!(state.repositories.is_healthy(), state.cache.is_connected());

    let status = match (storage_ok, cache_ok || !state.cache.is_enabled()) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        (false, _) => "unhealthy",
    };
    let report = HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        storage: ComponentHealth {
            backend: state.repositories.backend_name(),
            healthy: storage_ok,
        },
        cache: ComponentHealth {
            backend: state.cache.backend_name(),
            healthy: cache_ok,
        },
        mailer: state.notifications.mailer_name(),
    };

    let code = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(ApiResponse::success(report)))
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}

pub async fn list_jobs(State(state): State<AppState>) -> Json<ApiResponse<ListResponse<JobInfo>>> {
    Json(ApiResponse::success(state.scheduler.jobs().into()))
}

pub async fn run_expiring_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedVendor>,
) -> AppResult<Json<ApiResponse<NotificationSummary>>> {
    state
        .authorization
        .ensure_permission(&actor, Permission::VerifyDocuments)?;
    let threshold = state.compliance.threshold_days();
    let summary = state
        .compliance
        .check_and_notify_expiring_documents(threshold)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        summary,
        "Expiring document scan completed",
    )))
}
