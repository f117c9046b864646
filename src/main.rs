use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_backend::cache::{CacheConfig, CacheStore, RedisClient};
use fleet_backend::config::{DatabaseConfig, EnvironmentConfig, StorageBackend};
use fleet_backend::database::DatabaseConnection;
use fleet_backend::repositories::Repositories;
use fleet_backend::services::notification_service::mailer_from_config;
use fleet_backend::services::scheduler::{ExpiringDocumentsJob, Scheduler, StatusRefreshJob};
use fleet_backend::services::CacheService;
use fleet_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚚 Fleet Management Backend");
    info!("============================");

    let config = EnvironmentConfig::from_env()?;
    info!("⚙️ Environment: {}", config.environment);

    let repositories = match &config.storage {
        StorageBackend::Postgres(url) => {
            let connection = DatabaseConnection::connect(&DatabaseConfig::from_env(url.clone())?)
                .await
                .map_err(|e| {
                    error!("❌ Database connection failed: {}", e);
                    e
                })?;
            connection.run_migrations().await?;
            Repositories::postgres(connection.pool().clone())
        }
        StorageBackend::Memory => {
            warn!("⚠️ DATABASE_URL not set, using the in-memory store (data is lost on restart)");
            Repositories::in_memory()
        }
    };

    let cache = connect_cache(&config).await;
    let mailer = mailer_from_config(&config.mail)?;
    info!("📧 Mailer: {}", mailer.name());

    let state = AppState::new(config, repositories, cache, mailer);
    schedule_jobs(&state)?;

    let scheduler = state.scheduler.clone();
    let addr: SocketAddr = state.config.server_url().parse()?;
    let app = fleet_backend::build_router(state);

    info!("🌐 Listening on http://{}", addr);
    info!("🏢 /api/vendors  🚗 /api/vehicles  👤 /api/drivers  📄 /api/documents");
    info!("🩺 /api/v1/monitoring/health  📊 /api/v1/monitoring/metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(scheduler))
        .await
        .map_err(|e| {
            error!("❌ Server error: {}", e);
            e
        })?;

    info!("👋 Server stopped");
    Ok(())
}

/// Redis when configured and reachable, otherwise no cache at all
async fn connect_cache(config: &EnvironmentConfig) -> CacheService {
    let Some(url) = &config.redis_url else {
        info!("🗄️ REDIS_URL not set, running without cache");
        return CacheService::disabled();
    };

    match RedisClient::new(CacheConfig::with_url(url.clone())).await {
        Ok(client) => CacheService::new(Some(Arc::new(client) as Arc<dyn CacheStore>)),
        Err(e) => {
            warn!("⚠️ Redis unavailable ({}), continuing without cache", e);
            CacheService::disabled()
        }
    }
}

fn schedule_jobs(state: &AppState) -> Result<()> {
    let config = &state.config;
    state.scheduler.schedule(
        Arc::new(ExpiringDocumentsJob::new(
            state.compliance.clone(),
            config.expiry_threshold_days,
        )),
        Duration::from_secs(config.expiry_check_interval_secs),
    )?;
    state.scheduler.schedule(
        Arc::new(StatusRefreshJob::new(state.compliance.clone())),
        Duration::from_secs(config.status_refresh_interval_secs),
    )?;
    Ok(())
}

async fn shutdown_signal(scheduler: Arc<Scheduler>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("🛑 Ctrl+C received, shutting down"),
        _ = terminate => info!("🛑 SIGTERM received, shutting down"),
    }

    scheduler.stop_all();
}
