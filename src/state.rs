//! Shared application state
//!
//! Every service is constructed once here and handed to the handlers through
//! axum's `State`. Services are cheap to clone (they hold `Arc`s).

use std::sync::Arc;
use std::time::Instant;

use crate::config::EnvironmentConfig;
use crate::middleware::RateLimitState;
use crate::repositories::Repositories;
use crate::services::notification_service::Mailer;
use crate::services::{
    AuthService, AuthorizationService, CacheService, ComplianceService, DocumentService, FleetService,
    HierarchyService, NotificationService, Scheduler, VendorService,
};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub repositories: Repositories,
    pub cache: CacheService,
    pub auth: AuthService,
    pub authorization: AuthorizationService,
    pub hierarchy: HierarchyService,
    pub vendors: VendorService,
    pub fleet: FleetService,
    pub documents: DocumentService,
    pub compliance: ComplianceService,
    pub notifications: NotificationService,
    pub scheduler: Arc<Scheduler>,
    pub rate_limit: RateLimitState,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        repositories: Repositories,
        cache: CacheService,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let hierarchy = HierarchyService::new(repositories.vendors.clone(), cache.clone());
        let authorization = AuthorizationService::new(hierarchy.clone());
        let auth = AuthService::new(
            repositories.vendors.clone(),
            JwtConfig::from(&config),
            config.allow_super_registration,
            config.bcrypt_cost,
        );
        let documents = DocumentService::new(
            repositories.documents.clone(),
            repositories.vendors.clone(),
            repositories.vehicles.clone(),
            repositories.drivers.clone(),
            cache.clone(),
        );
        let fleet = FleetService::new(
            repositories.vehicles.clone(),
            repositories.drivers.clone(),
            documents.clone(),
            cache.clone(),
        );
        let vendors = VendorService::new(
            repositories.vendors.clone(),
            hierarchy.clone(),
            authorization.clone(),
            auth.clone(),
            fleet.clone(),
            documents.clone(),
        );
        let notifications = NotificationService::new(mailer, config.mail.from.clone());
        let compliance = ComplianceService::new(
            repositories.vendors.clone(),
            repositories.vehicles.clone(),
            repositories.drivers.clone(),
            repositories.documents.clone(),
            hierarchy.clone(),
            notifications.clone(),
            cache.clone(),
            config.expiry_threshold_days,
        );
        let rate_limit = RateLimitState::from_config(&config);

        Self {
            config: Arc::new(config),
            repositories,
            cache,
            auth,
            authorization,
            hierarchy,
            vendors,
            fleet,
            documents,
            compliance,
            notifications,
            scheduler: Arc::new(Scheduler::new()),
            rate_limit,
            started_at: Instant::now(),
        }
    }
}
