//! Services
//!
//! Business logic between the HTTP handlers and the repositories. Services are
//! built once at startup and shared through `AppState`.

pub mod auth_service;
pub mod authorization_service;
pub mod cache_service;
pub mod compliance_service;
pub mod document_service;
pub mod fleet_service;
pub mod hierarchy_service;
pub mod notification_service;
pub mod scheduler;
pub mod vendor_service;

pub use auth_service::AuthService;
pub use authorization_service::AuthorizationService;
pub use cache_service::CacheService;
pub use compliance_service::ComplianceService;
pub use document_service::DocumentService;
pub use fleet_service::FleetService;
pub use hierarchy_service::HierarchyService;
pub use notification_service::NotificationService;
pub use scheduler::Scheduler;
pub use vendor_service::VendorService;
