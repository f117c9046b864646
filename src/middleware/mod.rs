//! Middleware
//!
//! Authentication, CORS, rate limiting and request metrics.

pub mod auth;
pub mod cors;
pub mod metrics;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthenticatedVendor};
pub use cors::cors_layer;
pub use metrics::metrics_middleware;
pub use rate_limit::{rate_limit_middleware, RateLimitState};
