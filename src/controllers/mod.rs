//! HTTP handlers
//!
//! Thin axum handlers: validate the body, check the actor's scope and
//! permission, delegate to a service, wrap the result in `ApiResponse`.

pub mod document_controller;
pub mod driver_controller;
pub mod monitoring_controller;
pub mod vehicle_controller;
pub mod vendor_controller;
