pub mod document_routes;
pub mod driver_routes;
pub mod monitoring_routes;
pub mod vehicle_routes;
pub mod vendor_routes;
