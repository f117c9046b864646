//! Domain models
//!
//! Records persisted by the repositories. Enums map to PostgreSQL ENUM types.

pub mod document;
pub mod driver;
pub mod vehicle;
pub mod vendor;

pub use document::{Document, DocumentStatus, DocumentType, EntityType};
pub use driver::{Driver, DriverStatus};
pub use vehicle::{FuelType, Vehicle, VehicleStatus};
pub use vendor::{OperatingArea, Permission, Vendor, VendorType, MAX_HIERARCHY_DEPTH};
