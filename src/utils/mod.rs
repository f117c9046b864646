//! Utilities
//!
//! Errors, JWT handling, validation helpers and metrics.

pub mod errors;
pub mod jwt;
pub mod metrics;
pub mod validation;
