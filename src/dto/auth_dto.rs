use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{OperatingArea, Vendor};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub vendor: Vendor,
}

/// Bootstrap request for a root (SUPER) vendor
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSuperVendorRequest {
    #[validate(length(min = 2, max = 120), custom = "crate::utils::validation::validate_not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[serde(default)]
    #[validate]
    pub operating_area: OperatingArea,
}
