use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{OperatingArea, Permission, VendorType};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorRequest {
    #[validate(length(min = 2, max = 120), custom = "crate::utils::validation::validate_not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub vendor_type: VendorType,
    /// Defaults to the authenticated vendor
    pub parent_vendor: Option<Uuid>,
    pub permissions: Option<Vec<Permission>>,
    #[serde(default)]
    #[validate]
    pub operating_area: OperatingArea,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,
    #[validate]
    pub operating_area: Option<OperatingArea>,
    pub permissions: Option<Vec<Permission>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferVendorRequest {
    pub new_parent_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateHierarchyQuery {
    pub child_id: Uuid,
    pub parent_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceQuery {
    #[serde(default)]
    pub include_sub_vendors: bool,
}
