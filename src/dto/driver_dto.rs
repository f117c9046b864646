use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::document_dto::DocumentInput;
use crate::models::{DocumentType, DriverStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriverRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(regex = "crate::utils::validation::PHONE_REGEX")]
    pub phone: String,
    pub vendor: Option<Uuid>,
    #[validate]
    pub documents: Option<DriverDocumentsInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DriverDocumentsInput {
    #[validate]
    pub driving_license: Option<DocumentInput>,
    #[validate]
    pub address_proof: Option<DocumentInput>,
    #[validate]
    pub identity_proof: Option<DocumentInput>,
    #[validate]
    pub police_verification: Option<DocumentInput>,
}

impl DriverDocumentsInput {
    pub fn into_entries(self) -> Vec<(DocumentType, DocumentInput)> {
        [
            (DocumentType::DrivingLicense, self.driving_license),
            (DocumentType::AddressProof, self.address_proof),
            (DocumentType::IdentityProof, self.identity_proof),
            (DocumentType::PoliceVerification, self.police_verification),
        ]
        .into_iter()
        .filter_map(|(t, input)| input.map(|i| (t, i)))
        .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDriverRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(regex = "crate::utils::validation::PHONE_REGEX")]
    pub phone: Option<String>,
    pub status: Option<DriverStatus>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[validate(range(min = 0))]
    pub total_trips: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVehicleRequest {
    pub vehicle_id: Uuid,
}
