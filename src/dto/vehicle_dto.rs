use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::document_dto::DocumentInput;
use crate::models::{DocumentType, FuelType, VehicleStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    #[validate(regex = "crate::utils::validation::REGISTRATION_NUMBER_REGEX")]
    pub registration_number: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(range(min = 1, max = 100))]
    pub seating_capacity: i32,
    pub fuel_type: FuelType,
    /// Owning vendor, defaults to the authenticated vendor
    pub vendor: Option<Uuid>,
    #[validate]
    pub documents: Option<VehicleDocumentsInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDocumentsInput {
    #[validate]
    pub registration_certificate: Option<DocumentInput>,
    #[validate]
    pub permit: Option<DocumentInput>,
    #[validate]
    pub pollution_certificate: Option<DocumentInput>,
    #[validate]
    pub insurance: Option<DocumentInput>,
    #[validate]
    pub fitness_certificate: Option<DocumentInput>,
}

impl VehicleDocumentsInput {
    pub fn into_entries(self) -> Vec<(DocumentType, DocumentInput)> {
        [
            (DocumentType::RegistrationCertificate, self.registration_certificate),
            (DocumentType::Permit, self.permit),
            (DocumentType::PollutionCertificate, self.pollution_certificate),
            (DocumentType::Insurance, self.insurance),
            (DocumentType::FitnessCertificate, self.fitness_certificate),
        ]
        .into_iter()
        .filter_map(|(t, input)| input.map(|i| (t, i)))
        .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub seating_capacity: Option<i32>,
    pub fuel_type: Option<FuelType>,
    pub status: Option<VehicleStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}
