use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{DocumentType, EntityType};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub document_type: DocumentType,
    #[validate(length(min = 1, max = 64))]
    pub document_number: String,
    #[validate(url)]
    pub document_url: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Changing any of these resets verification
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    #[validate(length(min = 1, max = 64))]
    pub document_number: Option<String>,
    #[validate(url)]
    pub document_url: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// A document supplied inline on vehicle or driver creation
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    #[validate(length(min = 1, max = 64))]
    pub number: String,
    pub expiry_date: Option<DateTime<Utc>>,
    #[validate(url)]
    pub document_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListQuery {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

/// Verify every document of an entity, or only the listed types
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDocumentsRequest {
    pub document_types: Option<Vec<DocumentType>>,
}
