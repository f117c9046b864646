//! Document model
//!
//! One row per compliance document (registration certificate, permit, driving
//! licence, ...). The owning entity is referenced by `(entity_type, entity_id)`
//! and the owning vendor by `vendor`, so expiry scans never need to look inside
//! vehicles or drivers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Default look-ahead for "expiring soon"
pub const DEFAULT_EXPIRY_THRESHOLD_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "entity_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Vehicle,
    Driver,
    Vendor,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Vehicle => "VEHICLE",
            EntityType::Driver => "DRIVER",
            EntityType::Vendor => "VENDOR",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "document_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    RegistrationCertificate,
    Permit,
    PollutionCertificate,
    Insurance,
    FitnessCertificate,
    DrivingLicense,
    AddressProof,
    IdentityProof,
    PoliceVerification,
    BusinessLicense,
    GstCertificate,
    PanCard,
}

impl DocumentType {
    pub fn entity_type(self) -> EntityType {
        match self {
            DocumentType::RegistrationCertificate
            | DocumentType::Permit
            | DocumentType::PollutionCertificate
            | DocumentType::Insurance
            | DocumentType::FitnessCertificate => EntityType::Vehicle,
            DocumentType::DrivingLicense
            | DocumentType::AddressProof
            | DocumentType::IdentityProof
            | DocumentType::PoliceVerification => EntityType::Driver,
            DocumentType::BusinessLicense | DocumentType::GstCertificate | DocumentType::PanCard => {
                EntityType::Vendor
            }
        }
    }

    pub fn allowed_for(self, entity_type: EntityType) -> bool {
        self.entity_type() == entity_type
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentType::RegistrationCertificate => "Registration certificate",
            DocumentType::Permit => "Permit",
            DocumentType::PollutionCertificate => "Pollution certificate",
            DocumentType::Insurance => "Insurance",
            DocumentType::FitnessCertificate => "Fitness certificate",
            DocumentType::DrivingLicense => "Driving license",
            DocumentType::AddressProof => "Address proof",
            DocumentType::IdentityProof => "Identity proof",
            DocumentType::PoliceVerification => "Police verification",
            DocumentType::BusinessLicense => "Business license",
            DocumentType::GstCertificate => "GST certificate",
            DocumentType::PanCard => "PAN card",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "document_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Active,
    Expired,
    PendingVerification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub document_type: DocumentType,
    pub document_number: String,
    pub document_url: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub vendor: Uuid,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        vendor: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        document_type: DocumentType,
        document_number: String,
        document_url: Option<String>,
        expiry_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        let mut document = Self {
            id: Uuid::new_v4(),
            entity_type,
            entity_id,
            document_type,
            document_number,
            document_url,
            expiry_date,
            is_verified: false,
            verified_by: None,
            verified_at: None,
            vendor,
            status: DocumentStatus::PendingVerification,
            created_at: now,
            updated_at: now,
        };
        document.refresh_status(now);
        document
    }

    /// Recompute `status` from the expiry date and verification flag
    pub fn refresh_status(&mut self, now: DateTime<Utc>) {
        self.status = derive_status(self.expiry_date, self.is_verified, now);
    }

    pub fn mark_verified(&mut self, verifier: Uuid, now: DateTime<Utc>) {
        self.is_verified = true;
        self.verified_by = Some(verifier);
        self.verified_at = Some(now);
        self.updated_at = now;
        self.refresh_status(now);
    }

    pub fn clear_verification(&mut self) {
        self.is_verified = false;
        self.verified_by = None;
        self.verified_at = None;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|date| is_document_expired(date, now))
    }
}

pub fn derive_status(
    expiry_date: Option<DateTime<Utc>>,
    is_verified: bool,
    now: DateTime<Utc>,
) -> DocumentStatus {
    match expiry_date {
        Some(date) if is_document_expired(date, now) => DocumentStatus::Expired,
        _ if is_verified => DocumentStatus::Active,
        _ => DocumentStatus::PendingVerification,
    }
}

pub fn is_document_expired(expiry_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expiry_date < now
}

/// Not yet expired but due within `threshold_days`
pub fn is_document_expiring_soon(
    expiry_date: DateTime<Utc>,
    threshold_days: i64,
    now: DateTime<Utc>,
) -> bool {
    !is_document_expired(expiry_date, now) && expiry_date <= now + Duration::days(threshold_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_predicates() {
        let now = Utc::now();
        assert!(is_document_expired(now - Duration::seconds(1), now));
        assert!(!is_document_expired(now + Duration::seconds(1), now));

        assert!(is_document_expiring_soon(now + Duration::days(10), 30, now));
        assert!(is_document_expiring_soon(now + Duration::days(30), 30, now));
        assert!(!is_document_expiring_soon(now + Duration::days(31), 30, now));
        assert!(!is_document_expiring_soon(now - Duration::days(1), 30, now));
    }

    #[test]
    fn test_status_is_derived_from_expiry_and_verification() {
        let now = Utc::now();
        assert_eq!(derive_status(Some(now - Duration::days(1)), true, now), DocumentStatus::Expired);
        assert_eq!(derive_status(Some(now + Duration::days(90)), true, now), DocumentStatus::Active);
        assert_eq!(
            derive_status(Some(now + Duration::days(90)), false, now),
            DocumentStatus::PendingVerification
        );
        assert_eq!(derive_status(None, true, now), DocumentStatus::Active);
    }

    #[test]
    fn test_verification_updates_status() {
        let now = Utc::now();
        let mut doc = Document::new(
            Uuid::new_v4(),
            EntityType::Vehicle,
            Uuid::new_v4(),
            DocumentType::Permit,
            "PRM-1".into(),
            None,
            Some(now + Duration::days(200)),
        );
        assert_eq!(doc.status, DocumentStatus::PendingVerification);

        let verifier = Uuid::new_v4();
        doc.mark_verified(verifier, now);
        assert_eq!(doc.status, DocumentStatus::Active);
        assert_eq!(doc.verified_by, Some(verifier));
    }

    #[test]
    fn test_document_types_belong_to_one_entity() {
        assert!(DocumentType::Permit.allowed_for(EntityType::Vehicle));
        assert!(!DocumentType::Permit.allowed_for(EntityType::Driver));
        assert!(DocumentType::DrivingLicense.allowed_for(EntityType::Driver));
        assert!(DocumentType::GstCertificate.allowed_for(EntityType::Vendor));
    }
}
