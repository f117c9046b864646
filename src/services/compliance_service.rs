//! Compliance and document status
//!
//! Classifies documents against "now" and rolls them up per entity and per
//! vendor. An entity is compliant only when it has at least one document and
//! every document is verified and unexpired.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cache::AGGREGATE_TTL_SECS;
use crate::models::document::{is_document_expired, is_document_expiring_soon};
use crate::models::{Document, DocumentType, EntityType, Vendor};
use crate::repositories::{DocumentRepository, DriverRepository, VehicleRepository, VendorRepository};
use crate::services::cache_service::{compliance_key, document_status_key, CacheService};
use crate::services::hierarchy_service::HierarchyService;
use crate::services::notification_service::NotificationService;
use crate::utils::errors::AppResult;
use crate::utils::metrics::{NOTIFICATIONS_FAILED, NOTIFICATIONS_SENT};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryClass {
    Expired,
    ExpiringSoon,
    Valid,
}

pub fn classify(document: &Document, threshold_days: i64, now: DateTime<Utc>) -> ExpiryClass {
    match document.expiry_date {
        Some(date) if is_document_expired(date, now) => ExpiryClass::Expired,
        Some(date) if is_document_expiring_soon(date, threshold_days, now) => ExpiryClass::ExpiringSoon,
        _ => ExpiryClass::Valid,
    }
}

/// Zero documents is never compliant
pub fn is_entity_compliant(documents: &[Document], now: DateTime<Utc>) -> bool {
    !documents.is_empty() && documents.iter().all(|d| d.is_verified && !d.is_expired(now))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentClassification {
    pub id: Uuid,
    pub document_type: DocumentType,
    pub document_number: String,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub class: ExpiryClass,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCounts {
    pub total: usize,
    pub verified: usize,
    pub expired: usize,
    pub expiring_soon: usize,
    pub pending_verification: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDocumentStatus {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub counts: DocumentCounts,
    pub documents: Vec<DocumentClassification>,
    pub is_compliant: bool,
}

pub fn summarize(
    entity_type: EntityType,
    entity_id: Uuid,
    documents: &[Document],
    threshold_days: i64,
    now: DateTime<Utc>,
) -> EntityDocumentStatus {
    let mut counts = DocumentCounts {
        total: documents.len(),
        ..Default::default()
    };
    let mut classified = Vec::with_capacity(documents.len());

    for document in documents {
        let class = classify(document, threshold_days, now);
        match class {
            ExpiryClass::Expired => counts.expired += 1,
            ExpiryClass::ExpiringSoon => counts.expiring_soon += 1,
            ExpiryClass::Valid => {}
        }
        if document.is_verified {
            counts.verified += 1;
        } else {
            counts.pending_verification += 1;
        }
        classified.push(DocumentClassification {
            id: document.id,
            document_type: document.document_type,
            document_number: document.document_number.clone(),
            expiry_date: document.expiry_date,
            is_verified: document.is_verified,
            class,
        });
    }

    EntityDocumentStatus {
        entity_type,
        entity_id,
        counts,
        documents: classified,
        is_compliant: is_entity_compliant(documents, now),
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCounts {
    pub total: usize,
    pub compliant: usize,
    pub non_compliant: usize,
}

impl ComplianceCounts {
    fn record(&mut self, compliant: bool) {
        self.total += 1;
        if compliant {
            self.compliant += 1;
        } else {
            self.non_compliant += 1;
        }
    }

    fn add(&mut self, other: &ComplianceCounts) {
        self.total += other.total;
        self.compliant += other.compliant;
        self.non_compliant += other.non_compliant;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorComplianceReport {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub vehicles: ComplianceCounts,
    pub drivers: ComplianceCounts,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkComplianceReport {
    #[serde(flatten)]
    pub vendor: VendorComplianceReport,
    pub sub_vendors: Vec<VendorComplianceReport>,
    pub total: NetworkTotals,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTotals {
    pub vehicles: ComplianceCounts,
    pub drivers: ComplianceCounts,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    pub scanned: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ComplianceService {
    vendors: Arc<dyn VendorRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    drivers: Arc<dyn DriverRepository>,
    documents: Arc<dyn DocumentRepository>,
    hierarchy: HierarchyService,
    notifications: NotificationService,
    cache: CacheService,
    threshold_days: i64,
}

impl ComplianceService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vendors: Arc<dyn VendorRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        drivers: Arc<dyn DriverRepository>,
        documents: Arc<dyn DocumentRepository>,
        hierarchy: HierarchyService,
        notifications: NotificationService,
        cache: CacheService,
        threshold_days: i64,
    ) -> Self {
        Self {
            vendors,
            vehicles,
            drivers,
            documents,
            hierarchy,
            notifications,
            cache,
            threshold_days,
        }
    }

    pub fn threshold_days(&self) -> i64 {
        self.threshold_days
    }

    /// Document status of one vehicle, driver or vendor, cached 300s
    pub async fn entity_document_status(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> AppResult<EntityDocumentStatus> {
        let documents = self.documents.clone();
        let threshold = self.threshold_days;
        self.cache
            .get_or_compute(
                &document_status_key(entity_type, entity_id),
                AGGREGATE_TTL_SECS,
                move || async move {
                    let list = documents.find_for_entity(entity_type, entity_id).await?;
                    Ok(summarize(entity_type, entity_id, &list, threshold, Utc::now()))
                },
            )
            .await
    }

    pub async fn is_compliant(&self, entity_type: EntityType, entity_id: Uuid) -> AppResult<bool> {
        let documents = self.documents.find_for_entity(entity_type, entity_id).await?;
        Ok(is_entity_compliant(&documents, Utc::now()))
    }

    /// Vehicle and driver compliance counts for a single vendor, cached 300s
    pub async fn vendor_compliance_report(&self, vendor_id: Uuid) -> AppResult<VendorComplianceReport> {
        let vendor = self.hierarchy.get_vendor(vendor_id).await?;
        let service = self.clone();
        self.cache
            .get_or_compute(&compliance_key(vendor_id), AGGREGATE_TTL_SECS, move || async move {
                service.build_report(&vendor).await
            })
            .await
    }

    async fn build_report(&self, vendor: &Vendor) -> AppResult<VendorComplianceReport> {
        let (vehicles, drivers, documents) = futures::try_join!(
            self.vehicles.list_by_vendor(vendor.id),
            self.drivers.list_by_vendor(vendor.id),
            self.documents.list_by_vendor(vendor.id),
        )?;

        let mut by_entity: HashMap<(EntityType, Uuid), Vec<Document>> = HashMap::new();
        for document in documents {
            by_entity
                .entry((document.entity_type, document.entity_id))
                .or_default()
                .push(document);
        }

        let now = Utc::now();
        let compliant = |entity_type: EntityType, id: Uuid| {
            by_entity
                .get(&(entity_type, id))
                .is_some_and(|docs| is_entity_compliant(docs, now))
        };

        let mut vehicle_counts = ComplianceCounts::default();
        for vehicle in &vehicles {
            vehicle_counts.record(compliant(EntityType::Vehicle, vehicle.id));
        }
        let mut driver_counts = ComplianceCounts::default();
        for driver in &drivers {
            driver_counts.record(compliant(EntityType::Driver, driver.id));
        }

        Ok(VendorComplianceReport {
            vendor_id: vendor.id,
            vendor_name: vendor.name.clone(),
            vehicles: vehicle_counts,
            drivers: driver_counts,
            generated_at: now,
        })
    }

    /// Report for a vendor plus one per descendant, with summed totals
    pub async fn network_compliance_report(&self, vendor_id: Uuid) -> AppResult<NetworkComplianceReport> {
        let own = self.vendor_compliance_report(vendor_id).await?;
        let descendants = self.hierarchy.get_all_sub_vendors(vendor_id).await?;

        let sub_vendors = futures::future::try_join_all(
            descendants.iter().map(|v| self.vendor_compliance_report(v.id)),
        )
        .await?;

        let mut total = NetworkTotals {
            vehicles: own.vehicles,
            drivers: own.drivers,
        };
        for report in &sub_vendors {
            total.vehicles.add(&report.vehicles);
            total.drivers.add(&report.drivers);
        }

        Ok(NetworkComplianceReport {
            vendor: own,
            sub_vendors,
            total,
        })
    }

    /// Documents not yet expired that expire within `threshold_days`,
    /// optionally restricted to the given owning vendors. Documents already
    /// past their expiry are reported by the status endpoints instead.
    pub async fn expiring_documents(
        &self,
        threshold_days: i64,
        vendor_scope: Option<&[Uuid]>,
    ) -> AppResult<Vec<Document>> {
        let now = Utc::now();
        let cutoff = now + Duration::days(threshold_days);
        let documents = self.documents.find_expiring_between(now, cutoff).await?;
        Ok(match vendor_scope {
            Some(scope) => documents.into_iter().filter(|d| scope.contains(&d.vendor)).collect(),
            None => documents,
        })
    }

    /// Send one notification per document expiring within the window. A
    /// failed send is counted and the scan moves on.
    pub async fn check_and_notify_expiring_documents(&self, threshold_days: i64) -> AppResult<NotificationSummary> {
        let documents = self.expiring_documents(threshold_days, None).await?;
        let mut summary = NotificationSummary {
            scanned: documents.len(),
            ..Default::default()
        };
        let mut owners: HashMap<Uuid, Option<Vendor>> = HashMap::new();

        for document in &documents {
            if !owners.contains_key(&document.vendor) {
                let owner = match self.vendors.find_by_id(document.vendor).await {
                    Ok(owner) => owner,
                    Err(e) => {
                        error!("❌ Could not load vendor {}: {}", document.vendor, e);
                        None
                    }
                };
                owners.insert(document.vendor, owner);
            }
            let Some(Some(vendor)) = owners.get(&document.vendor) else {
                warn!("⚠️ Document {} has no reachable owner, not notified", document.id);
                summary.failed += 1;
                NOTIFICATIONS_FAILED.inc();
                continue;
            };

            match self.notifications.send_expiry_notification(vendor, document).await {
                Ok(()) => {
                    summary.sent += 1;
                    NOTIFICATIONS_SENT.inc();
                }
                Err(e) => {
                    error!("❌ Expiry notification for document {} failed: {}", document.id, e);
                    summary.failed += 1;
                    NOTIFICATIONS_FAILED.inc();
                }
            }
        }

        info!(
            "📬 Expiry scan done: scanned={} sent={} failed={}",
            summary.scanned, summary.sent, summary.failed
        );
        Ok(summary)
    }

    /// Rewrite documents whose expiry has passed but whose stored status is stale
    pub async fn refresh_expired_statuses(&self) -> AppResult<u64> {
        let now = Utc::now();
        let stale = self.documents.find_stale_expired(now).await?;
        let mut updated = 0u64;

        for mut document in stale {
            document.refresh_status(now);
            self.documents.update(&document).await?;
            self.cache
                .invalidate_document_status(document.entity_type, document.entity_id)
                .await;
            self.cache.invalidate_vendor_aggregates(document.vendor).await;
            updated += 1;
        }

        if updated > 0 {
            info!("🔄 Marked {} documents as EXPIRED", updated);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::models::{Driver, FuelType, OperatingArea, Vehicle, VendorType};
    use crate::repositories::memory::{
        InMemoryDocumentRepository, InMemoryDriverRepository, InMemoryVehicleRepository,
        InMemoryVendorRepository,
    };
    use crate::services::notification_service::{EmailMessage, Mailer};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails for every recipient listed in `reject`
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
        reject: Vec<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
            if self.reject.contains(&message.to) {
                anyhow::bail!("mailbox unavailable");
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct Fixture {
        service: ComplianceService,
        vendors: Arc<InMemoryVendorRepository>,
        vehicles: Arc<InMemoryVehicleRepository>,
        drivers: Arc<InMemoryDriverRepository>,
        documents: Arc<InMemoryDocumentRepository>,
        mailer: Arc<RecordingMailer>,
    }

    fn fixture(reject: Vec<String>) -> Fixture {
        let vendors = Arc::new(InMemoryVendorRepository::new());
        let vehicles = Arc::new(InMemoryVehicleRepository::new());
        let drivers = Arc::new(InMemoryDriverRepository::new());
        let documents = Arc::new(InMemoryDocumentRepository::new());
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
            reject,
        });
        let cache = CacheService::new(Some(Arc::new(MemoryCache::new())));
        let hierarchy = HierarchyService::new(vendors.clone(), cache.clone());
        let notifications = NotificationService::new(mailer.clone(), "fleet@test".into());
        let service = ComplianceService::new(
            vendors.clone(),
            vehicles.clone(),
            drivers.clone(),
            documents.clone(),
            hierarchy,
            notifications,
            cache,
            30,
        );
        Fixture {
            service,
            vendors,
            vehicles,
            drivers,
            documents,
            mailer,
        }
    }

    async fn vendor(f: &Fixture, email: &str, vendor_type: VendorType, parent: Option<Uuid>) -> Vendor {
        let vendor = Vendor::new(
            email.to_string(),
            email.to_string(),
            String::new(),
            vendor_type,
            parent,
            vendor_type.default_permissions(),
            OperatingArea::default(),
        );
        f.vendors.create(&vendor).await.unwrap()
    }

    async fn vehicle(f: &Fixture, vendor_id: Uuid, reg: &str) -> Vehicle {
        let vehicle = Vehicle::new(vendor_id, reg.into(), "Tempo".into(), 12, FuelType::Diesel);
        f.vehicles.create(&vehicle).await.unwrap()
    }

    async fn document(
        f: &Fixture,
        vendor_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        document_type: DocumentType,
        expiry_in_days: i64,
        verified: bool,
    ) -> Document {
        let now = Utc::now();
        let mut doc = Document::new(
            vendor_id,
            entity_type,
            entity_id,
            document_type,
            format!("{:?}-{}", document_type, expiry_in_days),
            None,
            Some(now + Duration::days(expiry_in_days)),
        );
        if verified {
            doc.mark_verified(vendor_id, now);
        }
        f.documents.create(&doc).await.unwrap()
    }

    #[test]
    fn test_zero_documents_is_never_compliant() {
        assert!(!is_entity_compliant(&[], Utc::now()));
    }

    #[test]
    fn test_summarize_counts_each_class() {
        let now = Utc::now();
        let owner = Uuid::new_v4();
        let entity = Uuid::new_v4();
        let make = |document_type, days: i64, verified: bool| {
            let mut d = Document::new(
                owner,
                EntityType::Driver,
                entity,
                document_type,
                "N".into(),
                None,
                Some(now + Duration::days(days)),
            );
            if verified {
                d.mark_verified(owner, now);
            }
            d
        };
        let docs = vec![
            make(DocumentType::DrivingLicense, -1, true),
            make(DocumentType::AddressProof, 10, true),
            make(DocumentType::IdentityProof, 300, false),
        ];

        let status = summarize(EntityType::Driver, entity, &docs, 30, now);
        assert_eq!(
            status.counts,
            DocumentCounts {
                total: 3,
                verified: 2,
                expired: 1,
                expiring_soon: 1,
                pending_verification: 1,
            }
        );
        assert!(!status.is_compliant);
        assert_eq!(status.documents[0].class, ExpiryClass::Expired);
    }

    #[tokio::test]
    async fn test_vendor_report_partitions_vehicles() {
        let f = fixture(vec![]);
        let owner = vendor(&f, "city@fleet.test", VendorType::City, None).await;
        let good = vehicle(&f, owner.id, "KA01AB0001").await;
        let bad = vehicle(&f, owner.id, "KA01AB0002").await;

        document(&f, owner.id, EntityType::Vehicle, good.id, DocumentType::Insurance, 200, true).await;
        document(&f, owner.id, EntityType::Vehicle, good.id, DocumentType::Permit, 100, true).await;
        document(&f, owner.id, EntityType::Vehicle, bad.id, DocumentType::Insurance, -3, true).await;
        document(&f, owner.id, EntityType::Vehicle, bad.id, DocumentType::Permit, 100, true).await;

        let report = f.service.vendor_compliance_report(owner.id).await.unwrap();
        assert_eq!(
            report.vehicles,
            ComplianceCounts {
                total: 2,
                compliant: 1,
                non_compliant: 1,
            }
        );
        assert_eq!(report.drivers.total, 0);
    }

    #[tokio::test]
    async fn test_driver_without_documents_is_non_compliant() {
        let f = fixture(vec![]);
        let owner = vendor(&f, "city@fleet.test", VendorType::City, None).await;
        let driver = Driver::new(owner.id, "Ravi".into(), "ravi@fleet.test".into(), "9876543210".into());
        f.drivers.create(&driver).await.unwrap();

        let report = f.service.vendor_compliance_report(owner.id).await.unwrap();
        assert_eq!(report.drivers.non_compliant, 1);
        assert!(!f.service.is_compliant(EntityType::Driver, driver.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_network_report_sums_sub_vendors() {
        let f = fixture(vec![]);
        let root = vendor(&f, "root@fleet.test", VendorType::Super, None).await;
        let city = vendor(&f, "city@fleet.test", VendorType::City, Some(root.id)).await;
        let v1 = vehicle(&f, root.id, "KA01AB0001").await;
        vehicle(&f, city.id, "KA01AB0002").await;
        document(&f, root.id, EntityType::Vehicle, v1.id, DocumentType::Insurance, 90, true).await;

        let report = f.service.network_compliance_report(root.id).await.unwrap();
        assert_eq!(report.sub_vendors.len(), 1);
        assert_eq!(report.total.vehicles.total, 2);
        assert_eq!(report.total.vehicles.compliant, 1);
        assert_eq!(report.total.vehicles.non_compliant, 1);
    }

    #[tokio::test]
    async fn test_notify_continues_after_failures() {
        let f = fixture(vec!["bounce@fleet.test".to_string()]);
        let ok_vendor = vendor(&f, "ok@fleet.test", VendorType::City, None).await;
        let bounce = vendor(&f, "bounce@fleet.test", VendorType::City, None).await;
        let v1 = vehicle(&f, ok_vendor.id, "KA01AB0001").await;
        let v2 = vehicle(&f, bounce.id, "KA01AB0002").await;

        document(&f, ok_vendor.id, EntityType::Vehicle, v1.id, DocumentType::Insurance, 5, true).await;
        document(&f, bounce.id, EntityType::Vehicle, v2.id, DocumentType::Insurance, 5, true).await;
        // outside the window
        document(&f, ok_vendor.id, EntityType::Vehicle, v1.id, DocumentType::FitnessCertificate, 90, true).await;

        let summary = f.service.check_and_notify_expiring_documents(30).await.unwrap();
        assert_eq!(
            summary,
            NotificationSummary {
                scanned: 2,
                sent: 1,
                failed: 1,
            }
        );
        assert_eq!(f.mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_long_expired_documents_are_not_renotified() {
        let f = fixture(vec![]);
        let owner = vendor(&f, "city@fleet.test", VendorType::City, None).await;
        let v = vehicle(&f, owner.id, "KA01AB0001").await;
        document(&f, owner.id, EntityType::Vehicle, v.id, DocumentType::Insurance, -400, true).await;
        document(&f, owner.id, EntityType::Vehicle, v.id, DocumentType::Permit, -2, true).await;
        document(&f, owner.id, EntityType::Vehicle, v.id, DocumentType::PollutionCertificate, 3, true).await;

        for _ in 0..2 {
            let summary = f.service.check_and_notify_expiring_documents(30).await.unwrap();
            assert_eq!(summary.scanned, 1);
            assert_eq!(summary.sent, 1);
        }
        assert_eq!(f.mailer.sent.lock().unwrap().len(), 2);
        assert_eq!(f.service.expiring_documents(30, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_marks_stale_documents_expired() {
        let f = fixture(vec![]);
        let owner = vendor(&f, "city@fleet.test", VendorType::City, None).await;
        let v = vehicle(&f, owner.id, "KA01AB0001").await;
        let mut doc = document(&f, owner.id, EntityType::Vehicle, v.id, DocumentType::Insurance, 10, true).await;

        // simulate time passing: the expiry moved into the past without a write
        doc.expiry_date = Some(Utc::now() - Duration::days(1));
        f.documents.update(&doc).await.unwrap();
        assert_eq!(f.service.refresh_expired_statuses().await.unwrap(), 1);

        let stored = f.documents.find_by_id(doc.id).await.unwrap().unwrap();
        assert_eq!(stored.status, crate::models::DocumentStatus::Expired);
        assert_eq!(f.service.refresh_expired_statuses().await.unwrap(), 0);
    }
}
