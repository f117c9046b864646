//! Vendor management
//!
//! Creation, profile updates and deletion of vendors inside the hierarchy.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::dto::vendor_dto::{CreateVendorRequest, UpdateVendorRequest};
use crate::models::{EntityType, Permission, Vendor, VendorType};
use crate::repositories::VendorRepository;
use crate::services::auth_service::AuthService;
use crate::services::authorization_service::AuthorizationService;
use crate::services::document_service::DocumentService;
use crate::services::fleet_service::FleetService;
use crate::services::hierarchy_service::HierarchyService;
use crate::utils::errors::{conflict_error, AppError, AppResult};

#[derive(Clone)]
pub struct VendorService {
    vendors: Arc<dyn VendorRepository>,
    hierarchy: HierarchyService,
    authorization: AuthorizationService,
    auth: AuthService,
    fleet: FleetService,
    documents: DocumentService,
}

impl VendorService {
    pub fn new(
        vendors: Arc<dyn VendorRepository>,
        hierarchy: HierarchyService,
        authorization: AuthorizationService,
        auth: AuthService,
        fleet: FleetService,
        documents: DocumentService,
    ) -> Self {
        Self {
            vendors,
            hierarchy,
            authorization,
            auth,
            fleet,
            documents,
        }
    }

    /// Create a vendor below `parentVendor` (or below the actor)
    pub async fn create_vendor(&self, actor: &Vendor, request: CreateVendorRequest) -> AppResult<Vendor> {
        let parent_id = request.parent_vendor.unwrap_or(actor.id);
        self.authorization
            .authorize(actor, parent_id, Permission::ManageVendors)
            .await?;

        let parent = self
            .hierarchy
            .validate_placement(request.vendor_type, Some(parent_id), &request.operating_area)
            .await?;

        let email = request.email.trim().to_lowercase();
        if self.vendors.find_by_email(&email).await?.is_some() {
            return Err(conflict_error("Vendor", "email", &email));
        }

        let permissions = self
            .authorization
            .grantable_permissions(actor, request.vendor_type, request.permissions)?;
        let password_hash = self.auth.hash_password(&request.password).await?;

        let vendor = Vendor::new(
            request.name.trim().to_string(),
            email,
            password_hash,
            request.vendor_type,
            parent.as_ref().map(|p| p.id),
            permissions,
            request.operating_area,
        );
        let created = self.vendors.create(&vendor).await?;
        self.hierarchy.invalidate_hierarchy(parent_id).await;

        info!(
            "🏢 {} vendor {} created under {} by {}",
            created.vendor_type, created.email, parent_id, actor.id
        );
        Ok(created)
    }

    pub async fn update_vendor(&self, actor: &Vendor, vendor_id: Uuid, request: UpdateVendorRequest) -> AppResult<Vendor> {
        let mut vendor = self.hierarchy.get_vendor(vendor_id).await?;

        if let Some(name) = request.name {
            vendor.name = name.trim().to_string();
        }
        if let Some(area) = request.operating_area {
            match vendor.vendor_type {
                VendorType::Local => {
                    self.hierarchy
                        .validate_placement(VendorType::Local, vendor.parent_vendor, &area)
                        .await?;
                }
                VendorType::City => self.hierarchy.ensure_locals_within(vendor.id, &area).await?,
                _ => {}
            }
            vendor.operating_area = area;
        }
        if let Some(permissions) = request.permissions {
            if actor.id == vendor.id {
                return Err(AppError::Forbidden(
                    "A vendor cannot change its own permissions".to_string(),
                ));
            }
            vendor.permissions = self
                .authorization
                .grantable_permissions(actor, vendor.vendor_type, Some(permissions))?;
        }
        if let Some(is_active) = request.is_active {
            if actor.id == vendor.id && !is_active {
                return Err(AppError::BadRequest("A vendor cannot deactivate itself".to_string()));
            }
            vendor.is_active = is_active;
        }

        vendor.updated_at = Utc::now();
        let updated = self.vendors.update(&vendor).await?;
        self.hierarchy.invalidate_hierarchy(updated.id).await;
        Ok(updated)
    }

    /// Remove a vendor that has no sub-vendors, vehicles or drivers left
    pub async fn delete_vendor(&self, vendor_id: Uuid) -> AppResult<Vendor> {
        let vendor = self.hierarchy.get_vendor(vendor_id).await?;

        if !self.vendors.find_children(vendor_id, &VendorType::ALL).await?.is_empty() {
            return Err(AppError::Conflict(
                "Vendor still has sub-vendors; transfer or delete them first".to_string(),
            ));
        }
        if self.fleet.vendor_has_fleet(vendor_id).await? {
            return Err(AppError::Conflict(
                "Vendor still owns vehicles or drivers".to_string(),
            ));
        }

        // parent chain has to be resolved before the row disappears
        self.hierarchy.invalidate_hierarchy(vendor_id).await;
        self.documents
            .delete_for_entity(vendor_id, EntityType::Vendor, vendor_id)
            .await?;
        self.vendors.delete(vendor_id).await?;
        info!("🗑️ Vendor {} deleted", vendor.email);
        Ok(vendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentConfig;
    use crate::dto::auth_dto::RegisterSuperVendorRequest;
    use crate::dto::vehicle_dto::CreateVehicleRequest;
    use crate::models::{FuelType, OperatingArea};
    use crate::repositories::Repositories;
    use crate::services::notification_service::LogMailer;
    use crate::services::CacheService;
    use crate::state::AppState;

    async fn state_with_root() -> (AppState, Vendor) {
        let config = EnvironmentConfig {
            allow_super_registration: true,
            bcrypt_cost: 4,
            ..EnvironmentConfig::default()
        };
        let state = AppState::new(
            config,
            Repositories::in_memory(),
            CacheService::disabled(),
            std::sync::Arc::new(LogMailer),
        );
        let root = state
            .auth
            .register_super_vendor(RegisterSuperVendorRequest {
                name: "Root".into(),
                email: "root@fleet.test".into(),
                password: "password123".into(),
                operating_area: OperatingArea::default(),
            })
            .await
            .unwrap();
        (state, root)
    }

    fn city_request(email: &str) -> CreateVendorRequest {
        CreateVendorRequest {
            name: "Delhi Office".into(),
            email: email.into(),
            password: "password123".into(),
            vendor_type: VendorType::City,
            parent_vendor: None,
            permissions: None,
            operating_area: OperatingArea {
                city: "Delhi".into(),
                ..OperatingArea::default()
            },
        }
    }

    #[tokio::test]
    async fn test_create_defaults_parent_to_actor_and_rejects_duplicate_email() {
        let (state, root) = state_with_root().await;

        let city = state.vendors.create_vendor(&root, city_request("Delhi@Fleet.test")).await.unwrap();
        assert_eq!(city.parent_vendor, Some(root.id));
        assert_eq!(city.email, "delhi@fleet.test");

        let err = state
            .vendors
            .create_vendor(&root, city_request("delhi@fleet.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_vendor_cannot_change_own_permissions_or_deactivate() {
        let (state, root) = state_with_root().await;

        let err = state
            .vendors
            .update_vendor(
                &root,
                root.id,
                UpdateVendorRequest {
                    name: None,
                    operating_area: None,
                    permissions: Some(vec![Permission::ViewReports]),
                    is_active: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = state
            .vendors
            .update_vendor(
                &root,
                root.id,
                UpdateVendorRequest {
                    name: None,
                    operating_area: None,
                    permissions: None,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    fn area_update(city: &str, zones: &[&str]) -> UpdateVendorRequest {
        UpdateVendorRequest {
            name: None,
            operating_area: Some(OperatingArea {
                city: city.into(),
                zones: zones.iter().map(|z| z.to_string()).collect(),
                ..OperatingArea::default()
            }),
            permissions: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_city_area_change_must_keep_locals_inside() {
        let (state, root) = state_with_root().await;
        let city = state
            .vendors
            .update_vendor(
                &root,
                state.vendors.create_vendor(&root, city_request("delhi@fleet.test")).await.unwrap().id,
                area_update("Delhi", &["Saket", "Dwarka"]),
            )
            .await
            .unwrap();
        let local = state
            .vendors
            .create_vendor(
                &root,
                CreateVendorRequest {
                    name: "Saket Cabs".into(),
                    email: "saket@fleet.test".into(),
                    password: "password123".into(),
                    vendor_type: VendorType::Local,
                    parent_vendor: Some(city.id),
                    permissions: None,
                    operating_area: OperatingArea {
                        city: "Delhi".into(),
                        zones: vec!["Saket".into()],
                        ..OperatingArea::default()
                    },
                },
            )
            .await
            .unwrap();

        for rejected in [area_update("Mumbai", &[]), area_update("Delhi", &["Dwarka"])] {
            let err = state.vendors.update_vendor(&city, city.id, rejected).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidHierarchy(_)));
        }
        let stored = state.hierarchy.get_vendor(city.id).await.unwrap();
        assert_eq!(stored.operating_area.zones, vec!["Saket".to_string(), "Dwarka".to_string()]);

        let widened = state
            .vendors
            .update_vendor(&city, city.id, area_update("Delhi", &["Saket", "Dwarka", "Rohini"]))
            .await
            .unwrap();
        assert_eq!(widened.operating_area.zones.len(), 3);
        assert_eq!(local.parent_vendor, Some(city.id));
    }

    #[tokio::test]
    async fn test_delete_refused_while_fleet_exists() {
        let (state, root) = state_with_root().await;
        let city = state.vendors.create_vendor(&root, city_request("delhi@fleet.test")).await.unwrap();

        let vehicle = state
            .fleet
            .create_vehicle(
                city.id,
                CreateVehicleRequest {
                    registration_number: "DL01AB1234".into(),
                    model: "Ertiga".into(),
                    seating_capacity: 7,
                    fuel_type: FuelType::Cng,
                    vendor: None,
                    documents: None,
                },
            )
            .await
            .unwrap();

        let err = state.vendors.delete_vendor(city.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        state.fleet.delete_vehicle(vehicle.id).await.unwrap();
        let deleted = state.vendors.delete_vendor(city.id).await.unwrap();
        assert_eq!(deleted.id, city.id);
        assert!(state.hierarchy.get_vendor(city.id).await.is_err());
    }
}
