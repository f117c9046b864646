//! Authorization
//!
//! A vendor may act on itself and on its descendants. Vehicles, drivers and
//! documents inherit the scope of their owning vendor.

use uuid::Uuid;

use crate::models::{Permission, Vendor, VendorType};
use crate::services::hierarchy_service::HierarchyService;
use crate::utils::errors::{forbidden_error, AppResult};

#[derive(Clone)]
pub struct AuthorizationService {
    hierarchy: HierarchyService,
}

impl AuthorizationService {
    pub fn new(hierarchy: HierarchyService) -> Self {
        Self { hierarchy }
    }

    pub fn ensure_permission(&self, actor: &Vendor, permission: Permission) -> AppResult<()> {
        if actor.has_permission(permission) {
            return Ok(());
        }
        Err(forbidden_error(
            "perform this action",
            &format!("missing permission {:?}", permission),
        ))
    }

    pub async fn can_access_vendor(&self, actor: &Vendor, target_vendor_id: Uuid) -> AppResult<bool> {
        self.hierarchy.is_ancestor_or_self(actor.id, target_vendor_id).await
    }

    /// Fails with 403 unless `target_vendor_id` is the actor or below it
    pub async fn ensure_vendor_scope(&self, actor: &Vendor, target_vendor_id: Uuid) -> AppResult<()> {
        if self.can_access_vendor(actor, target_vendor_id).await? {
            return Ok(());
        }
        Err(forbidden_error(
            "access vendor",
            &format!("{} is outside the hierarchy of {}", target_vendor_id, actor.id),
        ))
    }

    /// Scope check followed by a permission check
    pub async fn authorize(&self, actor: &Vendor, target_vendor_id: Uuid, permission: Permission) -> AppResult<()> {
        self.ensure_permission(actor, permission)?;
        self.ensure_vendor_scope(actor, target_vendor_id).await
    }

    /// The actor's id followed by every descendant id
    pub async fn scope_vendor_ids(&self, actor: &Vendor) -> AppResult<Vec<Uuid>> {
        let mut ids = vec![actor.id];
        ids.extend(
            self.hierarchy
                .get_all_sub_vendors(actor.id)
                .await?
                .into_iter()
                .map(|v| v.id),
        );
        Ok(ids)
    }

    /// Permissions for a new vendor: the explicit list when given, else the
    /// type defaults. Neither may exceed what the creator holds.
    pub fn grantable_permissions(
        &self,
        actor: &Vendor,
        child_type: VendorType,
        requested: Option<Vec<Permission>>,
    ) -> AppResult<Vec<Permission>> {
        match requested {
            Some(list) => {
                if let Some(extra) = list.iter().find(|p| !actor.has_permission(**p)) {
                    return Err(forbidden_error(
                        "grant permissions",
                        &format!("{:?} is not held by the creating vendor", extra),
                    ));
                }
                let mut list = list;
                list.sort_by_key(|p| Permission::ALL.iter().position(|a| a == p));
                list.dedup();
                Ok(list)
            }
            None => Ok(child_type
                .default_permissions()
                .into_iter()
                .filter(|p| actor.has_permission(*p))
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperatingArea;
    use crate::repositories::memory::InMemoryVendorRepository;
    use crate::repositories::VendorRepository;
    use crate::services::cache_service::CacheService;
    use crate::utils::errors::AppError;
    use std::sync::Arc;

    async fn setup() -> (AuthorizationService, Vendor, Vendor, Vendor) {
        let repo = Arc::new(InMemoryVendorRepository::new());
        let make = |email: &str, t: VendorType, parent: Option<Uuid>| {
            Vendor::new(
                email.into(),
                email.into(),
                String::new(),
                t,
                parent,
                t.default_permissions(),
                OperatingArea::default(),
            )
        };
        let root = repo.create(&make("root@t", VendorType::Super, None)).await.unwrap();
        let city_a = repo
            .create(&make("a@t", VendorType::City, Some(root.id)))
            .await
            .unwrap();
        let city_b = repo
            .create(&make("b@t", VendorType::City, Some(root.id)))
            .await
            .unwrap();
        let hierarchy = HierarchyService::new(repo, CacheService::disabled());
        (AuthorizationService::new(hierarchy), root, city_a, city_b)
    }

    #[tokio::test]
    async fn test_scope_covers_self_and_descendants_only() {
        let (authz, root, city_a, city_b) = setup().await;
        assert!(authz.ensure_vendor_scope(&root, city_a.id).await.is_ok());
        assert!(authz.ensure_vendor_scope(&city_a, city_a.id).await.is_ok());
        assert!(matches!(
            authz.ensure_vendor_scope(&city_a, city_b.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authz.ensure_vendor_scope(&city_a, root.id).await,
            Err(AppError::Forbidden(_))
        ));

        let ids = authz.scope_vendor_ids(&root).await.unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], root.id);
    }

    #[tokio::test]
    async fn test_permissions_cannot_exceed_creator() {
        let (authz, _root, mut city_a, _) = setup().await;
        city_a.permissions = vec![Permission::ManageVehicles];

        let defaults = authz.grantable_permissions(&city_a, VendorType::Local, None).unwrap();
        assert_eq!(defaults, vec![Permission::ManageVehicles]);

        let escalated =
            authz.grantable_permissions(&city_a, VendorType::Local, Some(vec![Permission::VerifyDocuments]));
        assert!(matches!(escalated, Err(AppError::Forbidden(_))));

        assert!(authz.ensure_permission(&city_a, Permission::ManageDrivers).is_err());
    }
}
