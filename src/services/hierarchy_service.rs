//! Vendor hierarchy
//!
//! Builds and walks the vendor tree. Every traversal is bounded by
//! `MAX_HIERARCHY_DEPTH` and guarded by a visited set, so a corrupted
//! parent pointer can never send a walk into a loop.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{OperatingArea, Vendor, VendorType, MAX_HIERARCHY_DEPTH};
use crate::repositories::VendorRepository;
use crate::services::cache_service::{hierarchy_key, CacheService};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// One node of a vendor tree as returned by `GET /api/vendors/:id/hierarchy`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorNode {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub vendor_type: VendorType,
    pub operating_area: OperatingArea,
    pub is_active: bool,
    pub children: Vec<VendorNode>,
}

impl VendorNode {
    fn leaf(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id,
            name: vendor.name.clone(),
            email: vendor.email.clone(),
            vendor_type: vendor.vendor_type,
            operating_area: vendor.operating_area.clone(),
            is_active: vendor.is_active,
            children: Vec::new(),
        }
    }

    /// Number of vendors in this subtree, the root included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(VendorNode::size).sum::<usize>()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorHierarchy {
    pub vendor: VendorNode,
}

/// Whether `parent` may directly own `child`
pub fn is_valid_pairing(parent: VendorType, child: VendorType) -> bool {
    parent.can_parent(child)
}

#[derive(Clone)]
pub struct HierarchyService {
    vendors: Arc<dyn VendorRepository>,
    cache: CacheService,
}

impl HierarchyService {
    pub fn new(vendors: Arc<dyn VendorRepository>, cache: CacheService) -> Self {
        Self { vendors, cache }
    }

    pub async fn get_vendor(&self, vendor_id: Uuid) -> AppResult<Vendor> {
        self.vendors
            .find_by_id(vendor_id)
            .await?
            .ok_or_else(|| not_found_error("Vendor", vendor_id))
    }

    /// True only for the permitted parent → child type pairs
    pub async fn validate_hierarchy(&self, child_id: Uuid, parent_id: Uuid) -> AppResult<bool> {
        let child = self.get_vendor(child_id).await?;
        let parent = self.get_vendor(parent_id).await?;
        Ok(is_valid_pairing(parent.vendor_type, child.vendor_type))
    }

    /// Check that a vendor of `child_type` with `area` may be placed under
    /// `parent_id`. Returns the parent on success.
    pub async fn validate_placement(
        &self,
        child_type: VendorType,
        parent_id: Option<Uuid>,
        area: &OperatingArea,
    ) -> AppResult<Option<Vendor>> {
        let Some(parent_id) = parent_id else {
            if child_type.is_root() {
                return Ok(None);
            }
            return Err(AppError::InvalidHierarchy(format!(
                "{} vendors require a parent vendor",
                child_type
            )));
        };

        if child_type.is_root() {
            return Err(AppError::InvalidHierarchy(
                "SUPER vendors cannot have a parent vendor".to_string(),
            ));
        }

        let parent = self.get_vendor(parent_id).await?;
        if !is_valid_pairing(parent.vendor_type, child_type) {
            return Err(AppError::InvalidHierarchy(format!(
                "A {} vendor cannot be placed under a {} vendor",
                child_type, parent.vendor_type
            )));
        }

        if child_type == VendorType::Local {
            self.check_local_area(&parent, area).await?;
        }
        Ok(Some(parent))
    }

    /// A LOCAL vendor must operate inside the area of its nearest CITY ancestor
    async fn check_local_area(&self, parent: &Vendor, area: &OperatingArea) -> AppResult<()> {
        let city = if parent.vendor_type == VendorType::City {
            parent.clone()
        } else {
            self.get_parent_chain(parent.id)
                .await?
                .into_iter()
                .find(|v| v.vendor_type == VendorType::City)
                .ok_or_else(|| {
                    AppError::InvalidHierarchy(format!("Vendor {} has no CITY ancestor", parent.id))
                })?
        };

        if !area.city.trim().eq_ignore_ascii_case(city.operating_area.city.trim()) {
            return Err(AppError::InvalidHierarchy(format!(
                "LOCAL vendor city '{}' does not match parent city '{}'",
                area.city, city.operating_area.city
            )));
        }
        if !area.is_within(&city.operating_area) {
            return Err(AppError::InvalidHierarchy(format!(
                "LOCAL vendor zones must be a subset of the zones of '{}'",
                city.name
            )));
        }
        Ok(())
    }

    /// Every LOCAL below `root_id` must stay inside `city_area`, the area of
    /// the CITY that will be their nearest CITY ancestor
    pub async fn ensure_locals_within(&self, root_id: Uuid, city_area: &OperatingArea) -> AppResult<()> {
        let descendants = self.get_all_sub_vendors(root_id).await?;
        if let Some(local) = descendants
            .iter()
            .find(|v| v.vendor_type == VendorType::Local && !v.operating_area.is_within(city_area))
        {
            return Err(AppError::InvalidHierarchy(format!(
                "LOCAL vendor '{}' would fall outside the area of its CITY ancestor ({})",
                local.name, city_area.city
            )));
        }
        Ok(())
    }

    /// Tree rooted at `vendor_id`, cached for the hierarchy TTL
    pub async fn get_vendor_hierarchy(&self, vendor_id: Uuid) -> AppResult<VendorHierarchy> {
        let service = self.clone();
        self.cache
            .cache_vendor_hierarchy(vendor_id, move || async move {
                service.build_vendor_hierarchy(vendor_id).await
            })
            .await
    }

    /// Build the tree recursively, each node fetching only the child
    /// types its own type may own.
    pub async fn build_vendor_hierarchy(&self, vendor_id: Uuid) -> AppResult<VendorHierarchy> {
        let root = self.get_vendor(vendor_id).await?;
        let mut visited = HashSet::from([root.id]);
        let node = self.build_node(&root, 1, &mut visited).await?;
        Ok(VendorHierarchy { vendor: node })
    }

    fn build_node<'a>(
        &'a self,
        vendor: &'a Vendor,
        depth: usize,
        visited: &'a mut HashSet<Uuid>,
    ) -> BoxFuture<'a, AppResult<VendorNode>> {
        Box::pin(async move {
            let mut node = VendorNode::leaf(vendor);
            let child_types = vendor.vendor_type.allowed_child_types();
            if depth >= MAX_HIERARCHY_DEPTH || child_types.is_empty() {
                return Ok(node);
            }

            for child in self.vendors.find_children(vendor.id, child_types).await? {
                if !visited.insert(child.id) {
                    warn!("⚠️ Vendor {} reached twice while building hierarchy, skipping", child.id);
                    continue;
                }
                let child_node = self.build_node(&child, depth + 1, &mut *visited).await?;
                node.children.push(child_node);
            }
            Ok(node)
        })
    }

    /// Every descendant of `vendor_id`, depth first, without duplicates
    pub async fn get_all_sub_vendors(&self, vendor_id: Uuid) -> AppResult<Vec<Vendor>> {
        let root = self.get_vendor(vendor_id).await?;
        let mut visited = HashSet::from([root.id]);
        let mut result = Vec::new();
        // (vendor, depth of that vendor)
        let mut stack = vec![(root, 1usize)];

        while let Some((vendor, depth)) = stack.pop() {
            if depth < MAX_HIERARCHY_DEPTH {
                let children = self.vendors.find_children(vendor.id, &VendorType::ALL).await?;
                // reversed so the first child is visited first
                for child in children.into_iter().rev() {
                    if !visited.insert(child.id) {
                        warn!("⚠️ Cycle or duplicate reference at vendor {}, skipping", child.id);
                        continue;
                    }
                    stack.push((child, depth + 1));
                }
            }
            if depth > 1 {
                result.push(vendor);
            }
        }
        Ok(result)
    }

    /// Ancestors of `vendor_id`, nearest parent first
    pub async fn get_parent_chain(&self, vendor_id: Uuid) -> AppResult<Vec<Vendor>> {
        let vendor = self.get_vendor(vendor_id).await?;
        let mut visited = HashSet::from([vendor.id]);
        let mut chain = Vec::new();
        let mut next = vendor.parent_vendor;

        while let Some(parent_id) = next {
            if chain.len() >= MAX_HIERARCHY_DEPTH || !visited.insert(parent_id) {
                warn!("⚠️ Parent chain of {} is cyclic or too deep, truncating", vendor_id);
                break;
            }
            let Some(parent) = self.vendors.find_by_id(parent_id).await? else {
                warn!("⚠️ Vendor {} points at missing parent {}", vendor_id, parent_id);
                break;
            };
            next = parent.parent_vendor;
            chain.push(parent);
        }
        Ok(chain)
    }

    /// True when `ancestor_id` is `vendor_id` itself or one of its ancestors
    pub async fn is_ancestor_or_self(&self, ancestor_id: Uuid, vendor_id: Uuid) -> AppResult<bool> {
        if ancestor_id == vendor_id {
            return Ok(true);
        }
        Ok(self
            .get_parent_chain(vendor_id)
            .await?
            .iter()
            .any(|v| v.id == ancestor_id))
    }

    /// Move `vendor_id` under `new_parent_id`
    pub async fn transfer_vendor(&self, vendor_id: Uuid, new_parent_id: Uuid) -> AppResult<Vendor> {
        if vendor_id == new_parent_id {
            return Err(AppError::InvalidHierarchy(
                "A vendor cannot be its own parent".to_string(),
            ));
        }

        let mut vendor = self.get_vendor(vendor_id).await?;
        let new_parent = self.get_vendor(new_parent_id).await?;

        if !is_valid_pairing(new_parent.vendor_type, vendor.vendor_type) {
            return Err(AppError::InvalidHierarchy(format!(
                "A {} vendor cannot be placed under a {} vendor",
                vendor.vendor_type, new_parent.vendor_type
            )));
        }
        if self.is_ancestor_or_self(vendor_id, new_parent_id).await? {
            return Err(AppError::InvalidHierarchy(
                "A vendor cannot be moved under one of its own descendants".to_string(),
            ));
        }
        match vendor.vendor_type {
            VendorType::Local => self.check_local_area(&new_parent, &vendor.operating_area).await?,
            // a SUB only sits under a CITY, which becomes the CITY of its LOCALs
            VendorType::Sub => self.ensure_locals_within(vendor_id, &new_parent.operating_area).await?,
            _ => {}
        }

        let old_parent = vendor.parent_vendor;
        vendor.parent_vendor = Some(new_parent_id);
        vendor.updated_at = chrono::Utc::now();
        let updated = self.vendors.update(&vendor).await?;

        // every tree above the old and the new parent changed shape
        self.cache.clear_vendor_hierarchies().await;

        info!("🔀 Vendor {} transferred from {:?} to {}", vendor_id, old_parent, new_parent_id);
        Ok(updated)
    }

    /// Drop the cached tree of `vendor_id` and of every ancestor, since each
    /// of those trees contains it.
    pub async fn invalidate_hierarchy(&self, vendor_id: Uuid) {
        self.cache.del(&hierarchy_key(vendor_id)).await;
        match self.get_parent_chain(vendor_id).await {
            Ok(chain) => {
                for ancestor in chain {
                    self.cache.del(&hierarchy_key(ancestor.id)).await;
                }
            }
            Err(e) => warn!("⚠️ Could not walk parents of {} for invalidation: {}", vendor_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::repositories::memory::InMemoryVendorRepository;

    fn area(city: &str, zones: &[&str]) -> OperatingArea {
        OperatingArea {
            city: city.to_string(),
            zones: zones.iter().map(|z| z.to_string()).collect(),
            pincodes: vec![],
        }
    }

    async fn insert(
        repo: &InMemoryVendorRepository,
        name: &str,
        vendor_type: VendorType,
        parent: Option<Uuid>,
        operating_area: OperatingArea,
    ) -> Vendor {
        let vendor = Vendor::new(
            name.to_string(),
            format!("{}@fleet.test", name.to_lowercase()),
            String::new(),
            vendor_type,
            parent,
            vendor_type.default_permissions(),
            operating_area,
        );
        repo.create(&vendor).await.unwrap()
    }

    struct Fixture {
        repo: Arc<InMemoryVendorRepository>,
        service: HierarchyService,
        super_vendor: Vendor,
        city: Vendor,
        sub: Vendor,
        local: Vendor,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryVendorRepository::new());
        let super_vendor = insert(&repo, "Root", VendorType::Super, None, area("", &[])).await;
        let city = insert(
            &repo,
            "Metro",
            VendorType::City,
            Some(super_vendor.id),
            area("Metropolis", &["North", "East"]),
        )
        .await;
        let sub = insert(&repo, "Sub", VendorType::Sub, Some(city.id), area("Metropolis", &["North"])).await;
        let local = insert(&repo, "Local", VendorType::Local, Some(city.id), area("Metropolis", &["East"])).await;
        let cache = CacheService::new(Some(Arc::new(MemoryCache::new())));
        let service = HierarchyService::new(repo.clone(), cache);
        Fixture {
            repo,
            service,
            super_vendor,
            city,
            sub,
            local,
        }
    }

    #[tokio::test]
    async fn test_all_sub_vendors_returns_each_descendant_once() {
        let f = fixture().await;
        let subs = f.service.get_all_sub_vendors(f.super_vendor.id).await.unwrap();
        let ids: HashSet<Uuid> = subs.iter().map(|v| v.id).collect();

        assert_eq!(subs.len(), 3);
        assert_eq!(ids, HashSet::from([f.city.id, f.sub.id, f.local.id]));
    }

    #[tokio::test]
    async fn test_all_sub_vendors_survives_injected_cycle() {
        let f = fixture().await;
        // corrupt the tree: the root now claims the LOCAL vendor as its parent
        let mut root = f.super_vendor.clone();
        root.parent_vendor = Some(f.local.id);
        f.repo.update(&root).await.unwrap();

        let subs = f.service.get_all_sub_vendors(f.super_vendor.id).await.unwrap();
        let ids: HashSet<Uuid> = subs.iter().map(|v| v.id).collect();
        assert_eq!(subs.len(), ids.len());
        assert!(!ids.contains(&f.super_vendor.id));

        let chain = f.service.get_parent_chain(f.local.id).await.unwrap();
        assert!(chain.len() <= MAX_HIERARCHY_DEPTH);
    }

    #[tokio::test]
    async fn test_hierarchy_tree_follows_type_rules() {
        let f = fixture().await;
        let tree = f.service.get_vendor_hierarchy(f.super_vendor.id).await.unwrap();

        assert_eq!(tree.vendor.size(), 4);
        assert_eq!(tree.vendor.children.len(), 1);
        assert_eq!(tree.vendor.children[0].id, f.city.id);
        assert_eq!(tree.vendor.children[0].children.len(), 2);
    }

    #[tokio::test]
    async fn test_parent_chain_is_nearest_first() {
        let f = fixture().await;
        let chain = f.service.get_parent_chain(f.local.id).await.unwrap();
        let ids: Vec<Uuid> = chain.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![f.city.id, f.super_vendor.id]);
    }

    #[tokio::test]
    async fn test_local_under_city_requires_matching_city() {
        let f = fixture().await;
        let rejected = f
            .service
            .validate_placement(VendorType::Local, Some(f.city.id), &area("OtherCity", &[]))
            .await;
        assert!(matches!(rejected, Err(AppError::InvalidHierarchy(msg)) if msg.contains("city")));

        let accepted = f
            .service
            .validate_placement(VendorType::Local, Some(f.city.id), &area("Metropolis", &["North"]))
            .await
            .unwrap();
        assert_eq!(accepted.map(|p| p.id), Some(f.city.id));
    }

    #[tokio::test]
    async fn test_local_under_sub_checks_city_ancestor_zones() {
        let f = fixture().await;
        let rejected = f
            .service
            .validate_placement(VendorType::Local, Some(f.sub.id), &area("Metropolis", &["South"]))
            .await;
        assert!(matches!(rejected, Err(AppError::InvalidHierarchy(_))));

        assert!(f
            .service
            .validate_placement(VendorType::Local, Some(f.sub.id), &area("Metropolis", &["North"]))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_placement_rejects_bad_pairings() {
        let f = fixture().await;
        let super_under_city = f
            .service
            .validate_placement(VendorType::Super, Some(f.city.id), &area("", &[]))
            .await;
        assert!(matches!(super_under_city, Err(AppError::InvalidHierarchy(_))));

        let city_without_parent = f.service.validate_placement(VendorType::City, None, &area("X", &[])).await;
        assert!(matches!(city_without_parent, Err(AppError::InvalidHierarchy(_))));

        assert!(!f.service.validate_hierarchy(f.city.id, f.local.id).await.unwrap());
        assert!(f.service.validate_hierarchy(f.local.id, f.sub.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_validate_hierarchy_reports_missing_vendor() {
        let f = fixture().await;
        let missing = f.service.validate_hierarchy(Uuid::new_v4(), f.city.id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_transfer_reparents_and_invalidates_cached_trees() {
        let f = fixture().await;
        let other_city = insert(
            &f.repo,
            "Other",
            VendorType::City,
            Some(f.super_vendor.id),
            area("Gotham", &[]),
        )
        .await;

        // warm the cache
        let before = f.service.get_vendor_hierarchy(f.city.id).await.unwrap();
        assert_eq!(before.vendor.children.len(), 2);

        let moved = f.service.transfer_vendor(f.sub.id, other_city.id).await.unwrap();
        assert_eq!(moved.parent_vendor, Some(other_city.id));

        let after = f.service.get_vendor_hierarchy(f.city.id).await.unwrap();
        assert_eq!(after.vendor.children.len(), 1);
        let other_tree = f.service.get_vendor_hierarchy(other_city.id).await.unwrap();
        assert_eq!(other_tree.vendor.children[0].id, f.sub.id);
    }

    #[tokio::test]
    async fn test_transfer_of_sub_keeps_its_locals_inside_the_new_city() {
        let f = fixture().await;
        let under_sub = insert(
            &f.repo,
            "Corner",
            VendorType::Local,
            Some(f.sub.id),
            area("Metropolis", &["North"]),
        )
        .await;
        let gotham = insert(&f.repo, "Gotham", VendorType::City, Some(f.super_vendor.id), area("Gotham", &[])).await;
        let metro_north = insert(
            &f.repo,
            "MetroNorth",
            VendorType::City,
            Some(f.super_vendor.id),
            area("metropolis", &["North", "West"]),
        )
        .await;

        let rejected = f.service.transfer_vendor(f.sub.id, gotham.id).await;
        assert!(matches!(rejected, Err(AppError::InvalidHierarchy(msg)) if msg.contains("Corner")));
        let unchanged = f.service.get_vendor(f.sub.id).await.unwrap();
        assert_eq!(unchanged.parent_vendor, Some(f.city.id));

        let moved = f.service.transfer_vendor(f.sub.id, metro_north.id).await.unwrap();
        assert_eq!(moved.parent_vendor, Some(metro_north.id));
        let chain = f.service.get_parent_chain(under_sub.id).await.unwrap();
        assert_eq!(chain[1].id, metro_north.id);
    }

    #[tokio::test]
    async fn test_locals_checked_against_changed_city_area() {
        let f = fixture().await;
        assert!(f
            .service
            .ensure_locals_within(f.city.id, &area("Metropolis", &["East", "South"]))
            .await
            .is_ok());
        assert!(matches!(
            f.service.ensure_locals_within(f.city.id, &area("Metropolis", &["North"])).await,
            Err(AppError::InvalidHierarchy(_))
        ));
        assert!(matches!(
            f.service.ensure_locals_within(f.city.id, &area("Gotham", &[])).await,
            Err(AppError::InvalidHierarchy(_))
        ));
    }

    #[tokio::test]
    async fn test_transfer_rejects_self_and_wrong_type() {
        let f = fixture().await;
        assert!(matches!(
            f.service.transfer_vendor(f.city.id, f.city.id).await,
            Err(AppError::InvalidHierarchy(_))
        ));
        assert!(matches!(
            f.service.transfer_vendor(f.city.id, f.sub.id).await,
            Err(AppError::InvalidHierarchy(_))
        ));
    }
}
