//! Vendor model
//!
//! Vendors form a shallow tree: SUPER at the root, CITY offices below it, SUB and
//! LOCAL vendors below a CITY (LOCAL may also sit under a SUB). REGIONAL offices
//! hang directly off a SUPER and have no children.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;
use validator::Validate;

/// Maximum number of levels in a vendor tree (SUPER → CITY → SUB → LOCAL)
pub const MAX_HIERARCHY_DEPTH: usize = 4;

/// Vendor type - maps to the `vendor_type` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vendor_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorType {
    Super,
    Regional,
    City,
    Sub,
    Local,
}

impl VendorType {
    pub const ALL: [VendorType; 5] = [
        VendorType::Super,
        VendorType::Regional,
        VendorType::City,
        VendorType::Sub,
        VendorType::Local,
    ];

    /// Child types a vendor of this type may own
    pub fn allowed_child_types(self) -> &'static [VendorType] {
        match self {
            VendorType::Super => &[VendorType::City, VendorType::Regional],
            VendorType::City => &[VendorType::Sub, VendorType::Local],
            VendorType::Sub => &[VendorType::Local],
            VendorType::Regional | VendorType::Local => &[],
        }
    }

    pub fn can_parent(self, child: VendorType) -> bool {
        self.allowed_child_types().contains(&child)
    }

    pub fn is_root(self) -> bool {
        self == VendorType::Super
    }

    pub fn default_permissions(self) -> Vec<Permission> {
        match self {
            VendorType::Super | VendorType::Regional | VendorType::City => Permission::ALL.to_vec(),
            VendorType::Sub => vec![
                Permission::ManageVehicles,
                Permission::ManageDrivers,
                Permission::VerifyDocuments,
                Permission::ViewReports,
            ],
            VendorType::Local => vec![
                Permission::ManageVehicles,
                Permission::ManageDrivers,
                Permission::ViewReports,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VendorType::Super => "SUPER",
            VendorType::Regional => "REGIONAL",
            VendorType::City => "CITY",
            VendorType::Sub => "SUB",
            VendorType::Local => "LOCAL",
        }
    }
}

impl std::fmt::Display for VendorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities granted to a vendor account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ManageVendors,
    ManageVehicles,
    ManageDrivers,
    VerifyDocuments,
    ViewReports,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::ManageVendors,
        Permission::ManageVehicles,
        Permission::ManageDrivers,
        Permission::VerifyDocuments,
        Permission::ViewReports,
    ];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OperatingArea {
    #[serde(default)]
    #[validate(length(max = 100))]
    pub city: String,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    #[validate(custom = "crate::utils::validation::validate_pincodes")]
    pub pincodes: Vec<String>,
}

impl OperatingArea {
    /// True when this area lies inside `outer`: same city (case-insensitive) and
    /// every zone also listed by `outer`. An outer area without zones does not
    /// restrict zones.
    pub fn is_within(&self, outer: &OperatingArea) -> bool {
        if !self.city.trim().eq_ignore_ascii_case(outer.city.trim()) {
            return false;
        }
        if outer.zones.is_empty() {
            return true;
        }
        self.zones
            .iter()
            .all(|zone| outer.zones.iter().any(|z| z.trim().eq_ignore_ascii_case(zone.trim())))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub vendor_type: VendorType,
    pub parent_vendor: Option<Uuid>,
    pub permissions: Vec<Permission>,
    pub operating_area: OperatingArea,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        vendor_type: VendorType,
        parent_vendor: Option<Uuid>,
        permissions: Vec<Permission>,
        operating_area: OperatingArea,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: email.trim().to_lowercase(),
            password_hash,
            vendor_type,
            parent_vendor,
            permissions,
            operating_area,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_five_pairings_are_allowed() {
        let mut allowed = Vec::new();
        for parent in VendorType::ALL {
            for child in VendorType::ALL {
                if parent.can_parent(child) {
                    allowed.push((parent, child));
                }
            }
        }
        assert_eq!(
            allowed,
            vec![
                (VendorType::Super, VendorType::Regional),
                (VendorType::Super, VendorType::City),
                (VendorType::City, VendorType::Sub),
                (VendorType::City, VendorType::Local),
                (VendorType::Sub, VendorType::Local),
            ]
        );
    }

    #[test]
    fn test_area_within_checks_city_and_zones() {
        let city = OperatingArea {
            city: "Metropolis".into(),
            zones: vec!["North".into(), "East".into()],
            pincodes: vec![],
        };
        let inside = OperatingArea {
            city: "metropolis".into(),
            zones: vec!["north".into()],
            pincodes: vec![],
        };
        let other_city = OperatingArea { city: "OtherCity".into(), ..inside.clone() };
        let other_zone = OperatingArea { zones: vec!["West".into()], ..inside.clone() };

        assert!(inside.is_within(&city));
        assert!(!other_city.is_within(&city));
        assert!(!other_zone.is_within(&city));
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        let json = serde_json::to_string(&VendorType::Local).unwrap();
        assert_eq!(json, "\"LOCAL\"");
        let perm: Permission = serde_json::from_str("\"VERIFY_DOCUMENTS\"").unwrap();
        assert_eq!(perm, Permission::VerifyDocuments);
    }
}
