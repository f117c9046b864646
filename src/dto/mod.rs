//! Request and response bodies
//!
//! All JSON is camelCase. Successful responses are wrapped in `ApiResponse`;
//! errors are rendered by `AppError`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod auth_dto;
pub mod document_dto;
pub mod driver_dto;
pub mod vehicle_dto;
pub mod vendor_dto;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

/// List wrapper carrying the item count
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// `?vendorId=` filter for list endpoints, defaulting to the caller
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorFilterQuery {
    pub vendor_id: Option<Uuid>,
}
