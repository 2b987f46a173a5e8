use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProductError, ProductResult};

/// A product in the catalogue.
///
/// `available = false` marks the product as soft-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Assigned by the store
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload of `create_product`. Any `id` sent by the caller is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(range(exclusive_min = 0.0, message = "price must be a positive number"))]
    pub price: f64,
}

/// Payload of `update_product`: the target id plus the fields to change
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(range(min = 1, message = "id must be a positive number"))]
    pub id: i32,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "price must be a positive number"))]
    pub price: Option<f64>,
}

impl UpdateProduct {
    /// Split into the target id and the patch; the id itself is never written
    pub fn into_parts(self) -> (i32, ProductPatch) {
        (
            self.id,
            ProductPatch {
                name: self.name,
                price: self.price,
            },
        )
    }
}

/// Field-level changes applied by an update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }
}

/// Largest page size a caller may request
pub const MAX_PAGE_LIMIT: u64 = 1_000;

/// Largest page number a caller may request. With [`MAX_PAGE_LIMIT`] the
/// offset stays far below `i64::MAX`, which the store binds offsets as.
pub const MAX_PAGE: u64 = 1_000_000_000;

/// Payload of `find_all_products`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PaginationQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    #[validate(range(
        min = 1,
        max = MAX_PAGE,
        message = "page must be between 1 and 1000000000"
    ))]
    pub page: u64,
    #[serde(default = "default_limit")]
    #[validate(range(
        min = 1,
        max = MAX_PAGE_LIMIT,
        message = "limit must be between 1 and 1000"
    ))]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PaginationQuery {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Rows to skip before this page; fails when it does not fit a signed
    /// 64-bit offset
    pub fn offset(&self) -> ProductResult<u64> {
        self.page
            .saturating_sub(1)
            .checked_mul(self.limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| ProductError::Validation("page is out of range".to_string()))
    }

    /// `ceil(total / limit)`, 0 for an empty collection
    pub fn last_page(&self, total: u64) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        total.div_ceil(self.limit)
    }
}

/// One page of results plus its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Count of available products. Keeps the `totalPages` key existing
    /// clients read.
    #[serde(rename = "totalPages", alias = "totalCount")]
    pub total: u64,
    pub page: u64,
    pub last_page: u64,
}
