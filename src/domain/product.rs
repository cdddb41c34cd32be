//! Reference product records.

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::ProductId;

/// Name reported for any product that cannot be resolved.
pub const MISSING_PRODUCT_NAME: &str = "Missing Product Name";

/// An immutable product reference record.
///
/// Serialized as `{"productId": .., "productName": ..}` both in the shared
/// cache and over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    product_id: ProductId,
    product_name: String,
}

impl Product {
    /// Create a product from an already validated id.
    pub fn new(product_id: ProductId, product_name: impl Into<String>) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
        }
    }

    /// Create a product, rejecting an empty id.
    pub fn try_new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self::new(ProductId::try_new(product_id)?, product_name))
    }

    /// The placeholder returned when `product_id` cannot be resolved.
    #[must_use]
    pub fn missing(product_id: ProductId) -> Self {
        Self::new(product_id, MISSING_PRODUCT_NAME)
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// True if this is the missing-product placeholder.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.product_name == MISSING_PRODUCT_NAME
    }
}
