//! Trade records and their enrichment.
//!
//! A raw [`Trade`] carries only a product id. Enrichment produces a new
//! `Trade` with the product name attached; the raw value is never mutated.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use trade_enricher::domain::id::ProductId;
//! use trade_enricher::domain::trade::Trade;
//!
//! let raw = Trade::new(
//!     NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
//!     ProductId::new("1"),
//!     "USD",
//!     Decimal::new(10025, 2),
//! );
//! let enriched = raw.with_product_name("Bond A");
//!
//! assert!(raw.product_name().is_none());
//! assert_eq!(enriched.product_name(), Some("Bond A"));
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A single trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    date: NaiveDate,
    product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    product_name: Option<String>,
    currency: String,
    price: Decimal,
}

impl Trade {
    /// Create a raw (not yet enriched) trade.
    pub fn new(
        date: NaiveDate,
        product_id: ProductId,
        currency: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            date,
            product_id,
            product_name: None,
            currency: currency.into(),
            price,
        }
    }

    /// Return a copy of this trade carrying `name`.
    #[must_use]
    pub fn with_product_name(&self, name: impl Into<String>) -> Self {
        Self {
            product_name: Some(name.into()),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// True once a product name has been attached.
    #[must_use]
    pub const fn is_enriched(&self) -> bool {
        self.product_name.is_some()
    }
}
