//! Domain validation errors for core domain types.
//!
//! These errors are returned by `try_new` constructors that validate inputs.
//!
//! # Examples
//!
//! ```
//! use trade_enricher::domain::error::DomainError;
//! use trade_enricher::domain::product::Product;
//!
//! let result = Product::try_new("", "Bond A");
//! assert!(matches!(result, Err(DomainError::EmptyProductId)));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Product identifiers are cache keys and must not be empty.
    #[error("product id cannot be empty")]
    EmptyProductId,
}
