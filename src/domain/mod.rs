//! Storage-agnostic domain types.

pub mod error;
pub mod id;
pub mod product;
pub mod trade;

pub use error::DomainError;
pub use id::ProductId;
pub use product::{Product, MISSING_PRODUCT_NAME};
pub use trade::Trade;
