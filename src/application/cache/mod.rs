//! Runtime caches used by application services.
//!
//! - [`product::ProductCache`]: two-tier product cache (local mirror + shared store)
//! - [`lease`]: TTL-bounded write leases over the shared store

pub mod lease;
pub mod product;

pub use lease::{with_lease, LeaseGuard};
pub use product::{CacheSettings, CacheStats, Lookup, ProductCache, WriteOutcome};
