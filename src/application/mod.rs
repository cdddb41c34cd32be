//! Application services: caching, product lookup and trade enrichment.

pub mod cache;
pub mod enrichment;
pub mod product;
