//! Trade Enricher - product cache and trade enrichment pipeline.
//!
//! Trades arrive as CSV keyed by product id and leave as CSV carrying the
//! product name. Product names come from a two-tier cache: a process-local
//! mirror in front of a shared store (Redis, or an in-process store), with
//! writes serialized across processes by short-lived leases.
//!
//! # Modules
//!
//! - [`domain`] - Products, trades and product ids
//! - [`port`] - The [`port::SharedStore`] boundary
//! - [`adapter`] - CSV decoding, the HTTP API, and store implementations
//! - [`application`] - Product cache, product service, trade enrichment
//! - [`infrastructure`] - Configuration and runtime wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Expose store doubles and builders for integration tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use trade_enricher::adapter::outbound::MemoryStore;
//! use trade_enricher::application::cache::{CacheSettings, ProductCache};
//! use trade_enricher::application::product::ProductService;
//!
//! let cache = Arc::new(ProductCache::new(
//!     Arc::new(MemoryStore::new()),
//!     CacheSettings::default(),
//! ));
//! let products = ProductService::new(cache);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
