//! Product lookup service.

pub mod service;

pub use service::{LoadSummary, ProductService, SharedWriteStatus, DEFAULT_LOOKUP_CONCURRENCY};
