//! Trade enrichment.

pub mod service;

pub use service::{ProjectionState, TradeEnrichmentService};
