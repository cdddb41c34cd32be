//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!          ┌──────────────────────────┐
//!          │       Application        │
//!          │  ProductCache, services  │
//!          └────────────┬─────────────┘
//!                       │ SharedStore
//!            ┌──────────┴──────────┐
//!            ▼                     ▼
//!      ┌───────────┐         ┌───────────┐
//!      │   Redis   │         │  Memory   │
//!      └───────────┘         └───────────┘
//! ```

pub mod outbound;

pub use outbound::store::SharedStore;
