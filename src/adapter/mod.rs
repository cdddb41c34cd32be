//! Adapters connecting the application to the outside world.
//!
//! - [`inbound`]: delimited-text decoder and the axum HTTP API
//! - [`outbound`]: shared store implementations (Redis, in-memory)

pub mod inbound;
pub mod outbound;
