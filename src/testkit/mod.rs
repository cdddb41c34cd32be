//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`store`] - [`SharedStore`](crate::port::SharedStore) doubles:
//!   `ScriptedStore` with scripted read failures, outages and slow writes.
//! - [`domain`] - Builders for products, trades and CSV bodies.

pub mod domain;
pub mod store;
