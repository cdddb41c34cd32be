//! Infrastructure layer: configuration and runtime wiring.

pub mod bootstrap;
pub mod config;
