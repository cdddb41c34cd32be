//! Outbound ports: services the application drives.

pub mod store;
