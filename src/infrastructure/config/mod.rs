//! Infrastructure configuration modules.

pub mod cache;
pub mod logging;
pub mod server;
pub mod settings;
pub mod store;
