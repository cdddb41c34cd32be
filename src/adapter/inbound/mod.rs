//! Inbound adapters: record decoding and the HTTP surface.

pub mod decoder;
pub mod http;
