//! Searchbox Rust Core Library
//!
//! This crate builds HTTP clients for Elasticsearch-style REST clusters:
//! connection pooling, timeouts, node discovery and pluggable body codecs,
//! assembled from a single configuration by [`factory::ClientFactory`].

pub mod action;
pub mod client;
pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod factory;
pub mod http;
pub mod logging;
pub mod servers;

pub use action::{Action, ActionResult};
pub use client::{ClientCore, SearchClient};
pub use config::ClientConfig;
pub use error::{SearchboxError, SearchboxResult};
pub use factory::ClientFactory;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
