// src/upstream/mod.rs
pub mod aggregator;
pub mod profiles;

pub use aggregator::{AggregatorClient, StatusError, StatusFetch};
pub use profiles::{Profile, ProfileClient, ProfileError};

/// Shared HTTP client for every outbound call. Per-call timeouts are set on
/// each request.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}
