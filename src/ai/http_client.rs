//! Shared HTTP client construction
//!
//! One pooled client is built per process and reused for every completion
//! call, so TLS sessions and TCP connections survive between requests.

use reqwest::Client;
use std::time::Duration;

/// Pooled client for the completion API
///
/// No overall request timeout; only transport defaults apply.
pub fn completion_client() -> Client {
    Client::builder()
        .pool_max_idle_per_host(20)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}
