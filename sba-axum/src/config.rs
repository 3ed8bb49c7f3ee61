//! Configuration for the HTTP server.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Network and pagination settings for the REST API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// The address to bind the server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Upper bound on list responses (ledger history, leaderboards).
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_bind_address() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_page_limit() -> u32 {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            page_limit: default_page_limit(),
        }
    }
}
