// ABOUTME: Shared HTTP client construction with connection pooling and timeouts
// ABOUTME: Used by the OneMap and SMS verification clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Get or create the shared HTTP client with default settings
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| create_client_with_timeout(30, 10))
}

/// Create a new HTTP client with custom timeout settings
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}
