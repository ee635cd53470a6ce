// ABOUTME: HTTP middleware for request tracing, CORS and bearer authentication
// ABOUTME: Provides request ID propagation and span creation for structured logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

/// Bearer token authentication
pub mod auth;
/// CORS layer configuration
pub mod cors;
/// Request IDs and request spans
pub mod tracing;

pub use auth::authenticate_bearer;
pub use cors::setup_cors;
pub use tracing::{
    create_request_span, current_request_id, record_response_status, request_id_middleware,
    RequestId, REQUEST_ID_HEADER,
};
