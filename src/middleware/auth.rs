// ABOUTME: Bearer token authentication for protected forum endpoints
// ABOUTME: Extracts the Authorization header, validates the JWT and logs rejected attempts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use http::{header::AUTHORIZATION, HeaderMap};
use tracing::warn;

use crate::auth::{AuthManager, Claims};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

/// Authenticate a request carrying `Authorization: Bearer <jwt>`
///
/// # Errors
///
/// Returns `AUTH_REQUIRED` when the header is missing or not a bearer token,
/// and an `AUTH_*` error when the token is rejected.
pub fn authenticate_bearer(headers: &HeaderMap, auth: &AuthManager) -> AppResult<Claims> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        warn!("Authentication failed: missing Authorization header");
        return Err(AppError::auth_required());
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("Authentication failed: Authorization header is not a bearer token");
            AppError::auth_invalid("Authorization header must be 'Bearer <token>'")
        })?;

    auth.validate_token(token).map_err(|error| {
        AppLogger::log_security_event("token_rejected", "medium", &error.message, None);
        error
    })
}
