// ABOUTME: Small shared helpers that do not belong to a single domain module
// ABOUTME: HTTP client construction and request validation helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

/// Shared `reqwest` clients
pub mod http_client;
/// Field validation collecting every issue at once
pub mod validation;
