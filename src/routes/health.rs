// ABOUTME: Health check and service index route handlers
// ABOUTME: Reports liveness, planning-area readiness and the available endpoint groups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! Health check routes for service monitoring

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::constants::service::{SERVICE_NAME, SERVICE_VERSION};
use crate::resources::ServerResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/", get(Self::handle_index))
            .with_state(resources)
    }

    /// Handle GET /health - Liveness with planning-area status
    async fn handle_health(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        Json(json!({
            "status": "ok",
            "message": "Server is running",
            "areas_loaded": resources.area_resolver.is_loaded(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }

    /// Handle GET / - Service name, version and endpoint map
    async fn handle_index() -> Json<Value> {
        Json(json!({
            "name": SERVICE_NAME,
            "version": SERVICE_VERSION,
            "endpoints": {
                "health": "/health",
                "users": "/users",
                "auth": "/auth",
                "communities": "/communities",
                "forum": "/api",
                "avatars": "/avatars",
                "maps": "/maps",
            }
        }))
    }
}
