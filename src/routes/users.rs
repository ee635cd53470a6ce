// ABOUTME: Route handlers for public user profiles
// ABOUTME: Password hashes never appear in these responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use super::parse_path_id;
use crate::errors::AppError;
use crate::resources::ServerResources;

/// User routes implementation
pub struct UserRoutes;

impl UserRoutes {
    /// Create all user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/users", get(Self::handle_list))
            .route("/users/:id", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle GET /users - List all users
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let users = resources.database.list_users().await?;
        Ok((StatusCode::OK, Json(users)).into_response())
    }

    /// Handle GET /users/:id - Get one user
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let user_id = parse_path_id(&id, "user")?;
        let user = resources
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User with id {id}")))?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }
}
