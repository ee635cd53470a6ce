// ABOUTME: Route handlers for uploading and deleting user avatar images
// ABOUTME: Avatars are stored in the object store's avatar bucket under a unique key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::{json_body, read_image_upload};
use crate::constants::uploads::{AVATAR_BUCKET, MAX_AVATAR_BYTES, MULTIPART_BODY_LIMIT};
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::resources::ServerResources;
use crate::storage::sanitize_file_name;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeleteAvatarBody {
    filename: String,
}

/// Storage key for a new avatar
fn avatar_key(user_id: Option<&str>, original_name: &str) -> String {
    let owner = user_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(|| "unknown".to_owned(), sanitize_file_name);
    format!(
        "{owner}-{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>(),
        sanitize_file_name(original_name)
    )
}

/// Avatar routes implementation
pub struct AvatarRoutes;

impl AvatarRoutes {
    /// Create all avatar routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/avatars/upload",
                post(Self::handle_upload).layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT)),
            )
            .route("/avatars/delete", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Handle POST /avatars/upload - Store an avatar image
    async fn handle_upload(
        State(resources): State<Arc<ServerResources>>,
        multipart: Multipart,
    ) -> Result<Response, AppError> {
        let mut form = read_image_upload(multipart, "avatar", 1, MAX_AVATAR_BYTES).await?;
        let owner = form.field("user_id").map(str::to_owned);
        let Some(file) = form.files.pop() else {
            return Err(AppError::invalid_input("No file uploaded"));
        };
        let key = avatar_key(owner.as_deref(), &file.file_name);

        let url = resources
            .object_store
            .put(AVATAR_BUCKET, &key, file.data, &file.content_type)
            .await?;
        AppLogger::log_storage_event("upload", AVATAR_BUCKET, 1);

        Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Avatar uploaded successfully",
                "url": url,
                "filename": key,
            })),
        )
            .into_response())
    }

    /// Handle DELETE /avatars/delete - Remove an avatar by its storage key
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<DeleteAvatarBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let body = json_body(body)?;
        let filename = body.filename.trim();
        if filename.is_empty() {
            return Err(AppError::invalid_input("Filename required"));
        }

        let removed = resources
            .object_store
            .remove(AVATAR_BUCKET, &[filename.to_owned()])
            .await?;
        AppLogger::log_storage_event("delete", AVATAR_BUCKET, removed);

        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Avatar deleted successfully", "removed": removed })),
        )
            .into_response())
    }
}
