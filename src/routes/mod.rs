// ABOUTME: HTTP route modules for the forum API, one router per resource
// ABOUTME: Shared helpers turn extractor rejections and path IDs into uniform API errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Routes
//!
//! Each module exposes a `XRoutes` type whose `routes` function returns an
//! axum [`axum::Router`] with its state already applied. The server merges them.

/// Registration, login, SMS verification and password changes
pub mod auth;
/// Avatar uploads
pub mod avatars;
/// Communities and memberships
pub mod communities;
/// Posts, comments, reactions, adoptions and checklists
pub mod forum;
/// Health and service index
pub mod health;
/// Planning-area lookups
pub mod maps;
/// Public user profiles
pub mod users;

pub use auth::AuthRoutes;
pub use avatars::AvatarRoutes;
pub use communities::CommunityRoutes;
pub use forum::ForumRoutes;
pub use health::HealthRoutes;
pub use maps::MapRoutes;
pub use users::UserRoutes;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query};
use axum::Json;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Parse an ID taken from the URL path
pub(crate) fn parse_path_id(raw: &str, resource: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::invalid_format(format!("Invalid {resource} id: {raw}")))
}

/// Unwrap a JSON body, reporting malformed input as a 400
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::invalid_input(rejection.body_text()))
}

/// Unwrap query parameters, reporting malformed input as a 400
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::invalid_input(rejection.body_text()))
}

/// One file read from a multipart upload
pub(crate) struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Files and text fields of a multipart form
#[derive(Default)]
pub(crate) struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    /// First text field named `name`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Read a multipart form, keeping files from `file_field` only
///
/// Every file must be an image no larger than `max_bytes`.
pub(crate) async fn read_image_upload(
    mut multipart: Multipart,
    file_field: &str,
    max_files: usize,
    max_bytes: usize,
) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        if name != file_field {
            if field.file_name().is_none() {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::invalid_input(format!("Unreadable field {name}: {e}")))?;
                form.fields.push((name, value));
            }
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_owned();
        if !content_type.starts_with("image/") {
            return Err(AppError::invalid_input("Only image files are allowed!"));
        }
        if form.files.len() >= max_files {
            return Err(AppError::invalid_input(format!(
                "At most {max_files} files may be uploaded at once"
            )));
        }

        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid_input(format!("Unreadable upload {file_name}: {e}")))?;
        if data.len() > max_bytes {
            return Err(AppError::payload_too_large(format!(
                "{file_name} exceeds the {max_bytes} byte limit"
            )));
        }

        form.files.push(UploadedFile {
            file_name,
            content_type,
            data,
        });
    }

    Ok(form)
}
