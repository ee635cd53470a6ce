// ABOUTME: Forum route handlers for posts, comments, reactions, adoptions and checklists
// ABOUTME: Posts with coordinates are linked to the community of the planning area they fall in
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Forum Routes
//!
//! All routes live under `/api`. Creating or moving a post resolves its
//! coordinates to a planning area and links the community registered for
//! that area. When the area data cannot be loaded the post is saved without
//! a community.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{json_body, parse_path_id, query_params, read_image_upload};
use crate::constants::forum::CHECKLIST_ITEM_COUNT;
use crate::constants::uploads::{
    MAX_POST_IMAGES, MAX_POST_IMAGE_BYTES, MULTIPART_BODY_LIMIT, POST_IMAGE_BUCKET,
    POST_IMAGE_PREFIX,
};
use crate::database::{
    AdoptionOutcome, CreateCommentRequest, CreatePostRequest, ListPostsFilter, PostType,
    ReactionType, UpdatePostRequest,
};
use crate::errors::{AppError, AppResult};
use crate::geo::Coordinate;
use crate::logging::AppLogger;
use crate::middleware::authenticate_bearer;
use crate::resources::ServerResources;
use crate::storage::sanitize_file_name;
use crate::utils::validation::Validator;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListPostsQuery {
    #[serde(rename = "type")]
    post_type: Option<String>,
    search: Option<String>,
    /// Comma-separated
    tags: Option<String>,
    limit: Option<i64>,
}

impl ListPostsQuery {
    fn into_filter(self) -> AppResult<ListPostsFilter> {
        let post_type = match self.post_type.as_deref().filter(|t| !t.is_empty()) {
            Some(raw) => Some(PostType::parse(raw).ok_or_else(|| {
                AppError::invalid_input(format!("Unknown post type: {raw}"))
            })?),
            None => None,
        };
        let tags = self
            .tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(ListPostsFilter {
            post_type,
            search: self.search,
            tags,
            community_id: None,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreatePostBody {
    user_id: String,
    title: String,
    content: String,
    post_type: String,
    location_name: Option<String>,
    location_lat: Option<f64>,
    location_lng: Option<f64>,
    image_urls: Vec<String>,
    tags: Vec<String>,
}

impl CreatePostBody {
    fn into_request(self) -> AppResult<CreatePostRequest> {
        let mut validator = Validator::new();
        validator
            .required("user_id", &self.user_id)
            .required("title", &self.title)
            .required("content", &self.content)
            .required("post_type", &self.post_type);
        validator.finish()?;

        let user_id = validator.uuid("user_id", &self.user_id);
        let post_type = PostType::parse(&self.post_type);
        validator.check(
            post_type.is_some(),
            "post_type",
            "must be one of: adoption, sighting, lost, found",
        );
        validator.finish()?;

        match (user_id, post_type) {
            (Some(user_id), Some(post_type)) => Ok(CreatePostRequest {
                user_id,
                title: self.title,
                content: self.content,
                post_type,
                location_name: self.location_name,
                location_lat: self.location_lat,
                location_lng: self.location_lng,
                image_urls: self.image_urls,
                tags: self.tags,
            }),
            _ => Err(AppError::invalid_input(
                "Missing required fields: user_id, title, content, post_type",
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateCommentBody {
    user_id: String,
    content: String,
    parent_comment_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToggleReactionBody {
    user_id: String,
    reaction_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserQuery {
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChecklistBody {
    user_id: String,
    item_index: Option<i64>,
}

fn required_user_id(raw: &str) -> AppResult<Uuid> {
    let mut validator = Validator::new();
    validator.required("user_id", raw);
    validator.finish()?;
    let user_id = validator.uuid("user_id", raw.trim());
    validator.finish()?;
    user_id.ok_or_else(|| AppError::invalid_input("user_id is required"))
}

/// Forum routes implementation
pub struct ForumRoutes;

impl ForumRoutes {
    /// Create all forum routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/upload-images",
                post(Self::handle_upload_images).layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT)),
            )
            .route(
                "/api/posts",
                get(Self::handle_list_posts).post(Self::handle_create_post),
            )
            .route(
                "/api/posts/:id",
                get(Self::handle_get_post)
                    .put(Self::handle_update_post)
                    .delete(Self::handle_delete_post),
            )
            .route(
                "/api/posts/:id/comments",
                get(Self::handle_list_comments).post(Self::handle_create_comment),
            )
            .route(
                "/api/posts/:id/reactions",
                get(Self::handle_user_reactions).post(Self::handle_toggle_reaction),
            )
            .route(
                "/api/posts/:id/reactions/counts",
                get(Self::handle_reaction_counts),
            )
            .route("/api/posts/:id/view", post(Self::handle_view))
            .route("/api/posts/:id/mark-adopted", post(Self::handle_mark_adopted))
            .route(
                "/api/posts/:id/checklist",
                get(Self::handle_get_checklist).post(Self::handle_toggle_checklist),
            )
            .with_state(resources)
    }

    /// Community registered for the planning area containing the coordinates
    ///
    /// Area data being unavailable is not fatal for posting.
    async fn resolve_community(
        resources: &ServerResources,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> AppResult<Option<Uuid>> {
        let (Some(lat), Some(lng)) = (lat, lng) else {
            return Ok(None);
        };
        let point = Coordinate::new(lng, lat);
        if !point.is_finite() {
            return Ok(None);
        }

        let area = match resources.area_resolver.resolve(point).await {
            Ok(Some(area)) => area,
            Ok(None) => {
                debug!(lat, lng, "Post location is outside every planning area");
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "Planning areas unavailable, saving post without a community");
                return Ok(None);
            }
        };

        let community = resources.database.find_community_by_area(&area).await?;
        if community.is_none() {
            debug!(area = %area, "No community registered for planning area");
        }
        Ok(community.map(|c| c.id))
    }

    async fn require_post(resources: &ServerResources, id: &str) -> AppResult<Uuid> {
        let post_id = parse_path_id(id, "post")?;
        if resources.database.post_exists(post_id).await? {
            Ok(post_id)
        } else {
            Err(AppError::not_found(format!("Post with id {id}")))
        }
    }

    /// Handle POST /api/upload-images - Store up to five post images
    async fn handle_upload_images(
        State(resources): State<Arc<ServerResources>>,
        multipart: Multipart,
    ) -> Result<Response, AppError> {
        let form =
            read_image_upload(multipart, "images", MAX_POST_IMAGES, MAX_POST_IMAGE_BYTES).await?;
        if form.files.is_empty() {
            return Err(AppError::invalid_input("No files uploaded"));
        }

        let mut urls = Vec::with_capacity(form.files.len());
        for file in form.files {
            let key = format!(
                "{POST_IMAGE_PREFIX}/{}-{}-{}",
                chrono::Utc::now().timestamp_millis(),
                rand::random::<u32>(),
                sanitize_file_name(&file.file_name)
            );
            let url = resources
                .object_store
                .put(POST_IMAGE_BUCKET, &key, file.data, &file.content_type)
                .await?;
            urls.push(url);
        }
        AppLogger::log_storage_event("upload", POST_IMAGE_BUCKET, urls.len());

        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Files uploaded successfully", "urls": urls })),
        )
            .into_response())
    }

    /// Handle GET /api/posts - List posts newest first
    async fn handle_list_posts(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<ListPostsQuery>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let filter = query_params(query)?.into_filter()?;
        let posts = resources.database.list_posts(&filter).await?;
        Ok((StatusCode::OK, Json(posts)).into_response())
    }

    /// Handle GET /api/posts/:id - Get one post
    async fn handle_get_post(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let post_id = parse_path_id(&id, "post")?;
        let post = resources
            .database
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post with id {id}")))?;
        Ok((StatusCode::OK, Json(post)).into_response())
    }

    /// Handle POST /api/posts - Create a post
    async fn handle_create_post(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<CreatePostBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = json_body(body)?.into_request()?;
        let community_id =
            Self::resolve_community(&resources, request.location_lat, request.location_lng)
                .await?;

        let post = resources
            .database
            .create_post(&request, community_id)
            .await?;
        debug!(post_id = %post.id, community_id = ?post.community_id, "Post created");

        Ok((StatusCode::CREATED, Json(post)).into_response())
    }

    /// Handle PUT /api/posts/:id - Partial update
    async fn handle_update_post(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Result<Json<UpdatePostRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let post_id = parse_path_id(&id, "post")?;
        let request = json_body(body)?;

        let existing = resources
            .database
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post with id {id}")))?;

        let community_id = if request.changes_coordinates() {
            Self::resolve_community(
                &resources,
                request.location_lat.or(existing.location_lat),
                request.location_lng.or(existing.location_lng),
            )
            .await?
        } else {
            existing.community_id
        };

        let post = resources
            .database
            .update_post(post_id, &request, community_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post with id {id}")))?;
        Ok((StatusCode::OK, Json(post)).into_response())
    }

    /// Handle DELETE /api/posts/:id - Delete a post
    async fn handle_delete_post(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let post_id = parse_path_id(&id, "post")?;
        if !resources.database.delete_post(post_id).await? {
            return Err(AppError::not_found(format!("Post with id {id}")));
        }
        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Post deleted successfully" })),
        )
            .into_response())
    }

    /// Handle GET /api/posts/:id/comments - Comments oldest first
    async fn handle_list_comments(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let post_id = Self::require_post(&resources, &id).await?;
        let comments = resources.database.list_comments(post_id).await?;
        Ok((StatusCode::OK, Json(comments)).into_response())
    }

    /// Handle POST /api/posts/:id/comments - Add a comment
    async fn handle_create_comment(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Result<Json<CreateCommentBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let post_id = Self::require_post(&resources, &id).await?;
        let body = json_body(body)?;

        let mut validator = Validator::new();
        validator
            .required("user_id", &body.user_id)
            .required("content", &body.content);
        validator.finish()?;
        let user_id = validator.uuid("user_id", &body.user_id);
        let parent_comment_id = body
            .parent_comment_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .and_then(|raw| validator.uuid("parent_comment_id", raw));
        validator.finish()?;
        let user_id = user_id.ok_or_else(|| AppError::invalid_input("user_id is required"))?;

        let comment = resources
            .database
            .create_comment(
                post_id,
                &CreateCommentRequest {
                    user_id,
                    content: body.content,
                    parent_comment_id,
                },
            )
            .await?;
        Ok((StatusCode::CREATED, Json(comment)).into_response())
    }

    /// Handle GET /api/posts/:id/reactions/counts - Reaction tallies
    async fn handle_reaction_counts(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let post_id = parse_path_id(&id, "post")?;
        let counts = resources.database.get_reaction_counts(post_id).await?;
        Ok((StatusCode::OK, Json(counts)).into_response())
    }

    /// Handle POST /api/posts/:id/reactions - Toggle a reaction
    async fn handle_toggle_reaction(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Result<Json<ToggleReactionBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let post_id = Self::require_post(&resources, &id).await?;
        let body = json_body(body)?;
        let user_id = required_user_id(&body.user_id)?;
        let reaction_type = match body.reaction_type.as_deref().filter(|r| !r.is_empty()) {
            Some(raw) => ReactionType::parse(raw)
                .ok_or_else(|| AppError::invalid_input(format!("Unknown reaction type: {raw}")))?,
            None => ReactionType::default(),
        };

        let outcome = resources
            .database
            .toggle_reaction(post_id, user_id, reaction_type)
            .await?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "action": outcome.as_str(),
                "reaction_type": reaction_type.as_str(),
            })),
        )
            .into_response())
    }

    /// Handle GET /api/posts/:id/reactions?user_id= - The user's reactions on a post
    async fn handle_user_reactions(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        query: Result<Query<UserQuery>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let post_id = parse_path_id(&id, "post")?;
        let raw_user = query_params(query)?
            .user_id
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::invalid_input("Missing user_id query parameter"))?;
        let user_id = required_user_id(&raw_user)?;

        let reactions = resources
            .database
            .list_user_reactions(post_id, user_id)
            .await?;
        Ok((StatusCode::OK, Json(reactions)).into_response())
    }

    /// Handle POST /api/posts/:id/view - Count a view
    async fn handle_view(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let post_id = parse_path_id(&id, "post")?;
        if !resources.database.increment_post_views(post_id).await? {
            return Err(AppError::not_found(format!("Post with id {id}")));
        }
        Ok((StatusCode::OK, Json(json!({ "message": "View counted" }))).into_response())
    }

    /// Handle POST /api/posts/:id/mark-adopted - Record an adoption by the token holder
    async fn handle_mark_adopted(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = authenticate_bearer(&headers, &resources.auth_manager)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::auth_invalid("Token subject is not a user id"))?;
        if !resources.database.user_exists(user_id).await? {
            AppLogger::log_security_event(
                "unknown_token_subject",
                "medium",
                "Valid token for a user that no longer exists",
                Some(&claims.sub),
            );
            return Err(AppError::auth_invalid("User not found"));
        }

        let post_id = Self::require_post(&resources, &id).await?;

        match resources.database.mark_adopted(user_id, post_id).await? {
            AdoptionOutcome::Adopted(record) => Ok((
                StatusCode::CREATED,
                Json(json!({ "message": "Adoption completed", "data": record })),
            )
                .into_response()),
            AdoptionOutcome::AlreadyAdopted => Ok((
                StatusCode::OK,
                Json(json!({ "message": "Already adopted" })),
            )
                .into_response()),
        }
    }

    /// Handle GET /api/posts/:id/checklist?user_id= - Checked items
    async fn handle_get_checklist(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        query: Result<Query<UserQuery>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let post_id = parse_path_id(&id, "post")?;
        let raw_user = query_params(query)?
            .user_id
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::invalid_input("Missing user_id query parameter"))?;
        let user_id = required_user_id(&raw_user)?;

        let items = resources.database.list_checklist(user_id, post_id).await?;
        let checked: Vec<i64> = items.iter().map(|item| item.item_index).collect();
        Ok((
            StatusCode::OK,
            Json(json!({ "data": items, "checked": checked })),
        )
            .into_response())
    }

    /// Handle POST /api/posts/:id/checklist - Toggle a checklist item
    async fn handle_toggle_checklist(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Result<Json<ChecklistBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let post_id = Self::require_post(&resources, &id).await?;
        let body = json_body(body)?;
        let user_id = required_user_id(&body.user_id)?;

        let mut validator = Validator::new();
        validator.check(body.item_index.is_some(), "item_index", "is required");
        if let Some(index) = body.item_index {
            validator.range("item_index", index, 0, CHECKLIST_ITEM_COUNT - 1);
        }
        validator.finish()?;
        let item_index = body.item_index.unwrap_or_default();

        let outcome = resources
            .database
            .toggle_checklist_item(user_id, post_id, item_index)
            .await?;
        Ok((
            StatusCode::OK,
            Json(json!({ "action": outcome.as_str(), "item_index": item_index })),
        )
            .into_response())
    }
}
