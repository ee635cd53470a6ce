// ABOUTME: Route handlers for location-based communities and their memberships
// ABOUTME: Listing, creation, join/leave, membership checks and a community's post feed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{json_body, parse_path_id, query_params};
use crate::database::{CreateCommunityRequest, ListPostsFilter};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::resources::ServerResources;
use crate::utils::validation::Validator;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListCommunitiesQuery {
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateCommunityBody {
    name: String,
    description: Option<String>,
    location_name: String,
    created_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MembershipBody {
    user_id: String,
}

impl MembershipBody {
    fn user_id(&self) -> AppResult<Uuid> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::invalid_input("user_id is required"));
        }
        let mut validator = Validator::new();
        let user_id = validator.uuid("user_id", self.user_id.trim());
        validator.finish()?;
        user_id.ok_or_else(|| AppError::invalid_input("user_id is required"))
    }
}

/// Community routes implementation
pub struct CommunityRoutes;

impl CommunityRoutes {
    /// Create all community routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/communities",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/communities/users/:user_id", get(Self::handle_user_memberships))
            .route("/communities/:id", get(Self::handle_get))
            .route("/communities/:id/join", post(Self::handle_join))
            .route("/communities/:id/leave", delete(Self::handle_leave))
            .route(
                "/communities/:id/membership/:user_id",
                get(Self::handle_membership),
            )
            .route("/communities/:id/posts", get(Self::handle_posts))
            .with_state(resources)
    }

    /// Handle GET /communities - List communities, optionally filtered by location
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<ListCommunitiesQuery>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let query = query_params(query)?;
        let location = query
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        let communities = resources.database.list_communities(location).await?;
        Ok((StatusCode::OK, Json(communities)).into_response())
    }

    /// Handle POST /communities - Create a community
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<CreateCommunityBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let body = json_body(body)?;
        let mut validator = Validator::new();
        validator
            .required("name", &body.name)
            .required("location_name", &body.location_name);
        let created_by = body
            .created_by
            .as_deref()
            .and_then(|raw| validator.uuid("created_by", raw));
        validator.finish()?;

        let community = resources
            .database
            .create_community(&CreateCommunityRequest {
                name: body.name.trim().to_owned(),
                description: body.description,
                location_name: body.location_name.trim().to_owned(),
                created_by,
            })
            .await?;

        Ok((StatusCode::CREATED, Json(community)).into_response())
    }

    /// Handle GET /communities/:id - Get one community
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let community_id = parse_path_id(&id, "community")?;
        let community = resources
            .database
            .get_community(community_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Community with id {id}")))?;
        Ok((StatusCode::OK, Json(community)).into_response())
    }

    /// Handle POST /communities/:id/join - Join a community
    async fn handle_join(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Result<Json<MembershipBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let community_id = parse_path_id(&id, "community")?;
        let user_id = json_body(body)?.user_id()?;

        if resources.database.get_community(community_id).await?.is_none() {
            return Err(AppError::not_found(format!("Community with id {id}")));
        }
        if !resources.database.user_exists(user_id).await? {
            return Err(AppError::not_found(format!("User with id {user_id}")));
        }

        let membership = resources
            .database
            .join_community(community_id, user_id)
            .await?;
        AppLogger::log_membership_event(&id, &user_id.to_string(), "joined");

        Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Joined community successfully",
                "data": membership,
            })),
        )
            .into_response())
    }

    /// Handle DELETE /communities/:id/leave - Leave a community
    async fn handle_leave(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Result<Json<MembershipBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let community_id = parse_path_id(&id, "community")?;
        let user_id = json_body(body)?.user_id()?;

        if !resources
            .database
            .leave_community(community_id, user_id)
            .await?
        {
            return Err(AppError::not_found("Membership"));
        }
        AppLogger::log_membership_event(&id, &user_id.to_string(), "left");

        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Left community successfully" })),
        )
            .into_response())
    }

    /// Handle GET /communities/:id/membership/:user_id - Membership check
    async fn handle_membership(
        State(resources): State<Arc<ServerResources>>,
        Path((id, user)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let community_id = parse_path_id(&id, "community")?;
        let user_id = parse_path_id(&user, "user")?;
        let is_member = resources.database.is_member(community_id, user_id).await?;
        Ok((StatusCode::OK, Json(json!({ "isMember": is_member }))).into_response())
    }

    /// Handle GET /communities/users/:user_id - Communities a user belongs to
    async fn handle_user_memberships(
        State(resources): State<Arc<ServerResources>>,
        Path(user): Path<String>,
    ) -> Result<Response, AppError> {
        let user_id = parse_path_id(&user, "user")?;
        let memberships = resources.database.list_user_memberships(user_id).await?;
        Ok((StatusCode::OK, Json(memberships)).into_response())
    }

    /// Handle GET /communities/:id/posts - Posts linked to a community
    async fn handle_posts(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let community_id = parse_path_id(&id, "community")?;
        if resources.database.get_community(community_id).await?.is_none() {
            return Err(AppError::not_found(format!("Community with id {id}")));
        }

        let posts = resources
            .database
            .list_posts(&ListPostsFilter {
                community_id: Some(community_id),
                ..ListPostsFilter::default()
            })
            .await?;
        Ok((StatusCode::OK, Json(posts)).into_response())
    }
}
