// ABOUTME: Route handlers resolving coordinates to planning areas and their communities
// ABOUTME: Responds 503 while the planning-area data cannot be loaded
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::query_params;
use crate::errors::{AppError, AppResult};
use crate::geo::Coordinate;
use crate::resources::ServerResources;

/// Coordinates arrive as strings so that non-numeric input gets our own error
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PointQuery {
    lng: Option<String>,
    lat: Option<String>,
}

impl PointQuery {
    fn coordinate(&self) -> AppResult<Coordinate> {
        let parse = |name: &str, raw: Option<&str>| -> AppResult<f64> {
            raw.map(str::trim)
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite())
                .ok_or_else(|| {
                    AppError::invalid_input(format!("Query parameter {name} must be a number"))
                })
        };
        Ok(Coordinate::new(
            parse("lng", self.lng.as_deref())?,
            parse("lat", self.lat.as_deref())?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    q: String,
}

/// Map routes implementation
pub struct MapRoutes;

impl MapRoutes {
    /// Create all map routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/maps", get(Self::handle_area))
            .route("/maps/search", get(Self::handle_search))
            .route("/maps/community", get(Self::handle_community))
            .with_state(resources)
    }

    async fn area_at(resources: &ServerResources, point: Coordinate) -> AppResult<String> {
        resources
            .area_resolver
            .resolve(point)
            .await?
            .ok_or_else(|| AppError::not_found("Area"))
    }

    /// Handle GET /maps?lng=&lat= - Planning area containing a point
    async fn handle_area(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<PointQuery>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let point = query_params(query)?.coordinate()?;
        let area = Self::area_at(&resources, point).await?;
        Ok((StatusCode::OK, Json(json!({ "data": { "area": area } }))).into_response())
    }

    /// Handle GET /maps/search?q= - Planning areas whose name contains the query
    async fn handle_search(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<SearchQuery>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let query = query_params(query)?;
        let areas = if query.q.trim().is_empty() {
            resources.area_resolver.area_names().await?
        } else {
            resources.area_resolver.search(query.q.trim()).await?
        };
        Ok((StatusCode::OK, Json(json!({ "data": areas }))).into_response())
    }

    /// Handle GET /maps/community?lng=&lat= - Community for the area containing a point
    async fn handle_community(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<PointQuery>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let point = query_params(query)?.coordinate()?;
        let area = Self::area_at(&resources, point).await?;
        let community = resources
            .database
            .find_community_by_area(&area)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Community for area {area}")))?;

        Ok((
            StatusCode::OK,
            Json(json!({ "data": { "area": area, "community": community } })),
        )
            .into_response())
    }
}
