// ABOUTME: HTTP server assembly combining every route group with shared middleware
// ABOUTME: Serves uploaded files, answers unknown routes with a JSON 404 and shuts down on Ctrl-C
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Server
//!
//! Layer order, outermost first: request ID, CORS, per-request trace span,
//! then the routes. The request ID wraps the trace layer so each span is
//! tagged with it.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::Uri;
use axum::{middleware, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::middleware::{
    create_request_span, record_response_status, request_id_middleware, setup_cors,
};
use crate::resources::ServerResources;
use crate::routes::{
    AuthRoutes, AvatarRoutes, CommunityRoutes, ForumRoutes, HealthRoutes, MapRoutes, UserRoutes,
};

/// The forum HTTP server
pub struct PawboardServer {
    resources: Arc<ServerResources>,
}

impl PawboardServer {
    /// Create a server over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Shared resources
    #[must_use]
    pub const fn resources(&self) -> &Arc<ServerResources> {
        &self.resources
    }

    /// Build the complete router with middleware applied
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Bind and serve until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn run(self, host: &str, port: u16) -> Result<()> {
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("Invalid bind address {host}:{port}"))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        info!("HTTP server listening on http://{}", addr);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;
        info!("HTTP server stopped");
        Ok(())
    }
}

/// Router for every route group, static uploads and the JSON fallback
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let storage_dir = ServeDir::new(&resources.config.storage.root);

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(UserRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(CommunityRoutes::routes(resources.clone()))
        .merge(ForumRoutes::routes(resources.clone()))
        .merge(AvatarRoutes::routes(resources.clone()))
        .merge(MapRoutes::routes(resources.clone()))
        .nest_service("/storage", storage_dir)
        .fallback(handle_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(create_request_span)
                .on_response(record_response_status),
        )
        .layer(setup_cors(&resources.config.cors))
        .layer(middleware::from_fn(request_id_middleware))
}

async fn handle_not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("Route {}", uri.path()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
