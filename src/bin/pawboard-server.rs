// ABOUTME: Server binary for the Pawboard forum API
// ABOUTME: Loads configuration, opens the database, preloads planning areas and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Pawboard Server Binary
//!
//! Starts the forum REST API with the configuration taken from the
//! environment.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pawboard::{
    config::ServerConfig, logging, resources::ServerResources, server::PawboardServer,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "pawboard-server")]
#[command(about = "Pawboard - pet adoption and lost-and-found forum API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    logging::init_from_env()?;

    info!("Starting Pawboard API");
    info!("{}", config.summary());

    let host = config.host.clone();
    let port = config.port;
    let resources = Arc::new(ServerResources::from_config(config).await?);
    info!("Server resources initialized");

    match resources.area_resolver.preload().await {
        Ok(count) => info!(
            "Loaded {} planning areas from {}",
            count,
            resources.area_resolver.source_name()
        ),
        Err(e) => warn!(
            "Planning areas could not be preloaded, will retry on first lookup: {}",
            e
        ),
    }

    display_available_endpoints(&host, port);

    let server = PawboardServer::new(resources);
    if let Err(e) = server.run(&host, port).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints
fn display_available_endpoints(host: &str, port: u16) {
    info!("=== Available API Endpoints ===");
    display_account_endpoints(host, port);
    display_community_endpoints(host, port);
    display_forum_endpoints(host, port);
    display_map_endpoints(host, port);
    info!("=== End of Endpoint List ===");
}

#[allow(clippy::cognitive_complexity)]
fn display_account_endpoints(host: &str, port: u16) {
    info!("Accounts:");
    info!("   Health:            GET    http://{host}:{port}/health");
    info!("   Users:             GET    http://{host}:{port}/users");
    info!("   Register:          POST   http://{host}:{port}/auth/register");
    info!("   Login:             POST   http://{host}:{port}/auth/login");
    info!("   Verify Code:       POST   http://{host}:{port}/auth/verify-code");
    info!("   Change Password:   PUT    http://{host}:{port}/auth/password/{{id}}");
    info!("   Current User:      GET    http://{host}:{port}/auth/me");
    info!("   Avatar Upload:     POST   http://{host}:{port}/avatars/upload");
}

#[allow(clippy::cognitive_complexity)]
fn display_community_endpoints(host: &str, port: u16) {
    info!("Communities:");
    info!("   List / Create:     GET|POST http://{host}:{port}/communities");
    info!("   Join:              POST   http://{host}:{port}/communities/{{id}}/join");
    info!("   Leave:             DELETE http://{host}:{port}/communities/{{id}}/leave");
    info!("   Posts:             GET    http://{host}:{port}/communities/{{id}}/posts");
}

#[allow(clippy::cognitive_complexity)]
fn display_forum_endpoints(host: &str, port: u16) {
    info!("Forum:");
    info!("   Posts:             GET|POST http://{host}:{port}/api/posts");
    info!("   Comments:          GET|POST http://{host}:{port}/api/posts/{{id}}/comments");
    info!("   Reactions:         POST   http://{host}:{port}/api/posts/{{id}}/reactions");
    info!("   Mark Adopted:      POST   http://{host}:{port}/api/posts/{{id}}/mark-adopted");
    info!("   Upload Images:     POST   http://{host}:{port}/api/upload-images");
}

fn display_map_endpoints(host: &str, port: u16) {
    info!("Maps:");
    info!("   Area at Point:     GET    http://{host}:{port}/maps?lng=&lat=");
    info!("   Community at Point: GET   http://{host}:{port}/maps/community?lng=&lat=");
}
