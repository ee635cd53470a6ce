// ABOUTME: Main library entry point for the Pawboard pet adoption and lost-and-found forum
// ABOUTME: REST API for users, communities, posts and planning-area lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Pawboard
//!
//! Backend for a community forum where people post animals up for adoption,
//! report sightings and search for lost pets.
//!
//! ## Features
//!
//! - **Accounts**: bcrypt passwords, JWT sessions and optional SMS two-factor login
//! - **Communities**: one per planning area, with membership tracking
//! - **Forum**: posts, threaded comments, reactions, adoptions and adoption checklists
//! - **Planning areas**: point-in-polygon lookup over boundaries loaded once and shared
//! - **Uploads**: avatars and post images in a bucketed object store
//!
//! ## Architecture
//!
//! - **Geo**: boundary geometry, area registry and the single-flight resolver
//! - **Database**: `SQLite` storage through `sqlx`
//! - **Routes**: one axum router per resource, merged by [`server`]
//! - **Resources**: shared services injected into every handler
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pawboard::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Pawboard configured on port {}", config.port);
//!     Ok(())
//! }
//! ```

/// JWT issuance and password hashing
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Application constants
pub mod constants;

/// `SQLite` storage for users, communities and forum content
pub mod database;

/// Unified error handling
pub mod errors;

/// Clients for `OneMap` and SMS verification
pub mod external;

/// Planning-area geometry and resolution
pub mod geo;

/// Structured logging
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Shared server resources
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// HTTP server assembly
pub mod server;

/// Object storage for uploads
pub mod storage;

/// Shared utilities
pub mod utils;
