// ABOUTME: Configuration module root
// ABOUTME: Re-exports the environment-driven server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

/// Environment variable parsing into [`environment::ServerConfig`]
pub mod environment;

pub use environment::{
    AreaConfig, AreaSourceConfig, AuthConfig, CorsConfig, DatabaseConfig, Environment, LogLevel,
    ServerConfig, StorageConfig, VerificationConfig,
};
