// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory database, fixed planning areas, mock SMS codes and temporary storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `pawboard`

use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use pawboard::{
    auth::{hash_password, AuthManager},
    config::{
        AreaConfig, AreaSourceConfig, AuthConfig, CorsConfig, DatabaseConfig, Environment,
        LogLevel, ServerConfig, StorageConfig,
    },
    database::{CreateCommunityRequest, CreateUserRequest, Database, User},
    errors::AppResult,
    external::{VerificationService, VerificationStatus},
    geo::{AreaRegistry, AreaResolver, Boundary},
    resources::ServerResources,
    server::build_router,
    storage::LocalObjectStore,
};
use tempfile::TempDir;

static INIT_LOGGER: Once = Once::new();

pub const TEST_SECRET: &str = "test-secret-for-pawboard-integration-tests";
pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const VALID_CODE: &str = "123456";

/// A point inside BEDOK
pub const BEDOK_POINT: (f64, f64) = (103.925, 1.325);
/// A point inside DOWNTOWN CORE
pub const DOWNTOWN_POINT: (f64, f64) = (103.85, 1.28);
/// A point outside every test area
pub const SEA_POINT: (f64, f64) = (104.5, 1.0);

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Axis-aligned square boundary
pub fn square(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Boundary {
    Boundary::from_pairs(&[
        (min_lng, min_lat),
        (max_lng, min_lat),
        (max_lng, max_lat),
        (min_lng, max_lat),
        (min_lng, min_lat),
    ])
}

/// Two planning areas used across the tests
pub fn test_registry() -> AreaRegistry {
    AreaRegistry::from_areas([
        ("BEDOK", square(103.90, 1.30, 103.95, 1.35)),
        ("DOWNTOWN CORE", square(103.84, 1.27, 103.86, 1.29)),
    ])
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Database::new("sqlite::memory:").await
}

/// Configuration suitable for tests
pub fn test_config(storage_root: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        environment: Environment::Testing,
        log_level: LogLevel::Warn,
        database: DatabaseConfig {
            url: "sqlite::memory:".to_owned(),
        },
        auth: AuthConfig {
            token_secret: TEST_SECRET.to_owned(),
            token_expiry_hours: 1,
        },
        areas: AreaConfig {
            source: AreaSourceConfig::File {
                path: PathBuf::from("unused.geojson"),
            },
            load_attempts: 1,
        },
        verification: None,
        storage: StorageConfig {
            root: storage_root,
            public_base_url: "http://localhost/storage".to_owned(),
        },
        cors: CorsConfig {
            allowed_origins: "*".to_owned(),
        },
    }
}

/// SMS verification that accepts only [`VALID_CODE`] and records recipients
#[derive(Default)]
pub struct MockVerification {
    pub sent_to: Mutex<Vec<String>>,
}

#[async_trait]
impl VerificationService for MockVerification {
    async fn send_code(&self, to: &str) -> AppResult<()> {
        self.sent_to.lock().unwrap().push(to.to_owned());
        Ok(())
    }

    async fn check_code(&self, _to: &str, code: &str) -> AppResult<VerificationStatus> {
        Ok(if code == VALID_CODE {
            VerificationStatus::Approved
        } else {
            VerificationStatus::Pending
        })
    }
}

/// Everything a route test needs
pub struct TestContext {
    pub resources: Arc<ServerResources>,
    pub verification: Arc<MockVerification>,
    pub storage: TempDir,
}

impl TestContext {
    /// Resources over the test registry
    pub async fn new() -> Self {
        Self::with_resolver(AreaResolver::from_registry(test_registry())).await
    }

    /// Resources over a custom area resolver
    pub async fn with_resolver(resolver: AreaResolver) -> Self {
        let database = create_test_database().await.unwrap();
        let storage = TempDir::new().unwrap();
        let config = Arc::new(test_config(storage.path().to_path_buf()));
        let verification = Arc::new(MockVerification::default());

        let resources = ServerResources::builder()
            .with_database(database)
            .with_config(config.clone())
            .with_auth_manager(AuthManager::new(TEST_SECRET.as_bytes(), 1))
            .with_area_resolver(Arc::new(resolver))
            .with_verification(verification.clone())
            .with_object_store(Arc::new(LocalObjectStore::new(
                storage.path(),
                config.storage.public_base_url.clone(),
            )))
            .build_arc()
            .unwrap();

        Self {
            resources,
            verification,
            storage,
        }
    }

    /// Fully layered application router
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Database handle
    pub fn database(&self) -> &Database {
        &self.resources.database
    }
}

/// Registration payload with sensible defaults
pub fn user_request(username: &str, has_2fa_enabled: bool) -> CreateUserRequest {
    CreateUserRequest {
        name: format!("{username} Tan"),
        username: username.to_owned(),
        age: 30,
        gender: "female".to_owned(),
        password: TEST_PASSWORD.to_owned(),
        contact_no: "+65 9123 4567".to_owned(),
        avatar_url: String::new(),
        role: "user".to_owned(),
        has_2fa_enabled,
    }
}

/// Create a user whose password is [`TEST_PASSWORD`]
pub async fn create_test_user(database: &Database, username: &str) -> Result<User> {
    let request = user_request(username, false);
    let hash = hash_password(request.password.clone()).await?;
    Ok(database.create_user(&request, &hash).await?)
}

/// Create a community for a planning area
pub async fn create_test_community(
    database: &Database,
    name: &str,
    area: &str,
) -> Result<pawboard::database::Community> {
    Ok(database
        .create_community(&CreateCommunityRequest {
            name: name.to_owned(),
            description: Some(format!("Pet owners of {area}")),
            location_name: area.to_owned(),
            created_by: None,
        })
        .await?)
}
