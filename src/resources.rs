// ABOUTME: Centralized resource container for dependency injection in the HTTP server
// ABOUTME: Holds the database, auth manager, area resolver, SMS verification and object store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Server Resources
//!
//! Shared services are created once at startup and handed to every router as
//! `Arc<ServerResources>`. Anything not set explicitly on the builder is
//! derived from the [`ServerConfig`].

use std::sync::Arc;

use anyhow::Result;

use crate::auth::AuthManager;
use crate::config::{AreaSourceConfig, ServerConfig};
use crate::database::Database;
use crate::external::{
    DisabledVerification, OneMapClient, OneMapConfig, TwilioConfig, TwilioVerifyClient,
    VerificationService,
};
use crate::geo::{AreaDataSource, AreaResolver, GeoJsonFileSource, RetryPolicy};
use crate::storage::{LocalObjectStore, ObjectStore};

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Forum storage
    pub database: Arc<Database>,
    /// JWT issuance and validation
    pub auth_manager: Arc<AuthManager>,
    /// Planning-area lookups
    pub area_resolver: Arc<AreaResolver>,
    /// SMS one-time codes
    pub verification: Arc<dyn VerificationService>,
    /// Uploaded files
    pub object_store: Arc<dyn ObjectStore>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Open the database and build every service from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub async fn from_config(config: ServerConfig) -> Result<Self> {
        let database = Database::new(&config.database.url).await?;
        Self::builder()
            .with_database(database)
            .with_config(Arc::new(config))
            .build()
            .map_err(anyhow::Error::msg)
    }

    /// Create a new builder for `ServerResources`
    #[must_use]
    pub fn builder() -> ServerResourcesBuilder {
        ServerResourcesBuilder::new()
    }
}

/// Planning-area resolver for the configured data source
#[must_use]
pub fn area_resolver_from_config(config: &ServerConfig) -> AreaResolver {
    let source: Arc<dyn AreaDataSource> = match &config.areas.source {
        AreaSourceConfig::OneMap { base_url, auth } => {
            let mut onemap = OneMapConfig::new(auth.clone());
            onemap.base_url.clone_from(base_url);
            Arc::new(OneMapClient::new(onemap))
        }
        AreaSourceConfig::File { path } => Arc::new(GeoJsonFileSource::new(path.clone())),
    };
    let retry = RetryPolicy {
        max_attempts: config.areas.load_attempts,
        ..RetryPolicy::default()
    };
    AreaResolver::new(source).with_retry_policy(retry)
}

/// SMS verification for the configured provider, or a disabled stand-in
#[must_use]
pub fn verification_from_config(config: &ServerConfig) -> Arc<dyn VerificationService> {
    match &config.verification {
        Some(twilio) => Arc::new(TwilioVerifyClient::new(TwilioConfig::new(
            twilio.account_sid.clone(),
            twilio.auth_token.clone(),
            twilio.verify_service_sid.clone(),
        ))),
        None => Arc::new(DisabledVerification),
    }
}

/// Builder for [`ServerResources`]
#[derive(Default)]
pub struct ServerResourcesBuilder {
    database: Option<Database>,
    auth_manager: Option<AuthManager>,
    config: Option<Arc<ServerConfig>>,
    area_resolver: Option<Arc<AreaResolver>>,
    verification: Option<Arc<dyn VerificationService>>,
    object_store: Option<Arc<dyn ObjectStore>>,
}

impl ServerResourcesBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database
    #[must_use]
    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Set the auth manager
    #[must_use]
    pub fn with_auth_manager(mut self, auth_manager: AuthManager) -> Self {
        self.auth_manager = Some(auth_manager);
        self
    }

    /// Set the server configuration
    #[must_use]
    pub fn with_config(mut self, config: Arc<ServerConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the area resolver
    #[must_use]
    pub fn with_area_resolver(mut self, area_resolver: Arc<AreaResolver>) -> Self {
        self.area_resolver = Some(area_resolver);
        self
    }

    /// Set the SMS verification service
    #[must_use]
    pub fn with_verification(mut self, verification: Arc<dyn VerificationService>) -> Self {
        self.verification = Some(verification);
        self
    }

    /// Set the object store
    #[must_use]
    pub fn with_object_store(mut self, object_store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(object_store);
        self
    }

    /// Build the `ServerResources`
    ///
    /// # Errors
    ///
    /// Returns an error if the database or configuration is missing
    pub fn build(self) -> Result<ServerResources, &'static str> {
        let database = self.database.ok_or("Database is required")?;
        let config = self.config.ok_or("Server config is required")?;

        let auth_manager = self.auth_manager.unwrap_or_else(|| {
            AuthManager::new(
                config.auth.token_secret.as_bytes(),
                config.auth.token_expiry_hours,
            )
        });
        let area_resolver = self
            .area_resolver
            .unwrap_or_else(|| Arc::new(area_resolver_from_config(&config)));
        let verification = self
            .verification
            .unwrap_or_else(|| verification_from_config(&config));
        let object_store = self.object_store.unwrap_or_else(|| {
            Arc::new(LocalObjectStore::new(
                config.storage.root.clone(),
                config.storage.public_base_url.clone(),
            ))
        });

        Ok(ServerResources {
            database: Arc::new(database),
            auth_manager: Arc::new(auth_manager),
            area_resolver,
            verification,
            object_store,
            config,
        })
    }

    /// Build the `ServerResources` wrapped in an `Arc`
    ///
    /// # Errors
    ///
    /// Returns an error if the database or configuration is missing
    pub fn build_arc(self) -> Result<Arc<ServerResources>, &'static str> {
        Ok(Arc::new(self.build()?))
    }
}
