// ABOUTME: Environment configuration management for the forum API server
// ABOUTME: Parses environment variables (and .env) into a typed ServerConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! Environment-based configuration

use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::areas::{DEFAULT_BOUNDARY_FILE, DEFAULT_LOAD_ATTEMPTS, ONEMAP_BASE_URL};
use crate::constants::tokens::DEFAULT_EXPIRY_HOURS;
use crate::external::onemap::OneMapAuth;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL
    pub url: String,
}

/// JWT settings
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub token_secret: String,
    /// Token lifetime in hours
    pub token_expiry_hours: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("token_expiry_hours", &self.token_expiry_hours)
            .finish()
    }
}

/// Where planning-area boundaries come from
#[derive(Clone)]
pub enum AreaSourceConfig {
    /// Live OneMap API
    OneMap {
        /// API host
        base_url: String,
        /// Token or credentials
        auth: OneMapAuth,
    },
    /// Offline GeoJSON snapshot
    File {
        /// Snapshot path
        path: PathBuf,
    },
}

impl fmt::Debug for AreaSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneMap { base_url, auth } => f
                .debug_struct("OneMap")
                .field("base_url", base_url)
                .field(
                    "auth",
                    &match auth {
                        OneMapAuth::Token(_) => "token",
                        OneMapAuth::Credentials { .. } => "credentials",
                    },
                )
                .finish(),
            Self::File { path } => f.debug_struct("File").field("path", path).finish(),
        }
    }
}

/// Planning-area loading settings
#[derive(Debug, Clone)]
pub struct AreaConfig {
    /// Data source
    pub source: AreaSourceConfig,
    /// Attempts per registry load
    pub load_attempts: u32,
}

/// Twilio Verify credentials
#[derive(Clone)]
pub struct VerificationConfig {
    /// Account SID
    pub account_sid: String,
    /// Auth token
    pub auth_token: String,
    /// Verify service SID
    pub verify_service_sid: String,
}

impl fmt::Debug for VerificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("verify_service_sid", &self.verify_service_sid)
            .finish()
    }
}

/// Upload storage settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the buckets
    pub root: PathBuf,
    /// URL prefix under which stored files are reachable
    pub public_base_url: String,
}

/// CORS settings
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// `*` or a comma-separated origin list
    pub allowed_origins: String,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Log level
    pub log_level: LogLevel,
    /// Database settings
    pub database: DatabaseConfig,
    /// JWT settings
    pub auth: AuthConfig,
    /// Planning-area settings
    pub areas: AreaConfig,
    /// SMS verification, when configured
    pub verification: Option<VerificationConfig>,
    /// Upload storage
    pub storage: StorageConfig,
    /// CORS
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `TOKEN_SECRET` is missing or a value fails to parse.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {e}");
        }

        let port: u16 = env_var_or("PORT", "3000")
            .parse()
            .context("Invalid PORT value")?;
        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT")
                .or_else(|_| env::var("NODE_ENV"))
                .unwrap_or_default(),
        );

        let config = Self {
            host: env_var_or("HOST", "0.0.0.0"),
            port,
            environment,
            log_level: LogLevel::from_str_or_default(&env_var_or("RUST_LOG", "info")),
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", "sqlite:./data/pawboard.db"),
            },
            auth: AuthConfig {
                token_secret: env::var("TOKEN_SECRET").context("TOKEN_SECRET env var not set")?,
                token_expiry_hours: env_var_or(
                    "TOKEN_EXPIRY_HOURS",
                    &DEFAULT_EXPIRY_HOURS.to_string(),
                )
                .parse()
                .context("Invalid TOKEN_EXPIRY_HOURS value")?,
            },
            areas: AreaConfig {
                source: area_source_from_env(),
                load_attempts: env_var_or("AREA_LOAD_ATTEMPTS", &DEFAULT_LOAD_ATTEMPTS.to_string())
                    .parse()
                    .context("Invalid AREA_LOAD_ATTEMPTS value")?,
            },
            verification: verification_from_env(),
            storage: StorageConfig {
                root: PathBuf::from(env_var_or("STORAGE_DIR", "./data/storage")),
                public_base_url: env::var("STORAGE_PUBLIC_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{port}/storage")),
            },
            cors: CorsConfig {
                allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.auth.token_secret.trim().is_empty() {
            return Err(anyhow::anyhow!("TOKEN_SECRET cannot be empty"));
        }
        if self.auth.token_expiry_hours <= 0 {
            return Err(anyhow::anyhow!("TOKEN_EXPIRY_HOURS must be positive"));
        }
        if self.areas.load_attempts == 0 {
            return Err(anyhow::anyhow!("AREA_LOAD_ATTEMPTS must be at least 1"));
        }
        if self.environment.is_production() && self.auth.token_secret.len() < 32 {
            warn!("TOKEN_SECRET is shorter than 32 bytes in production");
        }
        if self.environment.is_production() && self.cors.allowed_origins == "*" {
            warn!("CORS allows any origin in production");
        }
        if self.verification.is_none() {
            warn!("Twilio Verify is not configured; two-factor logins will fail");
        }
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Pawboard Server Configuration:\n\
             - Address: {}:{}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - Area Source: {}\n\
             - SMS Verification: {}\n\
             - Storage: {}\n\
             - CORS Origins: {}",
            self.host,
            self.port,
            self.environment,
            self.log_level,
            self.database.url,
            match &self.areas.source {
                AreaSourceConfig::OneMap { base_url, .. } => format!("OneMap ({base_url})"),
                AreaSourceConfig::File { path } => format!("GeoJSON file ({})", path.display()),
            },
            if self.verification.is_some() {
                "Enabled"
            } else {
                "Disabled"
            },
            self.storage.root.display(),
            self.cors.allowed_origins,
        )
    }
}

fn area_source_from_env() -> AreaSourceConfig {
    let base_url = env_var_or("ONEMAP_BASE_URL", ONEMAP_BASE_URL);
    if let Some(token) = non_empty_var("ONEMAP_API_KEY") {
        return AreaSourceConfig::OneMap {
            base_url,
            auth: OneMapAuth::Token(token),
        };
    }
    if let (Some(email), Some(password)) =
        (non_empty_var("ONEMAP_EMAIL"), non_empty_var("ONEMAP_PASSWORD"))
    {
        return AreaSourceConfig::OneMap {
            base_url,
            auth: OneMapAuth::Credentials { email, password },
        };
    }
    AreaSourceConfig::File {
        path: PathBuf::from(env_var_or("AREA_BOUNDARY_FILE", DEFAULT_BOUNDARY_FILE)),
    }
}

fn verification_from_env() -> Option<VerificationConfig> {
    Some(VerificationConfig {
        account_sid: non_empty_var("TWILIO_SID")?,
        auth_token: non_empty_var("TWILIO_AUTH")?,
        verify_service_sid: non_empty_var("TWILIO_VERIFY_SID")?,
    })
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_or_default("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("nonsense"), LogLevel::Info);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("prod"),
            Environment::Production
        );
        assert_eq!(Environment::from_str_or_default("test"), Environment::Testing);
        assert_eq!(
            Environment::from_str_or_default(""),
            Environment::Development
        );
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let auth = AuthConfig {
            token_secret: "super-secret".to_owned(),
            token_expiry_hours: 1,
        };
        assert!(!format!("{auth:?}").contains("super-secret"));
    }
}
