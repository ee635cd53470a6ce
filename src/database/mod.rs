// ABOUTME: SQLite database manager for users, communities and forum content
// ABOUTME: Owns the connection pool, bootstraps the schema and shares row helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Database Management
//!
//! [`Database`] wraps a `SQLite` pool. Operations are grouped per table in
//! submodules, each adding an `impl Database` block and its own schema
//! bootstrap. Identifiers are stored as UUID text and timestamps as
//! fixed-width RFC 3339 text so that lexical order is chronological.
//!
//! Uniqueness is enforced by the schema (usernames, community membership,
//! reactions, adoptions, checklist items); violations surface as `409`.

mod adoptions;
mod checklist;
mod comments;
mod communities;
mod posts;
mod reactions;
mod users;

pub use adoptions::{AdoptedPost, AdoptionOutcome};
pub use checklist::ChecklistItem;
pub use comments::{Comment, CreateCommentRequest};
pub use communities::{Community, CommunityMembership, CreateCommunityRequest};
pub use posts::{
    CreatePostRequest, ListPostsFilter, Post, PostAuthor, PostType, ReactionCounts,
    UpdatePostRequest,
};
pub use reactions::{Reaction, ReactionType, ToggleOutcome};
pub use users::{CreateUserRequest, User, UserCredentials, UserRole};

use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, ErrorCode};

/// Database manager for all forum storage
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `database_url` and bootstrap the schema
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails or the
    /// schema cannot be created.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Each in-memory connection is its own database, so keep exactly one alive
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await?
        };

        let db = Self { pool };
        db.migrate().await?;
        info!(url = %database_url, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create every table and index that does not exist yet
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_communities().await?;
        self.migrate_posts().await?;
        self.migrate_comments().await?;
        self.migrate_reactions().await?;
        self.migrate_adoptions().await?;
        self.migrate_checklist().await?;
        Ok(())
    }
}

/// Classify a sqlx error, replacing the generic message with the failed operation
fn db_error(operation: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        let error = AppError::from(e);
        if error.code == ErrorCode::DatabaseError {
            AppError {
                message: format!("Failed to {operation}"),
                ..error
            }
        } else {
            error
        }
    }
}

/// Substring pattern for `LIKE ... ESCAPE '\'` matching `value` literally
fn like_contains(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime '{value}': {e}")))
}

fn parse_uuid(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|e| AppError::internal(format!("Invalid UUID '{value}': {e}")))
}

fn parse_optional_uuid(value: Option<String>) -> Result<Option<Uuid>, AppError> {
    value.as_deref().map(parse_uuid).transpose()
}
