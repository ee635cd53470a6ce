// ABOUTME: Adoption records linking a user to the post of the animal they adopted
// ABOUTME: Marking the same post twice is reported as already adopted rather than an error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{db_error, timestamp, Database};
use crate::errors::{AppResult, ErrorCode};

/// A completed adoption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptedPost {
    /// Unique identifier
    pub id: Uuid,
    /// Adopting user
    pub user_id: Uuid,
    /// Adoption post
    pub post_id: Uuid,
    /// Adoption time
    pub adopted_at: DateTime<Utc>,
}

/// Result of marking a post as adopted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdoptionOutcome {
    /// A new adoption record was written
    Adopted(AdoptedPost),
    /// The user had already adopted this post
    AlreadyAdopted,
}

impl Database {
    pub(super) async fn migrate_adoptions(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS adopted_posts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                adopted_at TEXT NOT NULL,
                UNIQUE(user_id, post_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record that `user_id` adopted the animal from `post_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the post or user does not exist or the insert fails.
    pub async fn mark_adopted(&self, user_id: Uuid, post_id: Uuid) -> AppResult<AdoptionOutcome> {
        let adoption = AdoptedPost {
            id: Uuid::new_v4(),
            user_id,
            post_id,
            adopted_at: Utc::now(),
        };

        let inserted = sqlx::query(
            "INSERT INTO adopted_posts (id, user_id, post_id, adopted_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(adoption.id.to_string())
        .bind(user_id.to_string())
        .bind(post_id.to_string())
        .bind(timestamp(adoption.adopted_at))
        .execute(&self.pool)
        .await
        .map_err(db_error("mark adoption"));

        match inserted {
            Ok(_) => Ok(AdoptionOutcome::Adopted(adoption)),
            Err(e) if e.code == ErrorCode::ResourceAlreadyExists => {
                Ok(AdoptionOutcome::AlreadyAdopted)
            }
            Err(e) => Err(e),
        }
    }
}
