// ABOUTME: Post reaction storage with toggle semantics per user and reaction type
// ABOUTME: A second toggle of the same reaction removes it; counts are tallied per type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{db_error, parse_timestamp, parse_uuid, timestamp, Database, ReactionCounts};
use crate::errors::{AppError, AppResult};

/// Kind of reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    /// Thumbs up
    #[default]
    Like,
    /// Heart
    Heart,
    /// Marked as helpful
    Helpful,
}

impl ReactionType {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Heart => "heart",
            Self::Helpful => "helpful",
        }
    }

    /// Parse from string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Self::Like),
            "heart" => Some(Self::Heart),
            "helpful" => Some(Self::Helpful),
            _ => None,
        }
    }
}

/// A user's reaction to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Unique identifier
    pub id: Uuid,
    /// Post reacted to
    pub post_id: Uuid,
    /// Reacting user
    pub user_id: Uuid,
    /// Kind of reaction
    pub reaction_type: ReactionType,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Result of toggling a reaction or checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The row was created
    Added,
    /// The row existed and was removed
    Removed,
}

impl ToggleOutcome {
    /// Action label returned to clients
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

impl Database {
    pub(super) async fn migrate_reactions(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS post_reactions (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reaction_type TEXT NOT NULL CHECK (reaction_type IN ('like', 'heart', 'helpful')),
                created_at TEXT NOT NULL,
                UNIQUE(post_id, user_id, reaction_type)
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Add the reaction if absent, remove it if present
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` if the post or user does not exist.
    pub async fn toggle_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        reaction_type: ReactionType,
    ) -> AppResult<ToggleOutcome> {
        let removed = sqlx::query(
            "DELETE FROM post_reactions WHERE post_id = $1 AND user_id = $2 AND reaction_type = $3",
        )
        .bind(post_id.to_string())
        .bind(user_id.to_string())
        .bind(reaction_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("toggle reaction"))?;

        if removed.rows_affected() > 0 {
            return Ok(ToggleOutcome::Removed);
        }

        sqlx::query(
            r"
            INSERT INTO post_reactions (id, post_id, user_id, reaction_type, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(post_id.to_string())
        .bind(user_id.to_string())
        .bind(reaction_type.as_str())
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_error("toggle reaction"))?;

        Ok(ToggleOutcome::Added)
    }

    /// Reaction tallies for a post
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_reaction_counts(&self, post_id: Uuid) -> AppResult<ReactionCounts> {
        let rows = sqlx::query(
            r"
            SELECT reaction_type, COUNT(*) AS total
            FROM post_reactions
            WHERE post_id = $1
            GROUP BY reaction_type
            ",
        )
        .bind(post_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("count reactions"))?;

        let (mut like, mut heart, mut helpful) = (0, 0, 0);
        for row in &rows {
            let kind: String = row.get("reaction_type");
            let total: i64 = row.get("total");
            match ReactionType::parse(&kind) {
                Some(ReactionType::Like) => like = total,
                Some(ReactionType::Heart) => heart = total,
                Some(ReactionType::Helpful) => helpful = total,
                None => {}
            }
        }
        Ok(ReactionCounts::new(like, heart, helpful))
    }

    /// A user's reactions to a post
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_user_reactions(&self, post_id: Uuid, user_id: Uuid) -> AppResult<Vec<Reaction>> {
        let rows = sqlx::query(
            r"
            SELECT id, post_id, user_id, reaction_type, created_at
            FROM post_reactions
            WHERE post_id = $1 AND user_id = $2
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(post_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list reactions"))?;
        rows.iter().map(row_to_reaction).collect()
    }
}

fn row_to_reaction(row: &SqliteRow) -> AppResult<Reaction> {
    let id: String = row.get("id");
    let post_id: String = row.get("post_id");
    let user_id: String = row.get("user_id");
    let reaction_type: String = row.get("reaction_type");
    let created_at: String = row.get("created_at");

    Ok(Reaction {
        id: parse_uuid(&id)?,
        post_id: parse_uuid(&post_id)?,
        user_id: parse_uuid(&user_id)?,
        reaction_type: ReactionType::parse(&reaction_type).ok_or_else(|| {
            AppError::internal(format!("Unknown reaction type '{reaction_type}'"))
        })?,
        created_at: parse_timestamp(&created_at)?,
    })
}
