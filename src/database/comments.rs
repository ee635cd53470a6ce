// ABOUTME: Comment storage for forum posts, optionally threaded via a parent comment
// ABOUTME: Comments are returned oldest first with the author's public profile attached
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::posts::row_to_author;
use super::{
    db_error, parse_optional_uuid, parse_timestamp, parse_uuid, timestamp, Database, PostAuthor,
};
use crate::errors::{AppError, AppResult};

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: Uuid,
    /// Post commented on
    pub post_id: Uuid,
    /// Author
    pub user_id: Uuid,
    /// Comment text
    pub content: String,
    /// Comment being replied to
    pub parent_comment_id: Option<Uuid>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Author profile
    pub users: Option<PostAuthor>,
}

/// Request to add a comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    /// Author
    pub user_id: Uuid,
    /// Comment text
    pub content: String,
    /// Comment being replied to
    #[serde(default)]
    pub parent_comment_id: Option<Uuid>,
}

const COMMENT_SELECT: &str = r"
    SELECT c.id, c.post_id, c.user_id, c.content, c.parent_comment_id, c.created_at,
           u.name AS author_name, u.username AS author_username, u.avatar_url AS author_avatar_url
    FROM comments c
    LEFT JOIN users u ON u.id = c.user_id
";

impl Database {
    pub(super) async fn migrate_comments(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                parent_comment_id TEXT REFERENCES comments(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Add a comment to a post
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` if the post, author or parent comment does not exist.
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        request: &CreateCommentRequest,
    ) -> AppResult<Comment> {
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO comments (id, post_id, user_id, content, parent_comment_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id.to_string())
        .bind(post_id.to_string())
        .bind(request.user_id.to_string())
        .bind(&request.content)
        .bind(request.parent_comment_id.map(|p| p.to_string()))
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_error("add comment"))?;

        let row = sqlx::query(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("add comment"))?;
        row.as_ref()
            .map(row_to_comment)
            .transpose()?
            .ok_or_else(|| AppError::internal("Created comment could not be read back"))
    }

    /// Comments on a post, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_comments(&self, post_id: Uuid) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at ASC, c.rowid ASC"
        ))
        .bind(post_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list comments"))?;
        rows.iter().map(row_to_comment).collect()
    }
}

fn row_to_comment(row: &SqliteRow) -> AppResult<Comment> {
    let id: String = row.get("id");
    let post_id: String = row.get("post_id");
    let user_id: String = row.get("user_id");
    let created_at: String = row.get("created_at");
    let user_id = parse_uuid(&user_id)?;

    Ok(Comment {
        id: parse_uuid(&id)?,
        post_id: parse_uuid(&post_id)?,
        user_id,
        content: row.get("content"),
        parent_comment_id: parse_optional_uuid(row.get("parent_comment_id"))?,
        created_at: parse_timestamp(&created_at)?,
        users: row_to_author(row, user_id),
    })
}
