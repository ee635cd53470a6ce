// ABOUTME: Forum post storage with author, comment and reaction counts attached on read
// ABOUTME: Supports type, text and tag filters, partial updates and atomic view counting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{
    db_error, like_contains, parse_optional_uuid, parse_timestamp, parse_uuid, timestamp,
    Database,
};
use crate::constants::forum::{DEFAULT_POST_LIMIT, MAX_POST_LIMIT};
use crate::errors::{AppError, AppResult};

/// Kind of forum post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    /// Animal available for adoption
    Adoption,
    /// Stray or lost animal spotted
    Sighting,
    /// Owner looking for a lost pet
    Lost,
    /// Found animal looking for its owner
    Found,
}

impl PostType {
    /// All post types
    pub const ALL: [Self; 4] = [Self::Adoption, Self::Sighting, Self::Lost, Self::Found];

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Adoption => "adoption",
            Self::Sighting => "sighting",
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }

    /// Parse from string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Public profile fields embedded in posts and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    /// User ID
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Login name
    pub username: String,
    /// Avatar URL
    pub avatar_url: String,
}

/// Reaction tallies for one post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    /// Likes
    pub like: i64,
    /// Hearts
    pub heart: i64,
    /// Helpful marks
    pub helpful: i64,
    /// Sum of all reactions
    pub total: i64,
}

impl ReactionCounts {
    /// Counts from per-type tallies
    #[must_use]
    pub const fn new(like: i64, heart: i64, helpful: i64) -> Self {
        Self {
            like,
            heart,
            helpful,
            total: like + heart + helpful,
        }
    }
}

/// A forum post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: Uuid,
    /// Author's user ID
    pub user_id: Uuid,
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Kind of post
    pub post_type: PostType,
    /// Free-form location label
    pub location_name: Option<String>,
    /// Latitude of the sighting or pet
    pub location_lat: Option<f64>,
    /// Longitude of the sighting or pet
    pub location_lng: Option<f64>,
    /// Uploaded image URLs
    pub image_urls: Vec<String>,
    /// Tags
    pub tags: Vec<String>,
    /// Times the post was viewed
    pub view_count: i64,
    /// Whether the case is closed
    pub is_resolved: bool,
    /// Community resolved from the coordinates
    pub community_id: Option<Uuid>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Author profile
    pub users: Option<PostAuthor>,
    /// Number of comments
    pub comment_count: i64,
    /// Total number of reactions
    pub reaction_count: i64,
    /// Reactions by type
    pub reaction_counts: ReactionCounts,
}

/// Request to create a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    /// Author
    pub user_id: Uuid,
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Kind of post
    pub post_type: PostType,
    /// Location label
    #[serde(default)]
    pub location_name: Option<String>,
    /// Latitude
    #[serde(default)]
    pub location_lat: Option<f64>,
    /// Longitude
    #[serde(default)]
    pub location_lng: Option<f64>,
    /// Image URLs
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of a post; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    /// New title
    #[serde(default)]
    pub title: Option<String>,
    /// New body text
    #[serde(default)]
    pub content: Option<String>,
    /// New location label
    #[serde(default)]
    pub location_name: Option<String>,
    /// New latitude
    #[serde(default)]
    pub location_lat: Option<f64>,
    /// New longitude
    #[serde(default)]
    pub location_lng: Option<f64>,
    /// Open or close the case
    #[serde(default)]
    pub is_resolved: Option<bool>,
    /// Replace image URLs
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    /// Replace tags
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl UpdatePostRequest {
    /// Whether the update touches the coordinates
    #[must_use]
    pub const fn changes_coordinates(&self) -> bool {
        self.location_lat.is_some() || self.location_lng.is_some()
    }
}

/// Filters for listing posts
#[derive(Debug, Clone, Default)]
pub struct ListPostsFilter {
    /// Only posts of this type
    pub post_type: Option<PostType>,
    /// Case-insensitive substring of the title or content
    pub search: Option<String>,
    /// Posts must carry every one of these tags
    pub tags: Vec<String>,
    /// Only posts linked to this community
    pub community_id: Option<Uuid>,
    /// Maximum number of posts (clamped to the allowed range)
    pub limit: Option<i64>,
}

impl ListPostsFilter {
    /// Effective limit after defaulting and clamping
    #[must_use]
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_POST_LIMIT)
            .clamp(1, MAX_POST_LIMIT)
    }
}

const POST_SELECT: &str = r"
    SELECT p.id, p.user_id, p.title, p.content, p.post_type, p.location_name, p.location_lat,
           p.location_lng, p.image_urls, p.tags, p.view_count, p.is_resolved, p.community_id,
           p.created_at, p.updated_at,
           u.name AS author_name, u.username AS author_username, u.avatar_url AS author_avatar_url,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
           (SELECT COUNT(*) FROM post_reactions r WHERE r.post_id = p.id AND r.reaction_type = 'like') AS like_count,
           (SELECT COUNT(*) FROM post_reactions r WHERE r.post_id = p.id AND r.reaction_type = 'heart') AS heart_count,
           (SELECT COUNT(*) FROM post_reactions r WHERE r.post_id = p.id AND r.reaction_type = 'helpful') AS helpful_count
    FROM posts p
    LEFT JOIN users u ON u.id = p.user_id
";

impl Database {
    pub(super) async fn migrate_posts(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                post_type TEXT NOT NULL CHECK (post_type IN ('adoption', 'sighting', 'lost', 'found')),
                location_name TEXT,
                location_lat REAL,
                location_lng REAL,
                image_urls TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL DEFAULT '[]',
                view_count INTEGER NOT NULL DEFAULT 0,
                is_resolved INTEGER NOT NULL DEFAULT 0,
                community_id TEXT REFERENCES communities(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_community ON posts(community_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a post, linked to `community_id` when one was resolved
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` if the author does not exist.
    pub async fn create_post(
        &self,
        request: &CreatePostRequest,
        community_id: Option<Uuid>,
    ) -> AppResult<Post> {
        let id = Uuid::new_v4();
        let now = timestamp(Utc::now());
        let image_urls = serde_json::to_string(&request.image_urls)?;
        let tags = serde_json::to_string(&request.tags)?;

        sqlx::query(
            r"
            INSERT INTO posts (
                id, user_id, title, content, post_type, location_name, location_lat, location_lng,
                image_urls, tags, view_count, is_resolved, community_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, 0, $11, $12, $13)
            ",
        )
        .bind(id.to_string())
        .bind(request.user_id.to_string())
        .bind(&request.title)
        .bind(&request.content)
        .bind(request.post_type.as_str())
        .bind(&request.location_name)
        .bind(request.location_lat)
        .bind(request.location_lng)
        .bind(&image_urls)
        .bind(&tags)
        .bind(community_id.map(|c| c.to_string()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_error("create post"))?;

        self.get_post(id)
            .await?
            .ok_or_else(|| AppError::internal("Created post could not be read back"))
    }

    /// Get a post by ID with author and counts
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_post(&self, post_id: Uuid) -> AppResult<Option<Post>> {
        let row = sqlx::query(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(post_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get post"))?;
        row.as_ref().map(row_to_post).transpose()
    }

    /// Whether a post with this ID exists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn post_exists(&self, post_id: Uuid) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE id = $1")
            .bind(post_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("check post"))?;
        Ok(count > 0)
    }

    /// List posts newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_posts(&self, filter: &ListPostsFilter) -> AppResult<Vec<Post>> {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        if let Some(post_type) = filter.post_type {
            conditions.push("p.post_type = ?".to_owned());
            binds.push(post_type.as_str().to_owned());
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push(
                "(p.title LIKE ? ESCAPE '\\' OR p.content LIKE ? ESCAPE '\\')".to_owned(),
            );
            let pattern = like_contains(search.trim());
            binds.push(pattern.clone());
            binds.push(pattern);
        }
        for tag in filter.tags.iter().filter(|t| !t.is_empty()) {
            conditions.push(
                "EXISTS (SELECT 1 FROM json_each(p.tags) WHERE json_each.value = ?)".to_owned(),
            );
            binds.push(tag.clone());
        }
        if let Some(community_id) = filter.community_id {
            conditions.push("p.community_id = ?".to_owned());
            binds.push(community_id.to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "{POST_SELECT} {where_clause} ORDER BY p.created_at DESC, p.rowid DESC LIMIT {}",
            filter.effective_limit()
        );

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list posts"))?;

        rows.iter().map(row_to_post).collect()
    }

    /// Apply a partial update; `community_id` is the post's community after the update
    ///
    /// Returns `None` if the post does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_post(
        &self,
        post_id: Uuid,
        request: &UpdatePostRequest,
        community_id: Option<Uuid>,
    ) -> AppResult<Option<Post>> {
        let Some(existing) = self.get_post(post_id).await? else {
            return Ok(None);
        };

        let title = request.title.as_ref().unwrap_or(&existing.title);
        let content = request.content.as_ref().unwrap_or(&existing.content);
        let location_name = request
            .location_name
            .as_ref()
            .or(existing.location_name.as_ref());
        let location_lat = request.location_lat.or(existing.location_lat);
        let location_lng = request.location_lng.or(existing.location_lng);
        let is_resolved = request.is_resolved.unwrap_or(existing.is_resolved);
        let image_urls =
            serde_json::to_string(request.image_urls.as_ref().unwrap_or(&existing.image_urls))?;
        let tags = serde_json::to_string(request.tags.as_ref().unwrap_or(&existing.tags))?;

        sqlx::query(
            r"
            UPDATE posts SET
                title = $1, content = $2, location_name = $3, location_lat = $4, location_lng = $5,
                is_resolved = $6, image_urls = $7, tags = $8, community_id = $9, updated_at = $10
            WHERE id = $11
            ",
        )
        .bind(title)
        .bind(content)
        .bind(location_name)
        .bind(location_lat)
        .bind(location_lng)
        .bind(is_resolved)
        .bind(&image_urls)
        .bind(&tags)
        .bind(community_id.map(|c| c.to_string()))
        .bind(timestamp(Utc::now()))
        .bind(post_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error("update post"))?;

        self.get_post(post_id).await
    }

    /// Delete a post and, by cascade, its comments and reactions
    ///
    /// Returns false if the post does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_post(&self, post_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete post"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically increment a post's view count; returns false if the post does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn increment_post_views(&self, post_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(post_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("count view"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn parse_string_list(value: &str) -> AppResult<Vec<String>> {
    Ok(serde_json::from_str(value)?)
}

pub(super) fn row_to_author(row: &SqliteRow, user_id: Uuid) -> Option<PostAuthor> {
    let name: Option<String> = row.get("author_name");
    let username: Option<String> = row.get("author_username");
    let avatar_url: Option<String> = row.get("author_avatar_url");

    Some(PostAuthor {
        id: user_id,
        name: name?,
        username: username?,
        avatar_url: avatar_url.unwrap_or_default(),
    })
}

fn row_to_post(row: &SqliteRow) -> AppResult<Post> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let post_type: String = row.get("post_type");
    let image_urls: String = row.get("image_urls");
    let tags: String = row.get("tags");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let user_id = parse_uuid(&user_id)?;
    let reaction_counts = ReactionCounts::new(
        row.get("like_count"),
        row.get("heart_count"),
        row.get("helpful_count"),
    );

    Ok(Post {
        id: parse_uuid(&id)?,
        user_id,
        title: row.get("title"),
        content: row.get("content"),
        post_type: PostType::parse(&post_type)
            .ok_or_else(|| AppError::internal(format!("Unknown post type '{post_type}'")))?,
        location_name: row.get("location_name"),
        location_lat: row.get("location_lat"),
        location_lng: row.get("location_lng"),
        image_urls: parse_string_list(&image_urls)?,
        tags: parse_string_list(&tags)?,
        view_count: row.get("view_count"),
        is_resolved: row.get("is_resolved"),
        community_id: parse_optional_uuid(row.get("community_id"))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        users: row_to_author(row, user_id),
        comment_count: row.get("comment_count"),
        reaction_count: reaction_counts.total,
        reaction_counts,
    })
}
