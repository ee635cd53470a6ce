// ABOUTME: Community and membership storage with computed member and post counts
// ABOUTME: Membership uniqueness is enforced by the schema so duplicate joins surface as conflicts
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
use crate::errors::{AppError, AppResult, ErrorCode};

/// A location-bound community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Planning area the community belongs to
    pub location_name: String,
    /// Creating user, if known
    pub created_by: Option<Uuid>,
    /// Number of members
    pub member_count: i64,
    /// Number of posts linked to the community
    pub post_count: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Request to create a community
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommunityRequest {
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Planning area name
    pub location_name: String,
    /// Creating user
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// A user's membership in a community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMembership {
    /// Membership identifier
    pub id: Uuid,
    /// Community joined
    pub community_id: Uuid,
    /// Member
    pub user_id: Uuid,
    /// Join time
    pub joined_at: DateTime<Utc>,
    /// The community itself, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<Community>,
}

const COMMUNITY_SELECT: &str = r"
    SELECT c.id, c.name, c.description, c.location_name, c.created_by, c.created_at, c.updated_at,
           (SELECT COUNT(*) FROM community_members m WHERE m.community_id = c.id) AS member_count,
           (SELECT COUNT(*) FROM posts p WHERE p.community_id = c.id) AS post_count
    FROM communities c
";

impl Database {
    pub(super) async fn migrate_communities(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS communities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                location_name TEXT NOT NULL,
                created_by TEXT REFERENCES users(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS community_members (
                id TEXT PRIMARY KEY,
                community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                joined_at TEXT NOT NULL,
                UNIQUE(community_id, user_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_communities_location ON communities(location_name COLLATE NOCASE)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_community_members_user ON community_members(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a community
    ///
    /// # Errors
    ///
    /// Returns an error if `created_by` references an unknown user or the insert fails.
    pub async fn create_community(&self, request: &CreateCommunityRequest) -> AppResult<Community> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO communities (id, name, description, location_name, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(id.to_string())
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.location_name)
        .bind(request.created_by.map(|u| u.to_string()))
        .bind(timestamp(now))
        .bind(timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(db_error("create community"))?;

        Ok(Community {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            location_name: request.location_name.clone(),
            created_by: request.created_by,
            member_count: 0,
            post_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a community by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_community(&self, community_id: Uuid) -> AppResult<Option<Community>> {
        let row = sqlx::query(&format!("{COMMUNITY_SELECT} WHERE c.id = $1"))
            .bind(community_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get community"))?;
        row.as_ref().map(row_to_community).transpose()
    }

    /// List communities, optionally filtered by a case-insensitive location substring
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_communities(&self, location: Option<&str>) -> AppResult<Vec<Community>> {
        let rows = match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => {
                sqlx::query(&format!(
                    "{COMMUNITY_SELECT} WHERE c.location_name LIKE $1 ESCAPE '\\' ORDER BY c.name ASC"
                ))
                .bind(like_contains(location))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{COMMUNITY_SELECT} ORDER BY c.name ASC"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_error("list communities"))?;

        rows.iter().map(row_to_community).collect()
    }

    /// First community whose location matches `area_name` case-insensitively
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_community_by_area(&self, area_name: &str) -> AppResult<Option<Community>> {
        let row = sqlx::query(&format!(
            "{COMMUNITY_SELECT} WHERE c.location_name = $1 COLLATE NOCASE ORDER BY c.created_at ASC, c.rowid ASC LIMIT 1"
        ))
        .bind(area_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find community by area"))?;
        row.as_ref().map(row_to_community).transpose()
    }

    /// Add a user to a community
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_ALREADY_EXISTS` if the user is already a member.
    pub async fn join_community(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<CommunityMembership> {
        let id = Uuid::new_v4();
        let joined_at = Utc::now();

        sqlx::query(
            r"
            INSERT INTO community_members (id, community_id, user_id, joined_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id.to_string())
        .bind(community_id.to_string())
        .bind(user_id.to_string())
        .bind(timestamp(joined_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let error = db_error("join community")(e);
            if error.code == ErrorCode::ResourceAlreadyExists {
                AppError::already_exists("User is already a member of this community")
            } else {
                error
            }
        })?;

        Ok(CommunityMembership {
            id,
            community_id,
            user_id,
            joined_at,
            community: None,
        })
    }

    /// Remove a user from a community; returns false if they were not a member
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn leave_community(&self, community_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM community_members WHERE community_id = $1 AND user_id = $2")
                .bind(community_id.to_string())
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(db_error("leave community"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the user is a member of the community
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_member(&self, community_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("check membership"))?;
        Ok(count > 0)
    }

    /// All memberships of a user with the community embedded, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_user_memberships(&self, user_id: Uuid) -> AppResult<Vec<CommunityMembership>> {
        let rows = sqlx::query(
            r"
            SELECT id, community_id, user_id, joined_at
            FROM community_members
            WHERE user_id = $1
            ORDER BY joined_at DESC, rowid DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list memberships"))?;

        let mut memberships = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut membership = row_to_membership(row)?;
            membership.community = self.get_community(membership.community_id).await?;
            memberships.push(membership);
        }
        Ok(memberships)
    }
}

fn row_to_community(row: &SqliteRow) -> AppResult<Community> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Community {
        id: parse_uuid(&id)?,
        name: row.get("name"),
        description: row.get("description"),
        location_name: row.get("location_name"),
        created_by: parse_optional_uuid(row.get("created_by"))?,
        member_count: row.get("member_count"),
        post_count: row.get("post_count"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_membership(row: &SqliteRow) -> AppResult<CommunityMembership> {
    let id: String = row.get("id");
    let community_id: String = row.get("community_id");
    let user_id: String = row.get("user_id");
    let joined_at: String = row.get("joined_at");

    Ok(CommunityMembership {
        id: parse_uuid(&id)?,
        community_id: parse_uuid(&community_id)?,
        user_id: parse_uuid(&user_id)?,
        joined_at: parse_timestamp(&joined_at)?,
        community: None,
    })
}
