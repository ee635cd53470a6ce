// ABOUTME: Per-user adoption checklist progress for a post
// ABOUTME: Each of the fixed checklist items is toggled on or off independently
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{db_error, parse_timestamp, parse_uuid, timestamp, Database, ToggleOutcome};
use crate::constants::forum::CHECKLIST_ITEM_COUNT;
use crate::errors::AppResult;

/// A checked checklist item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Unique identifier
    pub id: Uuid,
    /// User working through the checklist
    pub user_id: Uuid,
    /// Adoption post the checklist belongs to
    pub post_id: Uuid,
    /// Item position
    pub item_index: i64,
    /// When the item was checked
    pub checked_at: DateTime<Utc>,
}

impl Database {
    pub(super) async fn migrate_checklist(&self) -> Result<()> {
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS checklist_items (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                item_index INTEGER NOT NULL CHECK (item_index >= 0 AND item_index < {CHECKLIST_ITEM_COUNT}),
                checked_at TEXT NOT NULL,
                UNIQUE(user_id, post_id, item_index)
            )
            "
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Check the item if unchecked, uncheck it otherwise
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` if the index is out of range or the user or post does not exist.
    pub async fn toggle_checklist_item(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        item_index: i64,
    ) -> AppResult<ToggleOutcome> {
        let removed = sqlx::query(
            "DELETE FROM checklist_items WHERE user_id = $1 AND post_id = $2 AND item_index = $3",
        )
        .bind(user_id.to_string())
        .bind(post_id.to_string())
        .bind(item_index)
        .execute(&self.pool)
        .await
        .map_err(db_error("toggle checklist item"))?;

        if removed.rows_affected() > 0 {
            return Ok(ToggleOutcome::Removed);
        }

        sqlx::query(
            r"
            INSERT INTO checklist_items (id, user_id, post_id, item_index, checked_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(post_id.to_string())
        .bind(item_index)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_error("toggle checklist item"))?;

        Ok(ToggleOutcome::Added)
    }

    /// Checked items for a user and post, by index
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_checklist(&self, user_id: Uuid, post_id: Uuid) -> AppResult<Vec<ChecklistItem>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, post_id, item_index, checked_at
            FROM checklist_items
            WHERE user_id = $1 AND post_id = $2
            ORDER BY item_index ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(post_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list checklist"))?;
        rows.iter().map(row_to_item).collect()
    }
}

fn row_to_item(row: &SqliteRow) -> AppResult<ChecklistItem> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let post_id: String = row.get("post_id");
    let checked_at: String = row.get("checked_at");

    Ok(ChecklistItem {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        post_id: parse_uuid(&post_id)?,
        item_index: row.get("item_index"),
        checked_at: parse_timestamp(&checked_at)?,
    })
}
