// ABOUTME: User account storage with bcrypt password hashes kept out of public models
// ABOUTME: Registration, lookup by id or username, listing and password changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{db_error, parse_timestamp, parse_uuid, timestamp, Database};
use crate::errors::AppResult;

/// Account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Individual member
    #[default]
    User,
    /// Animal shelter account
    Shelter,
}

impl UserRole {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Shelter => "shelter",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "shelter" => Self::Shelter,
            _ => Self::User,
        }
    }
}

/// Public user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Unique login name
    pub username: String,
    /// Age in years
    pub age: i64,
    /// Self-described gender
    pub gender: String,
    /// Phone number used for SMS codes
    pub contact_no: String,
    /// Avatar image URL
    pub avatar_url: String,
    /// Account type
    pub role: UserRole,
    /// Whether login requires an SMS code
    pub has_2fa_enabled: bool,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// A user together with their password hash, for authentication only
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// The account
    pub user: User,
    /// bcrypt hash
    pub password_hash: String,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Display name
    pub name: String,
    /// Unique login name (at least 3 characters)
    pub username: String,
    /// Age in years
    pub age: i64,
    /// Self-described gender
    pub gender: String,
    /// Plain-text password (at least 8 characters); hashed before storage
    pub password: String,
    /// Phone number
    pub contact_no: String,
    /// Avatar image URL
    pub avatar_url: String,
    /// Account type
    pub role: String,
    /// Enable SMS two-factor login
    #[serde(default)]
    pub has_2fa_enabled: bool,
}

const USER_COLUMNS: &str = "id, name, username, age, gender, contact_no, avatar_url, role, \
                            has_2fa_enabled, created_at";

impl Database {
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                contact_no TEXT NOT NULL,
                avatar_url TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'shelter')),
                has_2fa_enabled INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a new user with an already hashed password
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_ALREADY_EXISTS` if the username is taken.
    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
        password_hash: &str,
    ) -> AppResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            username: request.username.clone(),
            age: request.age,
            gender: request.gender.clone(),
            contact_no: request.contact_no.clone(),
            avatar_url: request.avatar_url.clone(),
            role: UserRole::parse(&request.role),
            has_2fa_enabled: request.has_2fa_enabled,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO users (
                id, name, username, age, gender, password_hash, contact_no,
                avatar_url, role, has_2fa_enabled, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.username)
        .bind(user.age)
        .bind(&user.gender)
        .bind(password_hash)
        .bind(&user.contact_no)
        .bind(&user.avatar_url)
        .bind(user.role.as_str())
        .bind(user.has_2fa_enabled)
        .bind(timestamp(user.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_error("create user"))?;

        Ok(user)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get user"))?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Whether a user with this ID exists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn user_exists(&self, user_id: Uuid) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("check user"))?;
        Ok(count > 0)
    }

    /// Get a user and password hash by username
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_credentials_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get user"))?;
        row.as_ref().map(row_to_credentials).transpose()
    }

    /// Get a user and password hash by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_credentials(&self, user_id: Uuid) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE id = $1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get user"))?;
        row.as_ref().map(row_to_credentials).transpose()
    }

    /// List all users, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list users"))?;
        rows.iter().map(row_to_user).collect()
    }

    /// Replace a user's password hash; returns false if the user does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_password_hash(&self, user_id: Uuid, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("update password"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    let created_at: String = row.get("created_at");

    Ok(User {
        id: parse_uuid(&id)?,
        name: row.get("name"),
        username: row.get("username"),
        age: row.get("age"),
        gender: row.get("gender"),
        contact_no: row.get("contact_no"),
        avatar_url: row.get("avatar_url"),
        role: UserRole::parse(&role),
        has_2fa_enabled: row.get("has_2fa_enabled"),
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_credentials(row: &SqliteRow) -> AppResult<UserCredentials> {
    Ok(UserCredentials {
        user: row_to_user(row)?,
        password_hash: row.get("password_hash"),
    })
}
