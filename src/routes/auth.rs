// ABOUTME: Authentication route handlers for registration, login and password changes
// ABOUTME: Issues JWTs after a password or SMS code check and exposes the caller's claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Authentication Routes
//!
//! Accounts with two-factor login get an SMS code after a correct password
//! and exchange it for a token at `/auth/verify-code`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{json_body, parse_path_id};
use crate::auth::{hash_password, verify_password};
use crate::constants::accounts::{MIN_PASSWORD_LEN, MIN_USERNAME_LEN, VERIFICATION_CODE_LEN};
use crate::database::{CreateUserRequest, UserCredentials};
use crate::errors::{AppError, AppResult};
use crate::external::normalize_phone_number;
use crate::logging::AppLogger;
use crate::middleware::authenticate_bearer;
use crate::resources::ServerResources;
use crate::utils::validation::Validator;

/// Registration body; every field is checked so all problems are reported at once
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegisterBody {
    name: Option<String>,
    username: Option<String>,
    age: Option<i64>,
    gender: Option<String>,
    password: Option<String>,
    contact_no: Option<String>,
    avatar_url: Option<String>,
    role: Option<String>,
    has_2fa_enabled: bool,
}

impl RegisterBody {
    fn into_request(self) -> AppResult<CreateUserRequest> {
        let name = self.name.unwrap_or_default();
        let username = self.username.unwrap_or_default();
        let gender = self.gender.unwrap_or_default();
        let password = self.password.unwrap_or_default();
        let contact_no = self.contact_no.unwrap_or_default();
        let role = self.role.unwrap_or_default();

        let mut validator = Validator::new();
        validator
            .required("name", &name)
            .min_len("username", &username, MIN_USERNAME_LEN)
            .check(self.age.is_some(), "age", "is required")
            .range("age", self.age.unwrap_or(0), 0, 150)
            .required("gender", &gender)
            .min_len("password", &password, MIN_PASSWORD_LEN)
            .required("contact_no", &contact_no)
            .check(self.avatar_url.is_some(), "avatar_url", "is required")
            .one_of("role", &role, &["user", "shelter"]);
        validator.finish()?;

        Ok(CreateUserRequest {
            name,
            username,
            age: self.age.unwrap_or(0),
            gender,
            password,
            contact_no,
            avatar_url: self.avatar_url.unwrap_or_default(),
            role,
            has_2fa_enabled: self.has_2fa_enabled,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VerifyCodeBody {
    username: String,
    code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChangePasswordBody {
    current_password: String,
    new_password: String,
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/register", post(Self::handle_register))
            .route("/auth/login", post(Self::handle_login))
            .route("/auth/verify-code", post(Self::handle_verify_code))
            .route("/auth/password/:id", put(Self::handle_change_password))
            .route("/auth/me", get(Self::handle_me))
            .with_state(resources)
    }

    /// Handle POST /auth/register - Create an account
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<RegisterBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let mut request = json_body(body)?.into_request()?;
        let password_hash = hash_password(std::mem::take(&mut request.password)).await?;

        let user = resources
            .database
            .create_user(&request, &password_hash)
            .await
            .inspect_err(|_| {
                AppLogger::log_auth_event(&request.username, "register", false, None);
            })?;

        AppLogger::log_auth_event(&user.username, "register", true, Some(user.role.as_str()));
        info!(user_id = %user.id, "User registered");

        Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": format!("User with id {} created successfully", user.id),
                "user_id": user.id,
            })),
        )
            .into_response())
    }

    /// Handle POST /auth/login - Password login, or SMS challenge for two-factor accounts
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<LoginBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let body = json_body(body)?;
        let mut validator = Validator::new();
        validator
            .required("username", &body.username)
            .required("password", &body.password);
        validator.finish()?;

        let credentials = Self::credentials_for(&resources, &body.username).await?;
        let UserCredentials {
            user,
            password_hash,
        } = credentials;

        if !verify_password(body.password, password_hash).await? {
            AppLogger::log_auth_event(&user.username, "login", false, Some("wrong password"));
            return Err(AppError::invalid_input("Wrong password"));
        }

        if user.has_2fa_enabled {
            resources
                .verification
                .send_code(&normalize_phone_number(&user.contact_no))
                .await?;
            AppLogger::log_auth_event(&user.username, "login_code_sent", true, None);
            return Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "User has 2fa enabled. Code has been sent to user's phone number.",
                    "requires_code": true,
                })),
            )
                .into_response());
        }

        let token = resources.auth_manager.generate_token(&user)?;
        AppLogger::log_auth_event(&user.username, "login", true, None);

        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Login successful.", "token": token })),
        )
            .into_response())
    }

    /// Handle POST /auth/verify-code - Exchange an SMS code for a token
    async fn handle_verify_code(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<VerifyCodeBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let body = json_body(body)?;
        let mut validator = Validator::new();
        validator
            .min_len("username", &body.username, MIN_USERNAME_LEN)
            .exact_len("code", &body.code, VERIFICATION_CODE_LEN);
        validator.finish()?;

        let UserCredentials { user, .. } = Self::credentials_for(&resources, &body.username).await?;

        let status = resources
            .verification
            .check_code(&normalize_phone_number(&user.contact_no), &body.code)
            .await?;
        if !status.is_approved() {
            AppLogger::log_auth_event(&user.username, "verify_code", false, None);
            return Err(AppError::auth_invalid("Login failed. Incorrect code."));
        }

        let token = resources.auth_manager.generate_token(&user)?;
        AppLogger::log_auth_event(&user.username, "verify_code", true, None);

        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Login successful.", "token": token })),
        )
            .into_response())
    }

    /// Handle PUT /auth/password/:id - Change a password after confirming the current one
    async fn handle_change_password(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        body: Result<Json<ChangePasswordBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let user_id = parse_path_id(&id, "user")?;
        let body = json_body(body)?;
        let mut validator = Validator::new();
        validator
            .required("current_password", &body.current_password)
            .min_len("new_password", &body.new_password, MIN_PASSWORD_LEN);
        validator.finish()?;

        let credentials = resources
            .database
            .get_credentials(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User with id {id}")))?;

        if !verify_password(body.current_password, credentials.password_hash).await? {
            AppLogger::log_auth_event(&credentials.user.username, "password_change", false, None);
            return Err(AppError::invalid_input("Wrong password"));
        }

        let new_hash = hash_password(body.new_password).await?;
        if !resources
            .database
            .update_password_hash(user_id, &new_hash)
            .await?
        {
            return Err(AppError::not_found(format!("User with id {id}")));
        }
        AppLogger::log_auth_event(&credentials.user.username, "password_change", true, None);

        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Password change successful" })),
        )
            .into_response())
    }

    /// Handle GET /auth/me - Claims of the bearer token
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = authenticate_bearer(&headers, &resources.auth_manager)?;
        Ok((StatusCode::OK, Json(claims)).into_response())
    }

    async fn credentials_for(
        resources: &ServerResources,
        username: &str,
    ) -> AppResult<UserCredentials> {
        resources
            .database
            .get_credentials_by_username(username)
            .await?
            .ok_or_else(|| {
                AppLogger::log_auth_event(username, "login", false, Some("unknown user"));
                AppError::not_found(format!("User with username {username}"))
            })
    }
}
