// ABOUTME: JWT issuance and validation plus bcrypt password hashing for forum accounts
// ABOUTME: Tokens are HS256 signed with the configured secret and carry public profile claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Authentication
//!
//! [`AuthManager`] signs and validates `JWT`s with a shared HS256 secret.
//! Expiry is checked separately from signature validation so that an expired
//! token is reported as expired rather than invalid.
//!
//! Password hashing runs on the blocking pool because bcrypt is deliberately slow.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::accounts::BCRYPT_COST;
use crate::constants::tokens::JWT_AUDIENCE;
use crate::database::User;
use crate::errors::{AppError, AppResult, ErrorCode};

/// `JWT` validation error with detailed information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature or claims are invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let minutes = current_time.signed_duration_since(*expired_at).num_minutes();
                write!(
                    f,
                    "JWT token expired {minutes} minutes ago at {}",
                    expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Self::TokenInvalid { reason } => write!(f, "JWT token is invalid: {reason}"),
            Self::TokenMalformed { details } => write!(f, "JWT token is malformed: {details}"),
        }
    }
}

impl std::error::Error for JwtValidationError {}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        let code = match error {
            JwtValidationError::TokenExpired { .. } => ErrorCode::AuthExpired,
            JwtValidationError::TokenInvalid { .. } => ErrorCode::AuthInvalid,
            JwtValidationError::TokenMalformed { .. } => ErrorCode::AuthMalformed,
        };
        Self::new(code, error.to_string())
    }
}

/// `JWT` claims for an authenticated forum user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// Login name
    pub username: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    pub avatar_url: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience (who the token is intended for)
    pub aud: String,
}

/// Authentication manager for `JWT` tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create a manager signing with `secret`
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_hours,
        }
    }

    /// Token lifetime in hours
    #[must_use]
    pub const fn token_expiry_hours(&self) -> i64 {
        self.token_expiry_hours
    }

    /// Generate a signed token for `user`
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            aud: JWT_AUDIENCE.to_owned(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an `AUTH_*` error describing why the token was rejected.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        self.validate_token_detailed(token).map_err(AppError::from)
    }

    /// Validate a token with detailed error information
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the token is malformed, badly
    /// signed, meant for another audience or expired.
    pub fn validate_token_detailed(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_audience(&[JWT_AUDIENCE]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| convert_jwt_error(&e))?;

        Self::check_token_expiry(&claims, Utc::now())?;
        debug!(user.id = %claims.sub, "JWT validated");
        Ok(claims)
    }

    fn check_token_expiry(
        claims: &Claims,
        current_time: DateTime<Utc>,
    ) -> Result<(), JwtValidationError> {
        if current_time.timestamp() > claims.exp {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(current_time);
            warn!(
                user.id = %claims.sub,
                expired_at = %expired_at.to_rfc3339(),
                "JWT token expired"
            );
            return Err(JwtValidationError::TokenExpired {
                expired_at,
                current_time,
            });
        }
        Ok(())
    }
}

fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
    use jsonwebtoken::errors::ErrorKind;
    warn!("JWT token validation failed: {e:?}");

    match e.kind() {
        ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
            reason: "Token signature verification failed".into(),
        },
        ErrorKind::InvalidAudience => JwtValidationError::TokenInvalid {
            reason: "Token was issued for another audience".into(),
        },
        ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
            details: "Token format is invalid".into(),
        },
        ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
            details: format!("Token contains invalid base64: {base64_err}"),
        },
        ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
            details: format!("Token contains invalid JSON: {json_err}"),
        },
        ErrorKind::Utf8(utf8_err) => JwtValidationError::TokenMalformed {
            details: format!("Token contains invalid UTF-8: {utf8_err}"),
        },
        _ => JwtValidationError::TokenInvalid {
            reason: format!("Token validation failed: {e}"),
        },
    }
}

/// Hash a password with bcrypt on the blocking pool
///
/// # Errors
///
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a bcrypt hash on the blocking pool
///
/// # Errors
///
/// Returns an error if the hash is unreadable or the blocking task panics.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::UserRole;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Mei Lin".into(),
            username: "meilin".into(),
            age: 29,
            gender: "female".into(),
            contact_no: "+6591234567".into(),
            avatar_url: "https://example.com/a.png".into(),
            role: UserRole::User,
            has_2fa_enabled: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip_carries_profile_claims() {
        let manager = AuthManager::new(b"test-secret", 1);
        let user = sample_user();

        let token = manager.generate_token(&user).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "meilin");
        assert_eq!(claims.aud, JWT_AUDIENCE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let issuer = AuthManager::new(b"secret-a", 1);
        let verifier = AuthManager::new(b"secret-b", 1);
        let token = issuer.generate_token(&sample_user()).unwrap();

        let result = verifier.validate_token_detailed(&token);
        assert!(matches!(result, Err(JwtValidationError::TokenInvalid { .. })));
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let manager = AuthManager::new(b"test-secret", -2);
        let token = manager.generate_token(&sample_user()).unwrap();

        let error = manager.validate_token(&token).unwrap_err();
        assert_eq!(error.code, ErrorCode::AuthExpired);
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let manager = AuthManager::new(b"test-secret", 1);
        let error = manager.validate_token("not-a-jwt").unwrap_err();
        assert_eq!(error.code, ErrorCode::AuthMalformed);
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse".into()).await.unwrap();
        assert!(verify_password("correct horse".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".into(), hash).await.unwrap());
    }
}
