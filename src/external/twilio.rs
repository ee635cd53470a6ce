// ABOUTME: SMS one-time-code verification abstraction and Twilio Verify client
// ABOUTME: Sends login codes and checks submitted codes for two-factor accounts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! SMS Verification
//!
//! Accounts with two-factor authentication receive a six digit code by SMS
//! after a correct password. [`VerificationService`] hides the provider;
//! [`TwilioVerifyClient`] talks to the Twilio Verify v2 API and
//! [`DisabledVerification`] is used when no provider is configured.
//!
//! # API Reference
//! Twilio Verify: <https://www.twilio.com/docs/verify/api>

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::utils::http_client::shared_client;

const SERVICE: &str = "Twilio Verify";
const TWILIO_VERIFY_BASE_URL: &str = "https://verify.twilio.com/v2";

/// Outcome of checking a submitted code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Code matched
    Approved,
    /// Code did not match yet
    Pending,
    /// Any other provider status (expired, canceled, ...)
    Other(String),
}

impl VerificationStatus {
    /// Map a provider status string
    #[must_use]
    pub fn from_provider(status: &str) -> Self {
        match status {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Whether the code was accepted
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Phone number with the spaces users type removed
#[must_use]
pub fn normalize_phone_number(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Provider of SMS one-time codes
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Send a fresh code to `to`
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the request.
    async fn send_code(&self, to: &str) -> AppResult<()>;

    /// Check `code` against the last code sent to `to`
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached.
    async fn check_code(&self, to: &str, code: &str) -> AppResult<VerificationStatus>;
}

/// Twilio Verify credentials
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Account SID
    pub account_sid: String,
    /// Auth token
    pub auth_token: String,
    /// Verify service SID
    pub verify_service_sid: String,
    /// API base URL
    pub base_url: String,
}

impl TwilioConfig {
    /// Credentials against the public Twilio host
    #[must_use]
    pub fn new(account_sid: String, auth_token: String, verify_service_sid: String) -> Self {
        Self {
            account_sid,
            auth_token,
            verify_service_sid,
            base_url: TWILIO_VERIFY_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    status: String,
}

/// Twilio Verify v2 client
pub struct TwilioVerifyClient {
    config: TwilioConfig,
    http_client: Client,
}

impl TwilioVerifyClient {
    /// Create a client using the shared HTTP client
    #[must_use]
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            http_client: shared_client().clone(),
        }
    }

    async fn post_form(&self, resource: &str, form: &[(&str, &str)]) -> AppResult<VerificationResponse> {
        let url = format!(
            "{}/Services/{}/{resource}",
            self.config.base_url, self.config.verify_service_sid
        );
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::external_auth_failed(SERVICE, "credentials were rejected"));
        }
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE,
                format!(
                    "HTTP {status}: {}",
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("JSON parse error: {e}")))
    }
}

#[async_trait]
impl VerificationService for TwilioVerifyClient {
    async fn send_code(&self, to: &str) -> AppResult<()> {
        let to = normalize_phone_number(to);
        let response = self
            .post_form("Verifications", &[("To", to.as_str()), ("Channel", "sms")])
            .await?;
        debug!(status = %response.status, "Verification code requested");
        Ok(())
    }

    async fn check_code(&self, to: &str, code: &str) -> AppResult<VerificationStatus> {
        let to = normalize_phone_number(to);
        let response = self
            .post_form("VerificationCheck", &[("To", to.as_str()), ("Code", code)])
            .await?;
        Ok(VerificationStatus::from_provider(&response.status))
    }
}

/// Used when no SMS provider is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVerification;

#[async_trait]
impl VerificationService for DisabledVerification {
    async fn send_code(&self, _to: &str) -> AppResult<()> {
        Err(AppError::config(
            "Two-factor login requires SMS verification, which is not configured",
        ))
    }

    async fn check_code(&self, _to: &str, _code: &str) -> AppResult<VerificationStatus> {
        Err(AppError::config(
            "Two-factor login requires SMS verification, which is not configured",
        ))
    }
}
