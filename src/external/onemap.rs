// ABOUTME: OneMap API client for planning-area boundaries
// ABOUTME: Supports a configured token or an email/password credential exchange
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! OneMap Planning Area Client
//!
//! Fetches every planning area with its boundary from the OneMap population
//! API. Each search result carries the area name and its geometry serialized
//! as a GeoJSON string.
//!
//! # API Reference
//! OneMap API: <https://www.onemap.gov.sg/apidocs/>

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::areas::{ONEMAP_BASE_URL, ONEMAP_PLANNING_AREA_PATH, ONEMAP_TOKEN_PATH};
use crate::errors::{AppError, AppResult};
use crate::geo::geojson::parse_geometry_str;
use crate::geo::{AreaDataSource, AreaRegistry};
use crate::utils::http_client::shared_client;

const SERVICE: &str = "OneMap API";

/// How the client authenticates with OneMap
#[derive(Debug, Clone)]
pub enum OneMapAuth {
    /// Token taken directly from configuration
    Token(String),
    /// Account credentials exchanged for a token before each load
    Credentials {
        /// Account email
        email: String,
        /// Account password
        password: String,
    },
}

/// OneMap client configuration
#[derive(Debug, Clone)]
pub struct OneMapConfig {
    /// API host, without a trailing slash
    pub base_url: String,
    /// Authentication method
    pub auth: OneMapAuth,
}

impl OneMapConfig {
    /// Configuration against the public OneMap host
    #[must_use]
    pub fn new(auth: OneMapAuth) -> Self {
        Self {
            base_url: ONEMAP_BASE_URL.to_owned(),
            auth,
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PlanningAreaResponse {
    search_results: Vec<PlanningAreaRecord>,
}

#[derive(Debug, Deserialize)]
struct PlanningAreaRecord {
    pln_area_n: String,
    geojson: String,
}

/// OneMap planning-area client
pub struct OneMapClient {
    config: OneMapConfig,
    http_client: Client,
}

impl OneMapClient {
    /// Create a client using the shared HTTP client
    #[must_use]
    pub fn new(config: OneMapConfig) -> Self {
        Self::with_http_client(config, shared_client().clone())
    }

    /// Create a client with a specific HTTP client
    #[must_use]
    pub const fn with_http_client(config: OneMapConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Obtain an access token
    ///
    /// # Errors
    ///
    /// Returns an error if the credential exchange is rejected or fails.
    pub async fn access_token(&self) -> AppResult<String> {
        let (email, password) = match &self.config.auth {
            OneMapAuth::Token(token) => return Ok(token.clone()),
            OneMapAuth::Credentials { email, password } => (email, password),
        };

        let url = format!("{}{ONEMAP_TOKEN_PATH}", self.config.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&TokenRequest { email, password })
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AppError::external_auth_failed(
                SERVICE,
                "credential exchange was rejected",
            ));
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

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("JSON parse error: {e}"))
        })?;
        Ok(token.access_token)
    }

    /// Fetch every planning area
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or any geometry is malformed.
    pub async fn planning_areas(&self) -> AppResult<AreaRegistry> {
        let token = self.access_token().await?;
        let url = format!("{}{ONEMAP_PLANNING_AREA_PATH}", self.config.base_url);

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::external_auth_failed(SERVICE, "token was rejected"));
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

        let body: PlanningAreaResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("JSON parse error: {e}"))
        })?;
        debug!(records = body.search_results.len(), "Received OneMap planning areas");

        records_to_registry(body.search_results)
    }
}

fn records_to_registry(records: Vec<PlanningAreaRecord>) -> AppResult<AreaRegistry> {
    let mut registry = AreaRegistry::default();
    for record in records {
        let boundary = parse_geometry_str(&record.geojson).map_err(|e| {
            AppError::invalid_format(format!("{}: {}", record.pln_area_n, e.message))
        })?;
        registry.push(record.pln_area_n, boundary);
    }
    Ok(registry)
}

#[async_trait]
impl AreaDataSource for OneMapClient {
    fn name(&self) -> &'static str {
        "onemap"
    }

    async fn fetch(&self) -> AppResult<AreaRegistry> {
        self.planning_areas().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    #[test]
    fn test_parses_search_results() {
        let body = r#"{"SearchResults":[
            {"pln_area_n":"BEDOK","geojson":"{\"type\":\"MultiPolygon\",\"coordinates\":[[[[103.9,1.3],[104.0,1.3],[104.0,1.35],[103.9,1.35],[103.9,1.3]]]]}"},
            {"pln_area_n":"BISHAN","geojson":"{\"type\":\"Polygon\",\"coordinates\":[[[103.8,1.34],[103.86,1.34],[103.86,1.37],[103.8,1.37]]]}"}
        ]}"#;
        let response: PlanningAreaResponse = serde_json::from_str(body).unwrap();
        let registry = records_to_registry(response.search_results).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.find_area_name(Coordinate::new(103.95, 1.32)),
            Some("BEDOK")
        );
        assert_eq!(
            registry.find_area_name(Coordinate::new(103.83, 1.35)),
            Some("BISHAN")
        );
    }

    #[test]
    fn test_bad_geometry_names_the_area() {
        let records = vec![PlanningAreaRecord {
            pln_area_n: "SELETAR".to_owned(),
            geojson: r#"{"type":"Point","coordinates":[103.8,1.4]}"#.to_owned(),
        }];
        let error = records_to_registry(records).unwrap_err();
        assert!(error.message.starts_with("SELETAR"));
    }

    #[tokio::test]
    async fn test_configured_token_skips_exchange() {
        let client = OneMapClient::new(OneMapConfig::new(OneMapAuth::Token("abc".to_owned())));
        assert_eq!(client.access_token().await.unwrap(), "abc");
    }
}
