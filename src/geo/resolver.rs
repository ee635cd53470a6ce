// ABOUTME: Area resolver that loads the planning-area registry once and answers point lookups
// ABOUTME: Concurrent callers share one in-flight load; failed loads are retried with backoff
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Area Resolver
//!
//! [`AreaResolver`] is constructed once at startup and shared through
//! `ServerResources`. The registry is loaded on first use (or eagerly via
//! [`AreaResolver::preload`]):
//!
//! - every caller that arrives while a load is running awaits that same load,
//!   so a successful load fetches from the data source exactly once
//! - the load runs on its own task and keeps going if the callers go away
//! - inside a load, transient source failures are retried with exponential
//!   backoff up to [`RetryPolicy::max_attempts`]
//! - a failed load is reported to everyone who awaited it and is not cached;
//!   the next call starts a fresh load
//! - once loaded, the registry is never replaced

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::json;
use tracing::{error, info, warn};

use super::boundary::Coordinate;
use super::registry::AreaRegistry;
use super::source::{AreaDataSource, StaticAreaSource};
use crate::constants::areas::{DEFAULT_LOAD_ATTEMPTS, RETRY_BASE_DELAY_MS};
use crate::errors::{AppError, AppResult, ErrorCode};

/// Bounded retry with exponential backoff for registry loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per load, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each one after
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the given attempt count and base delay
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Single attempt, no retries
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_LOAD_ATTEMPTS,
            Duration::from_millis(RETRY_BASE_DELAY_MS),
        )
    }
}

#[derive(Debug, Clone)]
struct LoadFailure {
    code: ErrorCode,
    message: String,
}

impl LoadFailure {
    fn into_app_error(self) -> AppError {
        AppError::unavailable(format!("Planning-area data is unavailable: {}", self.message))
            .with_details(json!({ "cause": self.code }))
    }
}

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<AreaRegistry>, LoadFailure>>>;

enum LoadState {
    Idle,
    Loading { generation: u64, load: SharedLoad },
    Ready(Arc<AreaRegistry>),
}

struct Inner {
    state: LoadState,
    generation: u64,
}

/// Resolves coordinates to planning-area names
pub struct AreaResolver {
    source: Arc<dyn AreaDataSource>,
    retry: RetryPolicy,
    inner: Mutex<Inner>,
}

impl AreaResolver {
    /// Resolver backed by `source` with the default retry policy
    #[must_use]
    pub fn new(source: Arc<dyn AreaDataSource>) -> Self {
        Self {
            source,
            retry: RetryPolicy::default(),
            inner: Mutex::new(Inner {
                state: LoadState::Idle,
                generation: 0,
            }),
        }
    }

    /// Resolver over a fixed, already-built registry
    #[must_use]
    pub fn from_registry(registry: AreaRegistry) -> Self {
        Self::new(Arc::new(StaticAreaSource::new(registry)))
    }

    /// Replace the retry policy
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Label of the configured data source
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Whether the registry has been loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(inner.state, LoadState::Ready(_))
    }

    /// Loaded registry, starting or joining a load when necessary
    ///
    /// # Errors
    ///
    /// Returns a `RESOURCE_UNAVAILABLE` error if the load failed after all
    /// retry attempts.
    pub async fn registry(&self) -> AppResult<Arc<AreaRegistry>> {
        let (generation, load) = {
            let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let inner = &mut *guard;
            match &inner.state {
                LoadState::Ready(registry) => return Ok(Arc::clone(registry)),
                LoadState::Loading { generation, load } => (*generation, load.clone()),
                LoadState::Idle => {
                    inner.generation += 1;
                    let load = self.start_load();
                    inner.state = LoadState::Loading {
                        generation: inner.generation,
                        load: load.clone(),
                    };
                    (inner.generation, load)
                }
            }
        };

        let outcome = load.await;

        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let current = matches!(
            guard.state,
            LoadState::Loading { generation: g, .. } if g == generation
        );
        match outcome {
            Ok(registry) => {
                if current {
                    guard.state = LoadState::Ready(Arc::clone(&registry));
                }
                Ok(registry)
            }
            Err(failure) => {
                if current {
                    guard.state = LoadState::Idle;
                }
                Err(failure.into_app_error())
            }
        }
    }

    fn start_load(&self) -> SharedLoad {
        let source = Arc::clone(&self.source);
        let retry = self.retry;
        let task = tokio::spawn(load_with_retry(source, retry));

        async move {
            task.await.unwrap_or_else(|join_error| {
                Err(LoadFailure {
                    code: ErrorCode::InternalError,
                    message: format!("area load task failed: {join_error}"),
                })
            })
        }
        .boxed()
        .shared()
    }

    /// Load the registry now rather than on the first lookup
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be loaded.
    pub async fn preload(&self) -> AppResult<usize> {
        Ok(self.registry().await?.len())
    }

    /// Name of the first registered area containing `point`
    ///
    /// A point outside every area is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be loaded.
    pub async fn resolve(&self, point: Coordinate) -> AppResult<Option<String>> {
        let registry = self.registry().await?;
        Ok(registry.find_area_name(point).map(str::to_owned))
    }

    /// Area names matching `query` case-insensitively
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be loaded.
    pub async fn search(&self, query: &str) -> AppResult<Vec<String>> {
        let registry = self.registry().await?;
        Ok(registry
            .search(query)
            .into_iter()
            .map(str::to_owned)
            .collect())
    }

    /// Every area name in registration order
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be loaded.
    pub async fn area_names(&self) -> AppResult<Vec<String>> {
        let registry = self.registry().await?;
        Ok(registry.names().map(str::to_owned).collect())
    }
}

const fn is_retryable(code: ErrorCode) -> bool {
    matches!(
        code,
        ErrorCode::ExternalServiceError
            | ErrorCode::ExternalServiceUnavailable
            | ErrorCode::StorageError
            | ErrorCode::InternalError
    )
}

async fn load_with_retry(
    source: Arc<dyn AreaDataSource>,
    retry: RetryPolicy,
) -> Result<Arc<AreaRegistry>, LoadFailure> {
    let started = Instant::now();
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match source.fetch().await {
            Ok(registry) => {
                info!(
                    source = source.name(),
                    areas = registry.len(),
                    attempt,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Planning-area registry loaded"
                );
                return Ok(Arc::new(registry));
            }
            Err(err) if attempt < max_attempts && is_retryable(err.code) => {
                let delay = retry.delay_for(attempt);
                warn!(
                    source = source.name(),
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "Planning-area load failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    source = source.name(),
                    attempt,
                    error = %err,
                    "Planning-area load failed"
                );
                return Err(LoadFailure {
                    code: err.code,
                    message: err.message,
                });
            }
        }
    }
}
