// ABOUTME: Object storage abstraction for avatars and forum post images
// ABOUTME: Local filesystem backend whose files are served read-only under /storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Object Storage
//!
//! Uploaded images are written into named buckets. The [`ObjectStore`] trait
//! keeps the upload routes independent of where the bytes end up;
//! [`LocalObjectStore`] keeps them on disk below a root directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// Bucketed storage for uploaded files
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `bucket/key`, returning its public URL
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    async fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str)
        -> AppResult<String>;

    /// Delete objects, returning how many existed
    ///
    /// # Errors
    ///
    /// Returns an error if a key is invalid or a delete fails.
    async fn remove(&self, bucket: &str, keys: &[String]) -> AppResult<usize>;
}

/// Filesystem-backed object store
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// Store rooted at `root`, with URLs built from `public_base_url`
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let safe = !bucket.is_empty()
            && !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::invalid_input(format!(
                "Invalid storage key: {bucket}/{key}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<String> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::storage(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write {bucket}/{key}: {e}")))?;

        debug!(bucket, key, content_type, bytes = data.len(), "Stored object");
        Ok(format!("{}/{bucket}/{key}", self.public_base_url))
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> AppResult<usize> {
        let mut removed = 0;
        for key in keys {
            let path = self.object_path(bucket, key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::storage(format!(
                        "Failed to delete {bucket}/{key}: {e}"
                    )))
                }
            }
        }
        Ok(removed)
    }
}

/// Reduce an uploaded file name to characters safe in a storage key
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_owned()
    } else {
        trimmed.to_owned()
    }
}
