// ABOUTME: Area data source abstraction plus file-backed and in-memory implementations
// ABOUTME: The OneMap network source lives in external::onemap and implements the same trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::geojson::parse_feature_collection;
use super::registry::AreaRegistry;
use crate::errors::{AppError, AppResult};

/// Producer of the full planning-area registry
#[async_trait]
pub trait AreaDataSource: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// Fetch every planning area
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be read or contains invalid geometry.
    async fn fetch(&self) -> AppResult<AreaRegistry>;
}

/// Reads a GeoJSON feature collection from local storage
#[derive(Debug, Clone)]
pub struct GeoJsonFileSource {
    path: PathBuf,
}

impl GeoJsonFileSource {
    /// Source reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File being read
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AreaDataSource for GeoJsonFileSource {
    fn name(&self) -> &'static str {
        "geojson-file"
    }

    async fn fetch(&self) -> AppResult<AreaRegistry> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to read boundary file {}: {e}",
                self.path.display()
            ))
            .with_source(e)
        })?;
        let registry = parse_feature_collection(&text)?;
        debug!(
            path = %self.path.display(),
            areas = registry.len(),
            "Parsed planning-area boundary file"
        );
        Ok(registry)
    }
}

/// Serves a registry that is already in memory
#[derive(Debug, Clone, Default)]
pub struct StaticAreaSource {
    registry: AreaRegistry,
}

impl StaticAreaSource {
    /// Source that always yields `registry`
    #[must_use]
    pub const fn new(registry: AreaRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl AreaDataSource for StaticAreaSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self) -> AppResult<AreaRegistry> {
        Ok(self.registry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::geo::boundary::Coordinate;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reads_feature_collection() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature",
                "properties":{{"Description":"<table><tr><th>PLN_AREA_N</th><td>QUEENSTOWN</td></tr></table>"}},
                "geometry":{{"type":"Polygon","coordinates":[[[103.7,1.2],[103.9,1.2],[103.9,1.4],[103.7,1.4],[103.7,1.2]]]}}}}]}}"#
        )
        .unwrap();

        let registry = GeoJsonFileSource::new(file.path()).fetch().await.unwrap();

        assert_eq!(
            registry.find_area_name(Coordinate::new(103.8, 1.3)),
            Some("QUEENSTOWN")
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_storage_error() {
        let error = GeoJsonFileSource::new("/nonexistent/boundaries.geojson")
            .fetch()
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::StorageError);
    }
}
