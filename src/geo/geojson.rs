// ABOUTME: GeoJSON geometry and feature-collection parsing into named boundaries
// ABOUTME: Extracts planning-area names from the HTML description table cells
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! GeoJSON decoding.
//!
//! Only `Polygon` and `MultiPolygon` geometries are accepted. Any other type
//! fails with [`ErrorCode::InvalidFormat`](crate::errors::ErrorCode::InvalidFormat)
//! and aborts the whole load. Positions may carry a third (altitude) value,
//! which is ignored.

use std::sync::OnceLock;

use ::geo::{MultiPolygon, Polygon};
use regex::Regex;
use serde::Deserialize;

use super::boundary::{polygon_from_rings, Boundary, Coordinate, Ring};
use super::registry::AreaRegistry;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    geometry: RawGeometry,
}

#[derive(Debug, Deserialize)]
struct RawFeatureCollection {
    features: Vec<RawFeature>,
}

/// Parse a GeoJSON geometry object
///
/// # Errors
///
/// Returns an error if the geometry type is not `Polygon`/`MultiPolygon` or
/// the coordinates do not have the expected nesting.
pub fn parse_geometry(value: serde_json::Value) -> AppResult<Boundary> {
    let raw: RawGeometry = serde_json::from_value(value)
        .map_err(|e| AppError::invalid_format(format!("Invalid geometry object: {e}")))?;
    geometry_to_boundary(raw)
}

/// Parse a geometry serialized as a JSON string
///
/// # Errors
///
/// Returns an error if the text is not JSON or the geometry is rejected by
/// [`parse_geometry`].
pub fn parse_geometry_str(text: &str) -> AppResult<Boundary> {
    let raw: RawGeometry = serde_json::from_str(text)
        .map_err(|e| AppError::invalid_format(format!("Invalid geometry JSON: {e}")))?;
    geometry_to_boundary(raw)
}

fn geometry_to_boundary(raw: RawGeometry) -> AppResult<Boundary> {
    match raw.kind.as_str() {
        "Polygon" => {
            let rings: Vec<Vec<Vec<f64>>> = decode_coordinates(raw.coordinates)?;
            Ok(Boundary::Polygon(to_polygon(rings)?))
        }
        "MultiPolygon" => {
            let parts: Vec<Vec<Vec<Vec<f64>>>> = decode_coordinates(raw.coordinates)?;
            let polygons = parts
                .into_iter()
                .map(to_polygon)
                .collect::<AppResult<Vec<_>>>()?;
            Ok(Boundary::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => Err(AppError::invalid_format(format!(
            "Unknown feature type: {other}"
        ))),
    }
}

fn decode_coordinates<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::invalid_format(format!("Invalid coordinates: {e}")))
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> AppResult<Polygon<f64>> {
    rings
        .into_iter()
        .map(|ring| ring.iter().map(|p| to_coordinate(p)).collect::<AppResult<Ring>>())
        .collect::<AppResult<Vec<_>>>()
        .map(polygon_from_rings)
}

fn to_coordinate(position: &[f64]) -> AppResult<Coordinate> {
    match position {
        [lng, lat, ..] => Ok(Coordinate::new(*lng, *lat)),
        _ => Err(AppError::invalid_format(
            "Position must have at least two values",
        )),
    }
}

fn area_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"<td>([^<]*)</td>").ok())
        .as_ref()
}

/// Pull the area name out of a feature description
///
/// The Master Plan snapshot stores attributes as an HTML table; the first
/// table cell holds the planning-area name.
#[must_use]
pub fn extract_area_name(description: &str) -> Option<String> {
    area_name_pattern()?
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|name| !name.is_empty())
}

/// Parse a planning-area feature collection into a registry
///
/// # Errors
///
/// Returns an error if the document is not a feature collection, a feature has
/// no recognizable name, or any geometry is rejected.
pub fn parse_feature_collection(text: &str) -> AppResult<AreaRegistry> {
    let collection: RawFeatureCollection = serde_json::from_str(text)
        .map_err(|e| AppError::invalid_format(format!("Invalid feature collection: {e}")))?;

    let mut registry = AreaRegistry::default();
    for (index, feature) in collection.features.into_iter().enumerate() {
        let name = feature_name(&feature.properties).ok_or_else(|| {
            AppError::invalid_format(format!("Feature {index} has no planning-area name"))
        })?;
        registry.push(name, geometry_to_boundary(feature.geometry)?);
    }
    Ok(registry)
}

fn feature_name(properties: &serde_json::Map<String, serde_json::Value>) -> Option<String> {
    if let Some(description) = properties.get("Description").and_then(|v| v.as_str()) {
        return extract_area_name(description);
    }
    properties
        .get("PLN_AREA_N")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_area_name_from_description() {
        let description = "<center><table><tr><th>PLN_AREA_N</th><td>BEDOK</td></tr>\
                           <tr><th>PLN_AREA_C</th><td>BD</td></tr></table></center>";
        assert_eq!(extract_area_name(description), Some("BEDOK".to_owned()));
        assert_eq!(extract_area_name("<p>no cells</p>"), None);
    }

    #[test]
    fn test_polygon_with_altitude() {
        let boundary = parse_geometry(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]]
        }))
        .unwrap();

        assert!(boundary.contains(Coordinate::new(0.5, 0.5)));
    }

    #[test]
    fn test_multipolygon_from_string() {
        let text = r#"{"type":"MultiPolygon","coordinates":[
            [[[0,0],[1,0],[1,1],[0,1],[0,0]]],
            [[[10,10],[11,10],[11,11],[10,11],[10,10]]]
        ]}"#;
        let boundary = parse_geometry_str(text).unwrap();

        assert!(matches!(boundary, Boundary::MultiPolygon(ref parts) if parts.0.len() == 2));
        assert!(boundary.contains(Coordinate::new(10.5, 10.5)));
    }

    #[test]
    fn test_unknown_geometry_type_is_rejected() {
        let error = parse_geometry(json!({"type": "Point", "coordinates": [1.0, 2.0]})).unwrap_err();
        assert_eq!(error.code, crate::errors::ErrorCode::InvalidFormat);
        assert!(error.message.contains("Unknown feature type"));
    }

    #[test]
    fn test_short_position_is_rejected() {
        let result = parse_geometry(json!({"type": "Polygon", "coordinates": [[[0.0], [1.0, 1.0]]]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_feature_collection_aborts_on_bad_feature() {
        let text = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"Description": "<td>ALPHA</td>"},
                    "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"Description": "<td>BETA</td>"},
                    "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}
                }
            ]
        })
        .to_string();

        assert!(parse_feature_collection(&text).is_err());
    }
}
