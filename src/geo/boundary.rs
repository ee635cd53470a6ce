// ABOUTME: Coordinates and the Boundary sum type over geo polygons
// ABOUTME: Strict containment via geo::Contains; points on an edge or vertex are outside
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! Geometry primitives for planning-area lookups.
//!
//! Boundaries are stored as [`geo`] polygons. Containment is strict: a point
//! inside a hole is outside the polygon, and a point lying on an edge or a
//! vertex of any ring is never contained. `geo` decides edge membership with
//! robust orientation predicates, so the rule holds for slanted edges as well
//! as axis-aligned ones.

use ::geo::{BoundingRect, Contains, Coord, LineString, MultiPolygon, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude (x)
    pub lng: f64,
    /// Latitude (y)
    pub lat: f64,
}

impl Coordinate {
    /// Create a coordinate from longitude and latitude
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Whether both components are finite numbers
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Self { x: c.lng, y: c.lat }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Self::new(c.lng, c.lat)
    }
}

/// Sequence of vertices; the closing vertex may be omitted
pub type Ring = Vec<Coordinate>;

/// Build a polygon from rings: the first is the outer boundary, the rest are holes
///
/// Open rings are closed. No rings yields an empty polygon that contains nothing.
#[must_use]
pub fn polygon_from_rings(rings: Vec<Ring>) -> Polygon<f64> {
    let mut rings = rings.into_iter().map(to_line_string);
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

fn to_line_string(ring: Ring) -> LineString<f64> {
    LineString::new(ring.into_iter().map(Coord::from).collect())
}

/// Region covered by a named area
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Single polygon, possibly with holes
    Polygon(Polygon<f64>),
    /// Union of disjoint polygon parts
    MultiPolygon(MultiPolygon<f64>),
}

impl Boundary {
    /// Single-ring polygon boundary from `(lng, lat)` pairs
    #[must_use]
    pub fn from_pairs(points: &[(f64, f64)]) -> Self {
        Self::Polygon(polygon_from_rings(vec![points
            .iter()
            .map(|&(lng, lat)| Coordinate::new(lng, lat))
            .collect()]))
    }

    /// Whether `point` lies strictly inside this boundary
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        let point = Point::from(point);
        match self {
            Self::Polygon(polygon) => polygon.contains(&point),
            Self::MultiPolygon(parts) => parts.contains(&point),
        }
    }

    /// Bounding rectangle over all parts; `None` for an empty boundary
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Self::Polygon(polygon) => polygon.bounding_rect(),
            Self::MultiPolygon(parts) => parts.bounding_rect(),
        }
    }
}
