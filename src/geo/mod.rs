// ABOUTME: Geospatial area resolution for mapping coordinates to planning areas
// ABOUTME: Geometry primitives, GeoJSON decoding, the area registry and its loader
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Planning-Area Resolution
//!
//! Maps a longitude/latitude pair to the named planning area containing it.
//! Forum posts and the community lookup use the area name to find the
//! community that covers a location.

/// Coordinates and boundary containment over `geo` polygons
pub mod boundary;
/// GeoJSON decoding into boundaries
pub mod geojson;
/// Ordered collection of named boundaries
pub mod registry;
/// Memoized registry loading and coordinate lookup
pub mod resolver;
/// Data source abstraction and local implementations
pub mod source;

pub use boundary::{polygon_from_rings, Boundary, Coordinate, Ring};
pub use registry::{AreaEntry, AreaRegistry};
pub use resolver::{AreaResolver, RetryPolicy};
pub use source::{AreaDataSource, GeoJsonFileSource, StaticAreaSource};
