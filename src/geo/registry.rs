// ABOUTME: Ordered registry of named planning-area boundaries
// ABOUTME: First-match lookup with a bounding-box prefilter and name search
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use ::geo::{Contains, Point, Rect};

use super::boundary::{Boundary, Coordinate};

/// One named area with its precomputed bounding rectangle
#[derive(Debug, Clone)]
pub struct AreaEntry {
    name: String,
    boundary: Boundary,
    bbox: Option<Rect<f64>>,
}

impl AreaEntry {
    /// Create an entry, computing its bounding rectangle
    pub fn new(name: impl Into<String>, boundary: Boundary) -> Self {
        let bbox = boundary.bounding_rect();
        Self {
            name: name.into(),
            boundary,
            bbox,
        }
    }

    /// Area name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Area boundary
    #[must_use]
    pub const fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Whether the area contains `point`
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        // Nothing on the rectangle's edge is strictly inside the area
        self.bbox
            .is_some_and(|rect| rect.contains(&Point::from(point)))
            && self.boundary.contains(point)
    }
}

/// Planning areas in registration order
///
/// When boundaries overlap, the area registered first wins.
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
    entries: Vec<AreaEntry>,
}

impl AreaRegistry {
    /// Build a registry from `(name, boundary)` pairs, keeping their order
    pub fn from_areas<I, S>(areas: I) -> Self
    where
        I: IntoIterator<Item = (S, Boundary)>,
        S: Into<String>,
    {
        Self {
            entries: areas
                .into_iter()
                .map(|(name, boundary)| AreaEntry::new(name, boundary))
                .collect(),
        }
    }

    /// Append an area after all existing ones
    pub fn push(&mut self, name: impl Into<String>, boundary: Boundary) {
        self.entries.push(AreaEntry::new(name, boundary));
    }

    /// Name of the first area containing `point`
    #[must_use]
    pub fn find_area_name(&self, point: Coordinate) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.contains(point))
            .map(AreaEntry::name)
    }

    /// Area names containing `query`, compared case-insensitively
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&str> {
        let needle = query.trim().to_lowercase();
        self.entries
            .iter()
            .map(AreaEntry::name)
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect()
    }

    /// All area names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(AreaEntry::name)
    }

    /// Registered entries
    #[must_use]
    pub fn entries(&self) -> &[AreaEntry] {
        &self.entries
    }

    /// Number of registered areas
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no areas are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Boundary {
        Boundary::from_pairs(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    #[test]
    fn test_first_registered_area_wins_on_overlap() {
        let registry =
            AreaRegistry::from_areas([("OUTER", square(0.0, 0.0, 4.0)), ("INNER", square(1.0, 1.0, 1.0))]);

        assert_eq!(registry.find_area_name(Coordinate::new(1.5, 1.5)), Some("OUTER"));
    }

    #[test]
    fn test_no_match_is_none() {
        let registry = AreaRegistry::from_areas([("A", square(0.0, 0.0, 1.0))]);
        assert_eq!(registry.find_area_name(Coordinate::new(50.0, 50.0)), None);
        assert_eq!(registry.find_area_name(Coordinate::new(0.5, 95.0)), None);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let registry = AreaRegistry::from_areas([
            ("ANG MO KIO", square(0.0, 0.0, 1.0)),
            ("BUKIT MERAH", square(2.0, 0.0, 1.0)),
            ("BUKIT TIMAH", square(4.0, 0.0, 1.0)),
        ]);

        assert_eq!(registry.search("bukit"), vec!["BUKIT MERAH", "BUKIT TIMAH"]);
        assert!(registry.search("tampines").is_empty());
        assert_eq!(registry.len(), 3);
    }
}
