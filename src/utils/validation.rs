// ABOUTME: Request field validation that collects every issue before failing
// ABOUTME: Produces a single 400 AppError carrying the structured issue list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

use uuid::Uuid;

use crate::errors::{AppError, AppResult, ValidationIssue};

/// Accumulates validation issues for one request body
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    /// Start an empty validation pass
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue when `condition` is false
    pub fn check(&mut self, condition: bool, path: &str, message: &str) -> &mut Self {
        if !condition {
            self.issues.push(ValidationIssue::new(path, message));
        }
        self
    }

    /// Require a string that is not blank
    pub fn required(&mut self, path: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), path, "is required")
    }

    /// Require at least `min` characters
    pub fn min_len(&mut self, path: &str, value: &str, min: usize) -> &mut Self {
        if value.chars().count() < min {
            self.issues.push(ValidationIssue::new(
                path,
                format!("must be at least {min} characters"),
            ));
        }
        self
    }

    /// Require exactly `len` characters
    pub fn exact_len(&mut self, path: &str, value: &str, len: usize) -> &mut Self {
        if value.chars().count() != len {
            self.issues.push(ValidationIssue::new(
                path,
                format!("must be exactly {len} characters"),
            ));
        }
        self
    }

    /// Require one of the listed values
    pub fn one_of(&mut self, path: &str, value: &str, allowed: &[&str]) -> &mut Self {
        if !allowed.contains(&value) {
            self.issues.push(ValidationIssue::new(
                path,
                format!("must be one of: {}", allowed.join(", ")),
            ));
        }
        self
    }

    /// Require a value within `min..=max`
    pub fn range(&mut self, path: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if !(min..=max).contains(&value) {
            self.issues.push(ValidationIssue::new(
                path,
                format!("must be between {min} and {max}"),
            ));
        }
        self
    }

    /// Parse a UUID, recording an issue if it is malformed
    pub fn uuid(&mut self, path: &str, value: &str) -> Option<Uuid> {
        match Uuid::parse_str(value) {
            Ok(id) => Some(id),
            Err(_) => {
                self.issues.push(ValidationIssue::new(path, "must be a valid UUID"));
                None
            }
        }
    }

    /// Fail with every collected issue, or succeed when there are none
    ///
    /// # Errors
    ///
    /// Returns an `INVALID_INPUT` error listing the issues.
    pub fn finish(&mut self) -> AppResult<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(std::mem::take(&mut self.issues)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_all_issues() {
        let error = Validator::new()
            .min_len("username", "ab", 3)
            .min_len("password", "short", 8)
            .one_of("role", "admin", &["user", "shelter"])
            .finish()
            .unwrap_err();

        let issues = error.details["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[2]["path"], "role");
    }

    #[test]
    fn test_valid_input_passes() {
        let mut validator = Validator::new();
        validator.required("title", "Lost cat").range("item_index", 5, 0, 5);
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn test_uuid_parsing() {
        let mut validator = Validator::new();
        assert!(validator.uuid("user_id", "not-a-uuid").is_none());
        assert!(validator.finish().is_err());
    }
}
