// ABOUTME: System-wide constants for the Pawboard forum API
// ABOUTME: Upload limits, query defaults, token parameters and service identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! # Constants Module
//!
//! Hardcoded limits and identifiers grouped by domain.

/// Service identity
pub mod service {
    /// Service name reported by the root and health endpoints
    pub const SERVICE_NAME: &str = "pawboard";

    /// Crate version
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// JWT issuance parameters
pub mod tokens {
    /// Audience claim for every token issued by this server
    pub const JWT_AUDIENCE: &str = "pawboard-api";

    /// Default token lifetime in hours
    pub const DEFAULT_EXPIRY_HOURS: i64 = 1;
}

/// Account rules
pub mod accounts {
    /// bcrypt work factor used for password hashes
    pub const BCRYPT_COST: u32 = 10;

    /// Minimum username length
    pub const MIN_USERNAME_LEN: usize = 3;

    /// Minimum password length
    pub const MIN_PASSWORD_LEN: usize = 8;

    /// Length of SMS one-time codes
    pub const VERIFICATION_CODE_LEN: usize = 6;
}

/// Upload limits
pub mod uploads {
    /// Largest accepted avatar image (2 MiB)
    pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

    /// Largest accepted post image (5 MiB)
    pub const MAX_POST_IMAGE_BYTES: usize = 5 * 1024 * 1024;

    /// Maximum number of images per upload request
    pub const MAX_POST_IMAGES: usize = 5;

    /// Request body limit for multipart routes, sized for a full post image batch
    pub const MULTIPART_BODY_LIMIT: usize = MAX_POST_IMAGES * MAX_POST_IMAGE_BYTES + 64 * 1024;

    /// Bucket holding user avatars
    pub const AVATAR_BUCKET: &str = "userAvatars";

    /// Bucket holding forum post images
    pub const POST_IMAGE_BUCKET: &str = "postImages";

    /// Key prefix for post images inside their bucket
    pub const POST_IMAGE_PREFIX: &str = "post-images";
}

/// Forum query defaults
pub mod forum {
    /// Posts returned when no limit is given
    pub const DEFAULT_POST_LIMIT: i64 = 50;

    /// Upper bound on the post list limit
    pub const MAX_POST_LIMIT: i64 = 100;

    /// Number of items on the adoption checklist
    pub const CHECKLIST_ITEM_COUNT: i64 = 6;
}

/// Planning-area data defaults
pub mod areas {
    /// Public OneMap host
    pub const ONEMAP_BASE_URL: &str = "https://www.onemap.gov.sg";

    /// Planning-area listing endpoint, relative to the base URL
    pub const ONEMAP_PLANNING_AREA_PATH: &str = "/api/public/popapi/getAllPlanningarea";

    /// Credential exchange endpoint, relative to the base URL
    pub const ONEMAP_TOKEN_PATH: &str = "/api/auth/post/getToken";

    /// Offline snapshot used when no OneMap credential is configured
    pub const DEFAULT_BOUNDARY_FILE: &str = "./MasterPlan2019PlanningAreaBoundaryNoSea.geojson";

    /// Load attempts before giving up on the registry
    pub const DEFAULT_LOAD_ATTEMPTS: u32 = 3;

    /// Delay before the first retry; doubled on each further attempt
    pub const RETRY_BASE_DELAY_MS: u64 = 250;
}
