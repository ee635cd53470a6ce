// ABOUTME: External API client modules (OneMap, Twilio Verify)
// ABOUTME: Planning-area boundary data and SMS one-time-code verification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

//! External API Clients

/// OneMap planning-area client
pub mod onemap;
/// SMS verification provider
pub mod twilio;

pub use onemap::{OneMapAuth, OneMapClient, OneMapConfig};
pub use twilio::{
    normalize_phone_number, DisabledVerification, TwilioConfig, TwilioVerifyClient,
    VerificationService, VerificationStatus,
};
