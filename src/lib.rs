#![doc = include_str!("../README.md")]

pub mod access;
#[cfg(feature = "client")]
pub mod client;
pub mod entitlements;
pub mod error;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use access::{AccessResult, DenialReason, check_action, check_limit};
#[cfg(feature = "client")]
pub use client::{ApiConfig, SessionClient};
pub use entitlements::{
    Remaining, UsageSummary, can_perform_action, feature_upgrade_message, has_reached_limit,
    is_feature_available, remaining_usage, usage,
};
pub use error::Error;
pub use session::{FeatureEntitlement, LimitEntitlement, Permissions, User};
pub use types::{FeatureKey, LimitKey, Plan, UserId};
