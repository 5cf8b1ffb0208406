//! Access decisions with a reason attached.
//!
//! [`check_action`] answers the same question as
//! [`can_perform_action`](crate::entitlements::can_perform_action), but
//! returns why access was denied so callers can pick the right banner.

use serde::Serialize;

use crate::entitlements;
use crate::session::User;
use crate::types::{FeatureKey, LimitKey};

/// Result of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum AccessResult {
    Allowed,
    Denied { reason: DenialReason },
}

impl AccessResult {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Converts to a `Result`, with a denial becoming the error.
    ///
    /// # Errors
    ///
    /// Returns the [`DenialReason`] if access was denied.
    pub fn into_result(self) -> Result<(), DenialReason> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied { reason } => Err(reason),
        }
    }
}

/// Why an action is not available to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DenialReason {
    /// No authenticated session.
    #[error("Not signed in")]
    NoSession,

    /// The plan does not include the feature.
    #[error("Feature not available: {feature}")]
    #[serde(rename_all = "camelCase")]
    FeatureUnavailable {
        feature: FeatureKey,
        upgrade_message: Option<String>,
    },

    /// The quota for the resource is used up, or the resource is not
    /// included in the plan at all.
    #[error("Limit reached for {limit}")]
    LimitReached {
        limit: LimitKey,
        current: u64,
        max: u64,
    },

    /// The server sent no usage data for the resource.
    #[error("No usage data for {limit}")]
    LimitUnknown { limit: LimitKey },
}

/// Checks `feature`, then `limit` if given, against the snapshot.
#[must_use]
pub fn check_action(
    user: Option<&User>,
    feature: FeatureKey,
    limit: Option<LimitKey>,
) -> AccessResult {
    let Some(snapshot) = user else {
        return denied(DenialReason::NoSession);
    };

    if !entitlements::is_feature_available(user, feature) {
        return denied(DenialReason::FeatureUnavailable {
            feature,
            upgrade_message: entitlements::feature_upgrade_message(user, feature)
                .map(str::to_owned),
        });
    }

    match limit {
        Some(key) => check_limit_of(snapshot, key),
        None => AccessResult::Allowed,
    }
}

/// Checks only the quota for `limit`.
#[must_use]
pub fn check_limit(user: Option<&User>, limit: LimitKey) -> AccessResult {
    match user {
        Some(snapshot) => check_limit_of(snapshot, limit),
        None => denied(DenialReason::NoSession),
    }
}

fn check_limit_of(user: &User, limit: LimitKey) -> AccessResult {
    if !entitlements::has_reached_limit(Some(user), limit) {
        return AccessResult::Allowed;
    }
    match user.limit(limit) {
        Some(entry) => denied(DenialReason::LimitReached {
            limit,
            current: entry.current,
            max: entry.max,
        }),
        None => denied(DenialReason::LimitUnknown { limit }),
    }
}

fn denied(reason: DenialReason) -> AccessResult {
    tracing::debug!(reason = %reason, "Access denied");
    AccessResult::Denied { reason }
}
