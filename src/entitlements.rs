//! Feature and usage-limit evaluation over a [`User`] snapshot.
//!
//! Every function here is pure and takes the snapshot explicitly. A missing
//! snapshot, permissions map, or entry always yields the most restrictive
//! answer: feature unavailable, limit reached, nothing remaining. The server
//! remains the authority; these answers only drive what the UI offers.

use serde::Serialize;

use crate::session::{LimitEntitlement, User};
use crate::types::{FeatureKey, LimitKey};

/// Remaining quota for a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Remaining {
    /// The plan has no cap on this resource (`max == 0`).
    Unlimited,
    Limited(u64),
}

impl Remaining {
    #[must_use]
    pub fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Finite remaining count, `None` when unlimited.
    #[must_use]
    pub fn count(self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Limited(n) => Some(n),
        }
    }
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Limited(n) => write!(f, "{n}"),
        }
    }
}

/// Usage figures for one limit, as shown on usage meters and banners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub current: u64,
    pub max: u64,
    pub remaining: Remaining,
    pub available: bool,
}

impl UsageSummary {
    const NONE: Self = Self {
        current: 0,
        max: 0,
        remaining: Remaining::Limited(0),
        available: false,
    };
}

fn limit_entry(user: Option<&User>, key: LimitKey) -> Option<&LimitEntitlement> {
    let entry = user.and_then(|u| u.limit(key));
    if entry.is_none() {
        tracing::trace!(limit = %key, "No limit data, failing closed");
    }
    entry
}

/// Whether `key` is available to the user.
///
/// `false` when there is no session or the server sent no entry for `key`.
#[must_use]
pub fn is_feature_available(user: Option<&User>, key: FeatureKey) -> bool {
    match user.and_then(|u| u.feature(key)) {
        Some(entry) => entry.available,
        None => {
            tracing::trace!(feature = %key, "No feature data, failing closed");
            false
        }
    }
}

/// Server-supplied upgrade prompt for a locked feature.
///
/// `None` when the feature is available or no data exists for it.
#[must_use]
pub fn feature_upgrade_message(user: Option<&User>, key: FeatureKey) -> Option<&str> {
    let entry = user?.feature(key)?;
    if entry.available {
        return None;
    }
    entry.upgrade_message.as_deref()
}

/// Whether the user can no longer create more of `key`.
///
/// `true` without a session, without an entry, or when the limit is marked
/// unavailable. `max == 0` is never reached.
#[must_use]
pub fn has_reached_limit(user: Option<&User>, key: LimitKey) -> bool {
    let Some(limit) = limit_entry(user, key) else {
        return true;
    };
    if !limit.available {
        return true;
    }
    if limit.is_unlimited() {
        return false;
    }
    limit.current >= limit.max
}

/// How many more of `key` the user can create.
///
/// Unavailable limits are not special-cased: they report `max - current`
/// like any other, so this can be non-zero while [`has_reached_limit`]
/// returns `true`.
#[must_use]
pub fn remaining_usage(user: Option<&User>, key: LimitKey) -> Remaining {
    let Some(limit) = limit_entry(user, key) else {
        return Remaining::Limited(0);
    };
    if limit.available && limit.is_unlimited() {
        return Remaining::Unlimited;
    }
    Remaining::Limited(limit.max.saturating_sub(limit.current))
}

/// Whether the user may use `feature`, and has quota left on `limit` if given.
///
/// The limit is only consulted when the feature is available.
#[must_use]
pub fn can_perform_action(
    user: Option<&User>,
    feature: FeatureKey,
    limit: Option<LimitKey>,
) -> bool {
    if !is_feature_available(user, feature) {
        return false;
    }
    match limit {
        Some(key) => !has_reached_limit(user, key),
        None => true,
    }
}

/// Usage figures for `key`; all zero and unavailable when there is no data.
#[must_use]
pub fn usage(user: Option<&User>, key: LimitKey) -> UsageSummary {
    match user.and_then(|u| u.limit(key)) {
        Some(limit) => UsageSummary {
            current: limit.current,
            max: limit.max,
            remaining: remaining_usage(user, key),
            available: limit.available,
        },
        None => UsageSummary::NONE,
    }
}

#[must_use]
pub fn invoice_usage(user: Option<&User>) -> UsageSummary {
    usage(user, LimitKey::Invoice)
}

#[must_use]
pub fn transaction_usage(user: Option<&User>) -> UsageSummary {
    usage(user, LimitKey::Transaction)
}

#[must_use]
pub fn client_usage(user: Option<&User>) -> UsageSummary {
    usage(user, LimitKey::Client)
}

// ── Convenience predicates ─────────────────────────────────────────

#[must_use]
pub fn entitled_to_bank_sync(user: Option<&User>) -> bool {
    is_feature_available(user, FeatureKey::BankSync)
}

#[must_use]
pub fn can_import_transactions(user: Option<&User>) -> bool {
    can_perform_action(user, FeatureKey::TransactionImport, Some(LimitKey::Transaction))
}

#[must_use]
pub fn can_export_steuerberater(user: Option<&User>) -> bool {
    is_feature_available(user, FeatureKey::ExportSteuerberater)
}

#[must_use]
pub fn can_export_vat_csv(user: Option<&User>) -> bool {
    is_feature_available(user, FeatureKey::ExportVatCsv)
}

#[must_use]
pub fn has_vat_reminders(user: Option<&User>) -> bool {
    is_feature_available(user, FeatureKey::VatReminders)
}

#[must_use]
pub fn has_priority_support(user: Option<&User>) -> bool {
    is_feature_available(user, FeatureKey::PrioritySupport)
}

#[must_use]
pub fn can_submit_vat(user: Option<&User>) -> bool {
    is_feature_available(user, FeatureKey::VatSubmission)
}

#[must_use]
pub fn can_create_invoice(user: Option<&User>) -> bool {
    !has_reached_limit(user, LimitKey::Invoice)
}

#[must_use]
pub fn can_create_transaction(user: Option<&User>) -> bool {
    !has_reached_limit(user, LimitKey::Transaction)
}

#[must_use]
pub fn can_create_client(user: Option<&User>) -> bool {
    !has_reached_limit(user, LimitKey::Client)
}
