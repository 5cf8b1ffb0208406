use std::collections::BTreeMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{FeatureKey, LimitKey, Plan, UserId};

/// Authenticated user as returned by the accounting API session endpoint.
///
/// This is a read-only snapshot: it is replaced wholesale when the session is
/// refreshed and dropped on logout. Evaluation functions in
/// [`entitlements`](crate::entitlements) take it as `Option<&User>`, where
/// `None` means there is no session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    /// Plans this crate does not know read as [`Plan::default()`].
    #[serde(default, deserialize_with = "lenient_plan")]
    pub plan: Plan,
    #[serde(default)]
    pub on_trial: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub trial_ends_at: Option<time::OffsetDateTime>,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

impl User {
    /// Create a snapshot with no permissions attached.
    #[must_use]
    pub fn new(id: impl Into<String>, plan: Plan) -> Self {
        Self {
            id: UserId(id.into()),
            email: None,
            plan,
            on_trial: false,
            trial_ends_at: None,
            permissions: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_trial(mut self, ends_at: Option<time::OffsetDateTime>) -> Self {
        self.on_trial = true;
        self.trial_ends_at = ends_at;
        self
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Feature entry, if the server reported one.
    #[must_use]
    pub fn feature(&self, key: FeatureKey) -> Option<&FeatureEntitlement> {
        self.permissions.as_ref()?.features.as_ref()?.get(&key)
    }

    /// Limit entry, if the server reported one.
    #[must_use]
    pub fn limit(&self, key: LimitKey) -> Option<&LimitEntitlement> {
        self.permissions.as_ref()?.limits.as_ref()?.get(&key)
    }
}

/// Server-computed entitlements for the account's plan.
///
/// Either map may be missing from the payload. Entries with keys this crate
/// does not know, or with a malformed body, are dropped during
/// deserialization so they read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Permissions {
    #[serde(default, deserialize_with = "known_entries")]
    pub features: Option<BTreeMap<FeatureKey, FeatureEntitlement>>,
    #[serde(default, deserialize_with = "known_entries")]
    pub limits: Option<BTreeMap<LimitKey, LimitEntitlement>>,
}

impl Permissions {
    /// Empty permissions with both maps present.
    #[must_use]
    pub fn new() -> Self {
        Self {
            features: Some(BTreeMap::new()),
            limits: Some(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn with_feature(mut self, key: FeatureKey, entry: FeatureEntitlement) -> Self {
        self.features.get_or_insert_with(BTreeMap::new).insert(key, entry);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, key: LimitKey, entry: LimitEntitlement) -> Self {
        self.limits.get_or_insert_with(BTreeMap::new).insert(key, entry);
        self
    }
}

/// Availability of one gated feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureEntitlement {
    pub available: bool,
    #[serde(default)]
    pub upgrade_message: Option<String>,
}

impl FeatureEntitlement {
    #[must_use]
    pub fn available() -> Self {
        Self {
            available: true,
            upgrade_message: None,
        }
    }

    #[must_use]
    pub fn locked(upgrade_message: impl Into<String>) -> Self {
        Self {
            available: false,
            upgrade_message: Some(upgrade_message.into()),
        }
    }
}

/// Usage quota for one countable resource. `max == 0` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitEntitlement {
    pub available: bool,
    pub current: u64,
    pub max: u64,
}

impl LimitEntitlement {
    #[must_use]
    pub fn new(available: bool, current: u64, max: u64) -> Self {
        Self {
            available,
            current,
            max,
        }
    }

    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.max == 0
    }
}

fn lenient_plan<'de, D>(deserializer: D) -> Result<Plan, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let plan = match raw {
        None | Some(serde_json::Value::Null) => Plan::default(),
        Some(serde_json::Value::String(name)) => name.parse::<Plan>().unwrap_or_else(|e| {
            tracing::warn!(plan = %name, error = %e, "Unrecognized plan, using default");
            Plan::default()
        }),
        Some(other) => {
            tracing::warn!(plan = %other, "Plan is not a string, using default");
            Plan::default()
        }
    };
    Ok(plan)
}

fn known_entries<'de, D, K, V>(deserializer: D) -> Result<Option<BTreeMap<K, V>>, D::Error>
where
    D: Deserializer<'de>,
    K: FromStr + Ord,
    V: DeserializeOwned,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw.map(|entries| {
        entries
            .into_iter()
            .filter_map(|(name, value)| {
                let Ok(key) = name.parse::<K>() else {
                    tracing::debug!(key = %name, "Ignoring unknown permission key");
                    return None;
                };
                match serde_json::from_value(value) {
                    Ok(entry) => Some((key, entry)),
                    Err(e) => {
                        tracing::warn!(key = %name, error = %e, "Dropping malformed permission entry");
                        None
                    }
                }
            })
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "id": "usr_01",
        "email": "anna@example.de",
        "plan": "plus",
        "onTrial": true,
        "trialEndsAt": "2026-11-01T00:00:00Z",
        "permissions": {
            "features": {
                "bankSync": { "available": false, "upgradeMessage": "Upgrade to Pro" },
                "exportVatCsv": { "available": true, "upgradeMessage": null }
            },
            "limits": {
                "invoice": { "available": true, "current": 3, "max": 5 },
                "client": { "available": true, "current": 12, "max": 0 }
            }
        }
    }"#;

    #[test]
    fn deserializes_api_snapshot() {
        let user: User = serde_json::from_str(SNAPSHOT).unwrap();

        assert_eq!(user.id.to_string(), "usr_01");
        assert_eq!(user.plan, Plan::Plus);
        assert!(user.on_trial);
        assert!(user.trial_ends_at.is_some());
        assert_eq!(
            user.feature(FeatureKey::BankSync),
            Some(&FeatureEntitlement::locked("Upgrade to Pro"))
        );
        assert_eq!(
            user.limit(LimitKey::Invoice),
            Some(&LimitEntitlement::new(true, 3, 5))
        );
        assert!(user.limit(LimitKey::Client).unwrap().is_unlimited());
        assert!(user.limit(LimitKey::Transaction).is_none());
    }

    #[test]
    fn unknown_plan_keeps_snapshot() {
        let json = r#"{
            "id": "usr_03",
            "plan": "business",
            "permissions": {
                "features": { "bankSync": { "available": true } },
                "limits": { "invoice": { "available": true, "current": 1, "max": 0 } }
            }
        }"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.plan, Plan::Starter);
        assert_eq!(
            user.feature(FeatureKey::BankSync),
            Some(&FeatureEntitlement::available())
        );
        assert!(user.limit(LimitKey::Invoice).unwrap().is_unlimited());
    }

    #[test]
    fn null_or_non_string_plan_uses_default() {
        let user: User = serde_json::from_str(r#"{ "id": "usr_04", "plan": null }"#).unwrap();
        assert_eq!(user.plan, Plan::Starter);

        let user: User = serde_json::from_str(r#"{ "id": "usr_05", "plan": 3 }"#).unwrap();
        assert_eq!(user.plan, Plan::Starter);

        let user: User = serde_json::from_str(r#"{ "id": "usr_06", "plan": "pro" }"#).unwrap();
        assert_eq!(user.plan, Plan::Pro);
    }

    #[test]
    fn minimal_snapshot_has_no_permissions() {
        let user: User = serde_json::from_str(r#"{ "id": "usr_02", "plan": "free" }"#).unwrap();

        assert_eq!(user.plan, Plan::Starter);
        assert!(!user.on_trial);
        assert!(user.permissions.is_none());
        assert!(user.feature(FeatureKey::BankSync).is_none());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let json = r#"{
            "features": {
                "aiAssistant": { "available": true },
                "vatReminders": { "available": true }
            },
            "limits": {
                "project": { "available": true, "current": 1, "max": 2 }
            }
        }"#;
        let permissions: Permissions = serde_json::from_str(json).unwrap();

        let features = permissions.features.unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[&FeatureKey::VatReminders].available);
        assert!(permissions.limits.unwrap().is_empty());
    }

    #[test]
    fn malformed_entry_is_dropped() {
        let json = r#"{
            "limits": {
                "invoice": { "available": true, "current": -1, "max": 5 },
                "transaction": { "available": true, "current": 1, "max": 5 }
            }
        }"#;
        let permissions: Permissions = serde_json::from_str(json).unwrap();

        assert!(permissions.features.is_none());
        let limits = permissions.limits.unwrap();
        assert!(!limits.contains_key(&LimitKey::Invoice));
        assert!(limits.contains_key(&LimitKey::Transaction));
    }

    #[test]
    fn null_maps_read_as_absent() {
        let permissions: Permissions =
            serde_json::from_str(r#"{ "features": null, "limits": null }"#).unwrap();
        assert_eq!(permissions.features, None);
        assert_eq!(permissions.limits, None);
    }

    #[test]
    fn builder_inserts_into_missing_map() {
        let permissions = Permissions::default()
            .with_limit(LimitKey::Client, LimitEntitlement::new(true, 0, 10));
        assert!(permissions.features.is_none());
        assert_eq!(permissions.limits.unwrap().len(), 1);
    }
}
