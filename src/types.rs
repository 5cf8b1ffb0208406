use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Solobooks account identifier (opaque string issued by the accounting API).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Subscription plan of the account.
///
/// The API has used both `"starter"` and `"free"` for the entry plan;
/// both deserialize to [`Plan::Starter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Plan {
    #[default]
    #[serde(alias = "free")]
    Starter,
    Plus,
    Pro,
}

impl Plan {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Plus => "plus",
            Self::Pro => "pro",
        }
    }

    /// Whether this is a paid plan.
    #[must_use]
    pub fn is_paid(self) -> bool {
        !matches!(self, Self::Starter)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" | "free" => Ok(Self::Starter),
            "plus" => Ok(Self::Plus),
            "pro" => Ok(Self::Pro),
            other => Err(Error::UnknownPlan(other.to_owned())),
        }
    }
}

/// Gated capability, keyed the way the API names it in `permissions.features`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKey {
    BankSync,
    TransactionImport,
    ExportSteuerberater,
    ExportVatCsv,
    VatReminders,
    PrioritySupport,
    VatSubmission,
}

impl FeatureKey {
    pub const ALL: [Self; 7] = [
        Self::BankSync,
        Self::TransactionImport,
        Self::ExportSteuerberater,
        Self::ExportVatCsv,
        Self::VatReminders,
        Self::PrioritySupport,
        Self::VatSubmission,
    ];

    /// Wire name of the feature (`"bankSync"`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BankSync => "bankSync",
            Self::TransactionImport => "transactionImport",
            Self::ExportSteuerberater => "exportSteuerberater",
            Self::ExportVatCsv => "exportVatCsv",
            Self::VatReminders => "vatReminders",
            Self::PrioritySupport => "prioritySupport",
            Self::VatSubmission => "vatSubmission",
        }
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeatureKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::UnknownFeature(s.to_owned()))
    }
}

/// Countable quota, keyed the way the API names it in `permissions.limits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LimitKey {
    Invoice,
    Transaction,
    Client,
}

impl LimitKey {
    pub const ALL: [Self; 3] = [Self::Invoice, Self::Transaction, Self::Client];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Transaction => "transaction",
            Self::Client => "client",
        }
    }
}

impl std::fmt::Display for LimitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LimitKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::UnknownLimit(s.to_owned()))
    }
}
