//! Credential health across the catalog, without touching the network.
//!
//! [`summarize`] is pure: it takes whatever each account's secret lookup
//! produced and classifies it. [`collect`] performs those lookups against a
//! [`SecretStore`]. A failing lookup degrades only its own entry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::account::{AccountKey, CATALOG};
use crate::credential::{CredentialError, Expiry, resolve};
use crate::store::{Secret, SecretStore, StoreError};

/// Whether an account can be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Configured,
    NotConfigured,
    /// The secret backend failed for this account.
    Unavailable,
}

/// Status entry for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub label: &'static str,
    pub configured: bool,
    pub state: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Expiry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccountStatus {
    fn bare(label: &'static str, state: Presence) -> Self {
        Self {
            label,
            configured: state == Presence::Configured,
            state,
            scope: None,
            expires_at: None,
            days_left: None,
            expiry: None,
            error: None,
        }
    }
}

/// Per-account status, keyed by account.
pub type StatusReport = BTreeMap<AccountKey, AccountStatus>;

/// Outcome of reading one account's raw secret.
pub type SecretLookup = Result<Option<Secret>, StoreError>;

/// Classify every catalog account from its secret lookup.
///
/// Accounts absent from `lookups` are reported as not configured. The
/// result always has one entry per catalog account.
pub fn summarize(lookups: &BTreeMap<AccountKey, SecretLookup>, now: DateTime<Utc>) -> StatusReport {
    CATALOG
        .iter()
        .map(|account| {
            let status = match lookups.get(&account.key) {
                None | Some(Ok(None)) => AccountStatus::bare(account.label, Presence::NotConfigured),
                Some(Err(e)) => AccountStatus {
                    error: Some(e.to_string()),
                    ..AccountStatus::bare(account.label, Presence::Unavailable)
                },
                Some(Ok(Some(raw))) => match resolve(account, Some(raw)) {
                    Ok(credential) => AccountStatus {
                        scope: Some(credential.effective_scope().to_string()),
                        expires_at: credential.expires_at(),
                        days_left: credential.days_left(now),
                        expiry: Some(credential.expiry(now)),
                        ..AccountStatus::bare(account.label, Presence::Configured)
                    },
                    Err(CredentialError::Missing { .. }) => {
                        AccountStatus::bare(account.label, Presence::NotConfigured)
                    }
                    Err(e) => AccountStatus {
                        error: Some(e.to_string()),
                        ..AccountStatus::bare(account.label, Presence::Unavailable)
                    },
                },
            };
            (account.key, status)
        })
        .collect()
}

/// Read every account's secret from `store` and summarize.
pub async fn collect(store: &dyn SecretStore, now: DateTime<Utc>) -> StatusReport {
    let mut lookups = BTreeMap::new();
    for key in AccountKey::ALL {
        let lookup = store.get(key.as_str()).await;
        if let Err(e) = &lookup {
            warn!("could not read secret for {}: {}", key, e);
        }
        lookups.insert(key, lookup);
    }

    let report = summarize(&lookups, now);
    debug!(
        "status: {} of {} accounts configured",
        report.values().filter(|s| s.configured).count(),
        report.len()
    );
    report
}
