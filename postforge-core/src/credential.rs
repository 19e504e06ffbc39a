//! Credential resolution from host-supplied raw secrets.
//!
//! This module provides:
//! - [`RawCredential`] - The two shapes a raw secret can take
//! - [`parse_raw_secret`] - The single function deciding between them
//! - [`Credential`] - The normalized record used to authenticate one call
//! - [`resolve`] / [`resolve_from_store`] - Account + raw secret -> credential
//!
//! A raw secret is either a bare access token or a JSON bundle such as:
//!
//! ```json
//! {"access_token":"abc123","scope":"w_member_social",
//!  "generated_at":"2024-01-01T00:00:00Z","expires_in":5184000}
//! ```
//!
//! Credentials are rebuilt on every invocation and never cached, so a rotated
//! secret is picked up immediately.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::account::{Account, AccountKey};
use crate::store::{Secret, SecretStore, StoreError};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Error type for credential resolution.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No raw secret is configured for the account.
    #[error("no credential configured for account '{account}'")]
    Missing { account: String },

    /// The secret backend failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Issuance metadata carried by a structured secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    pub scope: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub ttl_seconds: Option<i64>,
}

/// The two accepted shapes of a raw secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCredential {
    /// The whole string is the access token.
    Bare(Secret),

    /// A JSON bundle with an access token and optional metadata.
    Structured {
        access_token: Secret,
        metadata: TokenMetadata,
    },
}

/// Decide which shape a raw secret has.
///
/// A string that parses as a JSON object with a non-empty `access_token` is
/// [`RawCredential::Structured`]. Everything else, including arrays and
/// objects that lack an access token, is treated as a [`RawCredential::Bare`]
/// token. Metadata fields of the wrong type are dropped, not fatal.
pub fn parse_raw_secret(raw: &Secret) -> RawCredential {
    let text = raw.expose().trim();

    let bundle = match serde_json::from_str::<Map<String, Value>>(text) {
        Ok(bundle) => bundle,
        Err(_) => return RawCredential::Bare(Secret::new(text)),
    };

    let Some(access_token) = bundle
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
    else {
        warn!("secret is a JSON object without an access_token; using the raw string as the token");
        return RawCredential::Bare(Secret::new(text));
    };

    RawCredential::Structured {
        access_token: Secret::new(access_token),
        metadata: TokenMetadata {
            scope: bundle
                .get("scope")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            issued_at: bundle.get("generated_at").and_then(parse_issued_at),
            ttl_seconds: bundle.get("expires_in").and_then(parse_ttl),
        },
    }
}

fn parse_issued_at(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

fn parse_ttl(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A resolved credential for one account.
///
/// `access_token` is never empty.
#[derive(Debug, Clone)]
pub struct Credential {
    /// The account this credential belongs to.
    pub account: AccountKey,

    /// Bearer token sent upstream.
    pub access_token: Secret,

    /// Scope recorded in the secret, if any.
    pub scope: Option<String>,

    /// When the token was issued, if recorded.
    pub issued_at: Option<DateTime<Utc>>,

    /// Token lifetime in seconds, if recorded.
    pub ttl_seconds: Option<i64>,
}

impl Credential {
    /// The recorded scope, or the account's required scope when none was recorded.
    pub fn effective_scope(&self) -> &str {
        self.scope
            .as_deref()
            .unwrap_or(self.account.account().required_scope)
    }

    /// `issued_at + ttl_seconds`, when both are known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let issued_at = self.issued_at?;
        let ttl = Duration::try_seconds(self.ttl_seconds?)?;
        issued_at.checked_add_signed(ttl)
    }

    /// Whole days until expiry, rounded to the nearest day (negative once expired).
    pub fn days_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at().map(|expires_at| days_between(now, expires_at))
    }

    /// Expiry classification at `now`.
    pub fn expiry(&self, now: DateTime<Utc>) -> Expiry {
        match self.expires_at() {
            None => Expiry::Unknown,
            Some(expires_at) if expires_at <= now => Expiry::Expired,
            Some(_) => Expiry::Valid,
        }
    }
}

/// Advisory expiry state. Never used to block a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// Issuance time or lifetime not recorded.
    Unknown,
    Valid,
    Expired,
}

/// `round((to - from) / 1 day)`, with halves rounding up.
fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let seconds = (to - from).num_seconds() as f64;
    (seconds / SECONDS_PER_DAY + 0.5).floor() as i64
}

/// Build a credential for `account` from its raw secret.
///
/// Fails with [`CredentialError::Missing`] when the secret is absent or blank.
pub fn resolve(account: &Account, raw: Option<&Secret>) -> Result<Credential, CredentialError> {
    let raw = raw
        .filter(|secret| !secret.is_blank())
        .ok_or_else(|| CredentialError::Missing {
            account: account.key.to_string(),
        })?;

    let credential = match parse_raw_secret(raw) {
        RawCredential::Bare(access_token) => Credential {
            account: account.key,
            access_token,
            scope: None,
            issued_at: None,
            ttl_seconds: None,
        },
        RawCredential::Structured {
            access_token,
            metadata,
        } => Credential {
            account: account.key,
            access_token,
            scope: metadata.scope,
            issued_at: metadata.issued_at,
            ttl_seconds: metadata.ttl_seconds,
        },
    };

    Ok(credential)
}

/// Fetch the account's raw secret from `store` and resolve it.
pub async fn resolve_from_store(
    account: &Account,
    store: &dyn SecretStore,
) -> Result<Credential, CredentialError> {
    let raw = store.get(account.key.as_str()).await?;
    resolve(account, raw.as_ref())
}
