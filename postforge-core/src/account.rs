//! The fixed account catalog.
//!
//! Postforge posts on behalf of exactly three identities:
//! - [`AccountKey::Personal`] - the member's own profile
//! - [`AccountKey::Company`] - the primary organization page
//! - [`AccountKey::Showcase`] - the secondary organization page
//!
//! The set is closed. Adding or removing an account is a change to
//! [`AccountKey`] and [`CATALOG`], never a runtime operation.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::PostforgeError;

/// Key identifying one of the catalog accounts.
///
/// # Examples
///
/// ```
/// use postforge_core::AccountKey;
///
/// let key: AccountKey = "company".parse().unwrap();
/// assert_eq!(key.account().label, "Company Page");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKey {
    #[default]
    Personal,
    Company,
    Showcase,
}

impl AccountKey {
    /// All keys, in catalog order.
    pub const ALL: [AccountKey; 3] = [Self::Personal, Self::Company, Self::Showcase];

    /// Get the key as it appears in tool arguments and secret names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Company => "company",
            Self::Showcase => "showcase",
        }
    }

    /// Get the catalog entry for this key.
    pub fn account(self) -> &'static Account {
        match self {
            Self::Personal => &CATALOG[0],
            Self::Company => &CATALOG[1],
            Self::Showcase => &CATALOG[2],
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKey {
    type Err = PostforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| PostforgeError::UnknownAccount { key: s.to_string() })
    }
}

/// A catalog account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Catalog key.
    pub key: AccountKey,

    /// Human-readable name shown in results.
    pub label: &'static str,

    /// URN sent as the `author` of posts (`urn:li:person:*` or `urn:li:organization:*`).
    pub author: &'static str,

    /// Permission scope the account's token must carry to post.
    pub required_scope: &'static str,
}

/// The compiled account catalog, in [`AccountKey::ALL`] order.
pub static CATALOG: [Account; 3] = [
    Account {
        key: AccountKey::Personal,
        label: "Personal Profile",
        author: "urn:li:person:postforge-member",
        required_scope: "w_member_social",
    },
    Account {
        key: AccountKey::Company,
        label: "Company Page",
        author: "urn:li:organization:10000001",
        required_scope: "w_organization_social",
    },
    Account {
        key: AccountKey::Showcase,
        label: "Showcase Page",
        author: "urn:li:organization:10000002",
        required_scope: "w_organization_social",
    },
];

/// Look up an account by its string key.
///
/// Fails with [`PostforgeError::UnknownAccount`] for anything outside the catalog.
pub fn lookup(key: &str) -> Result<&'static Account, PostforgeError> {
    key.parse::<AccountKey>().map(AccountKey::account)
}

/// Resolve an optional account argument, defaulting to the personal account.
pub fn lookup_or_default(key: Option<&str>) -> Result<&'static Account, PostforgeError> {
    match key {
        Some(key) => lookup(key),
        None => Ok(AccountKey::default().account()),
    }
}
