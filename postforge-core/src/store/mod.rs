//! Host-supplied secret storage.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`SecretStore`] - Read-only trait for secret storage backends
//! - [`EnvStore`] - Environment variable backend (default for the daemon)
//! - [`MemoryStore`] - In-memory implementation for testing
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_store`] - Helper to select a backend from configuration
//!
//! # Storage Key Convention
//!
//! Secrets are addressed by account key (`personal`, `company`, `showcase`).
//! Each backend maps that key onto its own naming scheme.
//!
//! Postforge only ever reads secrets. Writing them is the job of whatever
//! provisions the host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod env;
#[cfg(feature = "keyring-store")]
mod keyring;
mod memory;

pub use env::EnvStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;
pub use memory::MemoryStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the buffer is zeroed when the secret is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for secret store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Access to the secret was denied.
    #[error("access denied to secret: {key}")]
    AccessDenied { key: String },

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },
}

/// Abstraction over secret storage backends.
///
/// Implementations include:
/// - [`EnvStore`] - process environment
/// - [`MemoryStore`] - In-memory storage for testing
/// - [`KeyringStore`] (with `keyring-store` feature) - OS keyring
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Retrieve the raw secret for an account key.
    ///
    /// Returns `Ok(None)` if nothing is configured for the key.
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError>;

    /// Check if a key is configured without handing out the value.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Which backend the daemon reads account secrets from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// `{prefix}_{ACCOUNT}_TOKEN` environment variables.
    #[default]
    Env,
    /// OS keyring entries.
    Keyring,
    /// Empty in-memory store (every account reports as not configured).
    Memory,
}

/// Service name used for keyring entries.
pub const KEYRING_SERVICE: &str = "postforge";

/// Create a secret store for the selected backend.
///
/// # Backend Selection Logic
///
/// - [`SecretBackend::Env`]: an [`EnvStore`] with the given prefix
/// - [`SecretBackend::Keyring`] with the `keyring-store` feature enabled:
///   - Attempts to create a [`KeyringStore`]
///   - Falls back to [`EnvStore`] with a warning if the keyring is unavailable
/// - [`SecretBackend::Memory`]: an empty [`MemoryStore`]
///
/// # Example
///
/// ```rust,ignore
/// use postforge_core::store::{create_store, SecretBackend};
///
/// let store = create_store(SecretBackend::Env, "POSTFORGE");
/// let raw = store.get("personal").await?;
/// ```
pub fn create_store(backend: SecretBackend, env_prefix: &str) -> Box<dyn SecretStore> {
    match backend {
        SecretBackend::Env => {
            tracing::info!("Reading account secrets from {}_*_TOKEN variables", env_prefix);
            Box::new(EnvStore::new(env_prefix))
        }
        SecretBackend::Keyring => keyring_or_env(env_prefix),
        SecretBackend::Memory => {
            tracing::debug!("Using in-memory secret storage");
            Box::new(MemoryStore::new())
        }
    }
}

#[cfg(feature = "keyring-store")]
fn keyring_or_env(env_prefix: &str) -> Box<dyn SecretStore> {
    match KeyringStore::try_new(KEYRING_SERVICE) {
        Ok(store) => {
            tracing::info!("Reading account secrets from the OS keyring");
            Box::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "Keyring unavailable ({}), falling back to {}_*_TOKEN variables",
                e,
                env_prefix
            );
            Box::new(EnvStore::new(env_prefix))
        }
    }
}

#[cfg(not(feature = "keyring-store"))]
fn keyring_or_env(env_prefix: &str) -> Box<dyn SecretStore> {
    tracing::warn!(
        "Keyring storage requested but keyring-store feature not enabled. \
         Falling back to {}_*_TOKEN variables.",
        env_prefix
    );
    Box::new(EnvStore::new(env_prefix))
}
