//! # Postforge Core
//!
//! Multi-account credential resolution and request dispatch for LinkedIn.
//!
//! This crate provides:
//! - The fixed account catalog ([`AccountKey`], [`CATALOG`])
//! - Credential resolution from bare or structured raw secrets
//! - Read-only secret storage backends (environment, OS keyring, memory)
//! - An authenticated LinkedIn REST client
//! - The ten tool handlers and the credential status aggregator
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use postforge_core::{ApiClient, ApiConfig, EnvStore, ToolContext};
//!
//! let client = ApiClient::new(ApiConfig::default())?;
//! let tools = ToolContext::new(Arc::new(EnvStore::default()), client);
//!
//! let result = tools
//!     .call("linkedin_post", serde_json::json!({"content": "Hello", "account": "company"}))
//!     .await;
//! println!("{}", result.text());
//! ```

pub mod account;
pub mod client;
pub mod credential;
pub mod error;
pub mod status;
pub mod store;
pub mod tools;

// Re-export commonly used types at crate root
pub use account::{Account, AccountKey, CATALOG, lookup, lookup_or_default};

pub use credential::{
    Credential,
    CredentialError,
    Expiry,
    RawCredential,
    parse_raw_secret,
    resolve,
    resolve_from_store,
};

pub use store::{
    EnvStore,
    MemoryStore,
    Secret,
    SecretBackend,
    SecretStore,
    StoreError,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use client::{
    ApiClient,
    ApiConfig,
    ApiError,
    UpstreamBody,
    UpstreamRequest,
    UpstreamResponse,
};

pub use tools::{
    ToolAnnotations,
    ToolCall,
    ToolContent,
    ToolContext,
    ToolDescriptor,
    ToolName,
    ToolResult,
    descriptors,
};

pub use status::{AccountStatus, Presence, StatusReport};

pub use error::PostforgeError;
