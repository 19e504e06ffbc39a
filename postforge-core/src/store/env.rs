//! Environment-variable secret storage.

use async_trait::async_trait;
use tracing::{debug, trace};

use super::{Secret, SecretStore, StoreError};

/// Reads account secrets from the process environment.
///
/// The variable name is `{prefix}_{KEY}_TOKEN` with the account key
/// upper-cased, e.g. `POSTFORGE_PERSONAL_TOKEN`. Unset and empty variables
/// both count as "not configured".
///
/// The environment is read on every call, so rotating a variable in the
/// host takes effect on the next invocation.
#[derive(Debug, Clone)]
pub struct EnvStore {
    prefix: String,
}

impl EnvStore {
    /// Create an env store with the given variable prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Variable name holding the secret for an account key.
    pub fn var_name(&self, key: &str) -> String {
        format!(
            "{}_{}_TOKEN",
            self.prefix,
            key.to_uppercase().replace('-', "_")
        )
    }
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new("POSTFORGE")
    }
}

#[async_trait]
impl SecretStore for EnvStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        let var = self.var_name(key);
        trace!("looking for env var: {}", var);

        match std::env::var(&var) {
            Ok(value) if !value.trim().is_empty() => {
                debug!("found secret for {} in {}", key, var);
                Ok(Some(Secret::new(value)))
            }
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(StoreError::BackendError {
                message: format!("{} is not valid unicode", var),
            }),
        }
    }
}
