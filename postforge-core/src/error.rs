//! Top-level error types for Postforge.

use thiserror::Error;

use crate::client::ApiError;
use crate::credential::CredentialError;
use crate::store::StoreError;

/// Every way a tool invocation can fail.
///
/// Operation handlers never let one of these escape; they are rendered into
/// an error tool result using the `Display` text.
#[derive(Debug, Error)]
pub enum PostforgeError {
    /// The account key is not part of the catalog.
    #[error("unknown account '{key}' (expected one of: personal, company, showcase)")]
    UnknownAccount { key: String },

    /// The tool name is not one of the supported operations.
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    /// No raw secret is configured for the account.
    #[error("no credential configured for account '{account}'")]
    MissingCredential { account: String },

    /// LinkedIn answered with a non-success status. The body is verbatim.
    #[error("LinkedIn API error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// LinkedIn answered with success but not in the expected shape. The body is verbatim.
    #[error("unexpected LinkedIn response {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// Input failed a declared constraint before any resolution happened.
    #[error("invalid input: {message}")]
    MalformedInput { message: String },

    /// The request never produced an HTTP response.
    #[error("request to LinkedIn failed: {message}")]
    Transport { message: String },

    /// The secret backend failed while reading a secret.
    #[error("secret store error: {0}")]
    Store(#[from] StoreError),
}

impl PostforgeError {
    /// Shorthand for [`PostforgeError::MalformedInput`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }
}

impl From<CredentialError> for PostforgeError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Missing { account } => Self::MissingCredential { account },
            CredentialError::Store(e) => Self::Store(e),
        }
    }
}

impl From<ApiError> for PostforgeError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Upstream { status, body } => Self::Upstream { status, body },
            ApiError::Transport { message } => Self::Transport { message },
        }
    }
}
