//! Remote identity provider abstraction.
//!
//! The `IdentityProvider` trait covers the two calls the login flow makes
//! against a user pool: exchanging credentials for tokens, and fetching the
//! user's attributes with the access token that exchange produced.

mod cognito;

pub use cognito::CognitoClient;

use async_trait::async_trait;
use cognito_common::protocol::NOT_AUTHORIZED;
use cognito_common::{RemoteUser, TokenSet};

/// Errors raised by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider rejected the call with a machine-readable code.
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The provider wants another authentication step (MFA, new password...).
    #[error("Authentication challenge required: {0}")]
    ChallengeRequired(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Provider error code, when the provider sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True for a wrong username/password, the only expected failure.
    pub fn is_not_authorized(&self) -> bool {
        self.code() == Some(NOT_AUTHORIZED)
    }
}

/// Client for a remote user pool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange a username and password for session tokens.
    async fn authenticate(&self, username: &str, password: &str) -> Result<TokenSet, ProviderError>;

    /// Fetch the user the access token belongs to.
    async fn get_user(&self, access_token: &str) -> Result<RemoteUser, ProviderError>;
}
