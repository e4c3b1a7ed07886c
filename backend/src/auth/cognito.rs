//! Backend delegating password checks to the user pool.

use std::sync::Arc;

use async_trait::async_trait;

use super::{AttributeMapping, AuthBackend, AuthError, Credentials};
use crate::models::AuthenticatedUser;
use crate::provider::{IdentityProvider, ProviderError};
use crate::store::UserStore;

/// Authenticates against the remote user pool and keeps the local user
/// record in sync with the pool's attributes.
pub struct CognitoBackend {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<UserStore>,
    mapping: AttributeMapping,
    create_unknown_user: bool,
}

impl CognitoBackend {
    pub const NAME: &'static str = "cognito";

    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<UserStore>,
        mapping: AttributeMapping,
        create_unknown_user: bool,
    ) -> Self {
        Self {
            provider,
            store,
            mapping,
            create_unknown_user,
        }
    }
}

#[async_trait]
impl AuthBackend for CognitoBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthenticatedUser>, AuthError> {
        let username = credentials.username.as_str();

        let tokens = match self.provider.authenticate(username, &credentials.password).await {
            Ok(tokens) => tokens,
            Err(e) if e.is_not_authorized() => {
                tracing::debug!("User pool rejected credentials for {}", username);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let access_token = tokens.access_token.as_deref().ok_or_else(|| {
            ProviderError::InvalidResponse("no access token issued".to_string())
        })?;
        let remote = self.provider.get_user(access_token).await?;

        if let Some(status) = &remote.status {
            if !status.is_confirmed() {
                tracing::warn!("User {} is not confirmed ({})", username, status);
                return Ok(None);
            }
        }

        // The pool's username keys the local record, whatever alias was typed.
        let pool_username = remote.username.as_str();
        if pool_username != username {
            tracing::debug!("Login {} resolved to pool user {}", username, pool_username);
        }

        let update = self.mapping.apply(&remote.attributes);
        let Some(user) = self
            .store
            .sync_remote_user(pool_username, &update, self.create_unknown_user)?
        else {
            tracing::info!(
                "No local user for {} and unknown users are not created",
                pool_username
            );
            return Ok(None);
        };

        if !user.is_active {
            tracing::warn!("User {} is inactive", pool_username);
            return Ok(None);
        }

        Ok(Some(AuthenticatedUser::new(user).with_tokens(tokens)))
    }
}
