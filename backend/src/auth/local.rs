//! Backend checking passwords stored in the local user table.

use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthBackend, AuthError, Credentials};
use crate::models::AuthenticatedUser;
use crate::store::UserStore;

/// Hash a password for storage with [`UserStore::set_password`].
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Authenticates users that have a local password hash.
///
/// Never issues provider tokens, so the token relay leaves sessions created
/// through it alone.
pub struct LocalPasswordBackend {
    store: Arc<UserStore>,
}

impl LocalPasswordBackend {
    pub const NAME: &'static str = "local";

    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthBackend for LocalPasswordBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthenticatedUser>, AuthError> {
        let Some(user) = self.store.find_by_username(&credentials.username)? else {
            return Ok(None);
        };
        let Some(hash) = user.password_hash.clone() else {
            return Ok(None);
        };

        let password = credentials.password.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        let valid = match verified {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("Stored password hash for {} is unusable: {}", user.username, e);
                false
            }
        };

        if !valid || !user.is_active {
            return Ok(None);
        }

        Ok(Some(AuthenticatedUser::new(user)))
    }
}
