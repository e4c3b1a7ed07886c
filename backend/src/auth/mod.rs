//! Authentication backends and login hooks.
//!
//! A login tries each configured [`AuthBackend`] in order; the first one to
//! return a user wins. After a successful login the [`LoginEvents`] observers
//! run against the new session.

mod cognito;
mod events;
mod local;
mod mapping;

pub use cognito::CognitoBackend;
pub use events::{
    LastLoginRecorder, LoginEvents, LoginObserver, TokenRelay, ACCESS_TOKEN, ID_TOKEN,
    REFRESH_TOKEN,
};
pub use local::{hash_password, LocalPasswordBackend};
pub use mapping::{AttributeMapping, LocalField};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::models::AuthenticatedUser;
use crate::provider::{IdentityProvider, ProviderError};
use crate::store::{StoreError, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Identity provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("User store error: {0}")]
    Store(#[from] StoreError),
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
    #[error("Invalid auth configuration: {0}")]
    Config(String),
}

/// Username and password submitted at login.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One authentication method.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Identifier stored in the session and on the authenticated user.
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "not accepted here"; errors abort the whole login.
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthenticatedUser>, AuthError>;
}

/// Backends tried in a fixed order.
#[derive(Default)]
pub struct Backends {
    backends: Vec<Arc<dyn AuthBackend>>,
}

impl Backends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend after the ones already registered.
    pub fn register(&mut self, backend: Arc<dyn AuthBackend>) {
        self.backends.push(backend);
    }

    pub fn with(mut self, backend: Arc<dyn AuthBackend>) -> Self {
        self.register(backend);
        self
    }

    /// Names of the registered backends, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Try each backend in turn and return the first user accepted.
    ///
    /// The returned user carries the name of the backend that accepted it.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthenticatedUser>, AuthError> {
        for backend in &self.backends {
            if let Some(mut user) = backend.authenticate(credentials).await? {
                user.backend = backend.name().to_string();
                tracing::info!(
                    username = %user.user.username,
                    backend = backend.name(),
                    "User authenticated"
                );
                return Ok(Some(user));
            }
        }

        tracing::info!(username = %credentials.username, "Authentication failed");
        Ok(None)
    }

    /// Build the backend chain named in `auth.backends`.
    pub fn from_config(
        config: &AuthConfig,
        store: Arc<UserStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AuthError> {
        let mapping = AttributeMapping::from_config(&config.attribute_mapping)?;
        let mut backends = Backends::new();

        for name in &config.backends {
            match name.as_str() {
                CognitoBackend::NAME => backends.register(Arc::new(CognitoBackend::new(
                    provider.clone(),
                    store.clone(),
                    mapping.clone(),
                    config.create_unknown_user,
                ))),
                LocalPasswordBackend::NAME => {
                    backends.register(Arc::new(LocalPasswordBackend::new(store.clone())))
                }
                other => {
                    return Err(AuthError::Config(format!("unknown backend '{}'", other)));
                }
            }
        }

        if backends.is_empty() {
            return Err(AuthError::Config("no authentication backends configured".to_string()));
        }

        Ok(backends)
    }
}
