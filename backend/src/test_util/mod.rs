use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cognito_common::protocol::NOT_AUTHORIZED;
use cognito_common::{RemoteUser, TokenSet, UserAttributes};

use crate::config::{
    AuthConfig, CognitoConfig, Config, DatabaseConfig, LoggingConfig, ServerConfig, SessionConfig,
    TestingConfig,
};
use crate::provider::{IdentityProvider, ProviderError};
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        cognito: CognitoConfig {
            region: "eu-west-1".to_string(),
            user_pool_id: "eu-west-1_test".to_string(),
            client_id: "test-client".to_string(),
            endpoint: None,
        },
        auth: AuthConfig::default(),
        session: SessionConfig::default(),
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        testing: TestingConfig::default(),
    }
}

/// Attribute list the pool reports for the fixture user.
pub fn sample_attributes() -> UserAttributes {
    UserAttributes::from_pairs([
        ("sub", "c7d890f6-eb38-498d-8f85-7a6c4af33d7a"),
        ("email_verified", "true"),
        ("gender", "male"),
        ("name", "FirstName LastName"),
        ("preferred_username", "testuser"),
        ("given_name", "FirstName"),
        ("family_name", "LastName"),
        ("email", "test@email.com"),
    ])
}

/// Tokens the stub provider issues to `username`.
pub fn tokens_for(username: &str) -> TokenSet {
    TokenSet::new(
        format!("{}-accesstoken", username),
        format!("{}-idtoken", username),
        format!("{}-refreshtoken", username),
    )
}

struct StubAccount {
    password: String,
    user: RemoteUser,
}

/// In-memory identity provider with fixed accounts.
///
/// Wrong passwords and unknown usernames fail with `NotAuthorizedException`
/// like the real pool. `fail_with` makes every call fail instead.
#[derive(Default)]
pub struct StubIdentityProvider {
    accounts: Mutex<HashMap<String, StubAccount>>,
    failure: Mutex<Option<ProviderError>>,
}

impl StubIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, username: &str, password: &str, attributes: UserAttributes) -> Self {
        self.add_user(username, password, attributes);
        self
    }

    /// Add or replace an account.
    pub fn add_user(&self, username: &str, password: &str, attributes: UserAttributes) {
        self.accounts.lock().unwrap().insert(
            username.to_string(),
            StubAccount {
                password: password.to_string(),
                user: RemoteUser {
                    username: username.to_string(),
                    attributes,
                    status: None,
                },
            },
        );
    }

    pub fn fail_with(&self, error: ProviderError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    fn forced_failure(&self) -> Option<ProviderError> {
        self.failure.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn authenticate(&self, username: &str, password: &str) -> Result<TokenSet, ProviderError> {
        if let Some(error) = self.forced_failure() {
            return Err(error);
        }

        let accounts = self.accounts.lock().unwrap();
        match accounts.get(username) {
            Some(account) if account.password == password => Ok(tokens_for(username)),
            _ => Err(ProviderError::service(NOT_AUTHORIZED, "Incorrect username or password.")),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<RemoteUser, ProviderError> {
        if let Some(error) = self.forced_failure() {
            return Err(error);
        }

        let accounts = self.accounts.lock().unwrap();
        accounts
            .iter()
            .find(|(username, _)| tokens_for(username).access_token.as_deref() == Some(access_token))
            .map(|(_, account)| account.user.clone())
            .ok_or_else(|| ProviderError::service(NOT_AUTHORIZED, "Invalid Access Token"))
    }
}

/// State over an in-memory store and the given provider.
pub fn create_test_state(config: Config, provider: Arc<StubIdentityProvider>) -> Arc<AppState> {
    Arc::new(AppState::new(config, provider).unwrap())
}
