//! Configuration for the auth adapter.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub cognito: CognitoConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub testing: TestingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// User pool connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CognitoConfig {
    /// AWS region of the pool (e.g. "eu-west-1").
    pub region: String,
    pub user_pool_id: String,
    /// App client id; the client must allow `USER_PASSWORD_AUTH` and have no secret.
    pub client_id: String,
    /// Override for the API endpoint. Defaults to the regional endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl CognitoConfig {
    /// Base URL the client posts to.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://cognito-idp.{}.amazonaws.com", self.region),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Create a local user the first time a pool user logs in.
    #[serde(default = "default_true")]
    pub create_unknown_user: bool,
    /// Backends tried in order at login ("cognito", "local").
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,
    /// Provider attribute name → local field name
    /// ("email", "first_name", "last_name"). Replaces the defaults when set.
    #[serde(default)]
    pub attribute_mapping: HashMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            create_unknown_user: default_true(),
            backends: default_backends(),
            attribute_mapping: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Seconds a session stays valid after login.
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, optionally prefixed with "sqlite:". ":memory:" is accepted.
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Fixtures for tests against a real pool.
#[derive(Debug, Clone, Deserialize)]
pub struct TestingConfig {
    #[serde(default = "default_test_username")]
    pub username: String,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            username: default_test_username(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_true() -> bool {
    true
}
fn default_backends() -> Vec<String> {
    vec!["cognito".to_string()]
}
fn default_session_ttl_secs() -> u64 {
    14 * 24 * 60 * 60
}
fn default_database_url() -> String {
    "sqlite:./data/users.db".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_test_username() -> String {
    "testuser".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (COGNITO_AUTH__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("auth.create_unknown_user", default_true())?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("COGNITO_AUTH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.backends")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
