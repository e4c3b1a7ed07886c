use chrono::{DateTime, Utc};
use cognito_common::TokenSet;
use serde::Serialize;

/// Local user record, one per username.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Local primary key, stable across logins
    pub id: i64,
    /// Unique login name, the join key with the user pool
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Bcrypt hash for the local password backend; pool users have none
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// Whether the user is allowed to log in
    pub is_active: bool,
    /// When the record was created
    pub date_joined: DateTime<Utc>,
    /// When the user last logged in
    pub last_login: Option<DateTime<Utc>>,
}

/// A user returned by an authentication backend.
///
/// Carries what the login flow needs beyond the stored record: which backend
/// accepted the credentials and the tokens that backend was issued.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    /// Name of the accepting backend, stamped by the dispatcher
    pub backend: String,
    /// Provider tokens, not persisted anywhere but the session
    pub tokens: Option<TokenSet>,
}

impl AuthenticatedUser {
    pub fn new(user: User) -> Self {
        Self {
            user,
            backend: String::new(),
            tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: TokenSet) -> Self {
        self.tokens = Some(tokens);
        self
    }
}
