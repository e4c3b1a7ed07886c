//! Hooks run after a successful login.

use std::sync::Arc;

use super::CognitoBackend;
use crate::models::AuthenticatedUser;
use crate::session::Session;
use crate::store::UserStore;

/// Session key of the provider access token.
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
/// Session key of the provider identity token.
pub const ID_TOKEN: &str = "ID_TOKEN";
/// Session key of the provider refresh token.
pub const REFRESH_TOKEN: &str = "REFRESH_TOKEN";

/// Observer of successful logins.
pub trait LoginObserver: Send + Sync {
    fn user_logged_in(&self, user: &AuthenticatedUser, session: &mut Session);
}

/// Login observers, notified in registration order.
#[derive(Default)]
pub struct LoginEvents {
    observers: Vec<Arc<dyn LoginObserver>>,
}

impl LoginEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn LoginObserver>) {
        self.observers.push(observer);
    }

    pub fn with(mut self, observer: Arc<dyn LoginObserver>) -> Self {
        self.subscribe(observer);
        self
    }

    pub fn user_logged_in(&self, user: &AuthenticatedUser, session: &mut Session) {
        for observer in &self.observers {
            observer.user_logged_in(user, session);
        }
    }
}

/// Copies user-pool tokens into the session of a user the pool authenticated.
pub struct TokenRelay;

impl LoginObserver for TokenRelay {
    fn user_logged_in(&self, user: &AuthenticatedUser, session: &mut Session) {
        if user.backend != CognitoBackend::NAME {
            return;
        }
        let Some(tokens) = &user.tokens else {
            return;
        };

        let pairs = [
            (ACCESS_TOKEN, &tokens.access_token),
            (ID_TOKEN, &tokens.id_token),
            (REFRESH_TOKEN, &tokens.refresh_token),
        ];
        for (key, token) in pairs {
            if let Some(token) = token {
                session.insert(key, token.clone());
            }
        }
    }
}

/// Stamps `last_login` on the user record.
pub struct LastLoginRecorder {
    store: Arc<UserStore>,
}

impl LastLoginRecorder {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }
}

impl LoginObserver for LastLoginRecorder {
    fn user_logged_in(&self, user: &AuthenticatedUser, _session: &mut Session) {
        if let Err(e) = self.store.touch_last_login(user.user.id) {
            tracing::warn!("Failed to record last login for {}: {}", user.user.username, e);
        }
    }
}
