//! Cookie-identified server-side sessions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, SameSite};
use tokio::sync::RwLock;

/// Cookie holding the session id.
pub const SESSION_COOKIE: &str = "sessionid";
/// Session key of the logged-in user's id.
pub const SESSION_USER_ID: &str = "_auth_user_id";
/// Session key of the backend that authenticated the user.
pub const SESSION_BACKEND: &str = "_auth_user_backend";

/// String key/value data of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    values: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Id of the logged-in user, if any.
    pub fn user_id(&self) -> Option<i64> {
        self.get(SESSION_USER_ID).and_then(|id| id.parse().ok())
    }
}

/// Lifetime of a session unless configured otherwise: two weeks.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

struct StoredSession {
    session: Session,
    expires_at: Instant,
}

impl StoredSession {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory session storage.
///
/// Each session lives for a fixed time from its creation. Expired ids read as
/// missing and are dropped on the next `create`.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `session` under a fresh id and return the id.
    pub async fn create(&self, session: Session) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| !stored.is_expired(now));
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::debug!("Purged {} expired sessions", purged);
        }

        sessions.insert(
            id.clone(),
            StoredSession {
                session,
                expires_at: now + self.ttl,
            },
        );
        id
    }

    pub async fn load(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|stored| !stored.is_expired(now))
            .map(|stored| stored.session.clone())
    }

    /// Replace a live session, keeping its expiry. Returns false if the id is
    /// unknown or expired.
    pub async fn save(&self, id: &str, session: Session) -> bool {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(stored) if !stored.is_expired(now) => {
                stored.session = session;
                true
            }
            _ => false,
        }
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|stored| !stored.is_expired(now))
            .count()
    }

    /// Number of stored entries, expired ones included.
    #[cfg(test)]
    async fn stored_len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Cookie carrying session `id`.
pub fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Cookie matching [`session_cookie`], for removal from a jar.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
