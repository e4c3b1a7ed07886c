//! Login, logout and current-session routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::auth::{Credentials, ACCESS_TOKEN, ID_TOKEN, REFRESH_TOKEN};
use crate::error::AppError;
use crate::middleware::ApiKey;
use crate::models::User;
use crate::session::{
    removal_cookie, session_cookie, Session, SESSION_BACKEND, SESSION_COOKIE, SESSION_USER_ID,
};
use crate::AppState;

/// Which provider tokens the session holds. Values are never echoed back.
#[derive(Debug, Serialize)]
pub struct SessionTokens {
    pub access_token: bool,
    pub id_token: bool,
    pub refresh_token: bool,
}

impl SessionTokens {
    fn from_session(session: &Session) -> Self {
        Self {
            access_token: session.contains_key(ACCESS_TOKEN),
            id_token: session.contains_key(ID_TOKEN),
            refresh_token: session.contains_key(REFRESH_TOKEN),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<User>,
    pub backend: Option<String>,
    pub tokens: Option<SessionTokens>,
    pub api_key: Option<String>,
}

/// POST /login - authenticate and open a session
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<User>), AppError> {
    let authenticated = state
        .backends
        .authenticate(&credentials)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    // A login always starts from a fresh session.
    if let Some(previous) = jar.get(SESSION_COOKIE) {
        state.sessions.delete(previous.value()).await;
    }

    let mut session = Session::new();
    session.insert(SESSION_USER_ID, authenticated.user.id.to_string());
    session.insert(SESSION_BACKEND, authenticated.backend.clone());
    state.login_events.user_logged_in(&authenticated, &mut session);

    let session_id = state.sessions.create(session).await;
    let jar = jar.add(session_cookie(session_id));

    // Observers may have written to the record (last_login).
    let user = match state.store.get(authenticated.user.id)? {
        Some(user) => user,
        None => authenticated.user,
    };

    Ok((jar, Json(user)))
}

/// POST /logout - drop the current session
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.delete(cookie.value()).await;
    }
    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}

/// GET /me - the session's user and the relayed API key
async fn me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    api_key: Option<Extension<ApiKey>>,
) -> Result<Json<MeResponse>, AppError> {
    let session = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.load(cookie.value()).await,
        None => None,
    };

    let user = match session.as_ref().and_then(Session::user_id) {
        Some(id) => state.store.get(id)?,
        None => None,
    };

    Ok(Json(MeResponse {
        backend: user
            .as_ref()
            .and(session.as_ref())
            .and_then(|s| s.get(SESSION_BACKEND))
            .map(str::to_string),
        tokens: user
            .as_ref()
            .and(session.as_ref())
            .map(SessionTokens::from_session),
        user,
        api_key: api_key.map(|Extension(ApiKey(key))| key),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
}
