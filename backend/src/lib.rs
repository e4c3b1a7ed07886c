pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod provider;
pub mod routes;
pub mod session;
pub mod store;
pub mod test_util;

pub use auth::{AuthBackend, AuthError, Backends, CognitoBackend, Credentials, LocalPasswordBackend};
pub use config::Config;
pub use error::AppError;
pub use middleware::ApiKey;
pub use models::{AuthenticatedUser, User};
pub use provider::{CognitoClient, IdentityProvider, ProviderError};
pub use session::{Session, SessionStore};
pub use store::UserStore;

use std::sync::Arc;
use std::time::Duration;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::{LastLoginRecorder, LoginEvents, TokenRelay};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<UserStore>,
    /// Authentication backends, tried in order at login.
    pub backends: Backends,
    /// Observers run after each successful login.
    pub login_events: LoginEvents,
    pub sessions: SessionStore,
}

impl AppState {
    /// Wire up the store, backend chain and login hooks for `config`.
    pub fn new(config: Config, provider: Arc<dyn IdentityProvider>) -> Result<Self, AuthError> {
        let store = Arc::new(UserStore::new(&config.database.url)?);
        let backends = Backends::from_config(&config.auth, store.clone(), provider)?;

        let login_events = LoginEvents::new()
            .with(Arc::new(TokenRelay))
            .with(Arc::new(LastLoginRecorder::new(store.clone())));

        tracing::info!("Authentication backends: {:?}", backends.names());

        let sessions = SessionStore::with_ttl(Duration::from_secs(config.session.ttl_secs));

        Ok(Self {
            config,
            store,
            backends,
            login_events,
            sessions,
        })
    }
}

/// Application router with every route and middleware layer.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router(state))
        .layer(axum::middleware::from_fn(middleware::api_key_relay))
        .layer(axum::middleware::from_fn(logging::request_logger))
        .layer(TraceLayer::new_for_http())
}
