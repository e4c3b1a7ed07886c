use std::sync::Arc;

use tokio::net::TcpListener;

use cognito_auth_backend::config::Config;
use cognito_auth_backend::logging;
use cognito_auth_backend::{app, AppState, CognitoClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Make sure config.toml exists or set COGNITO_AUTH__COGNITO__REGION, \
             COGNITO_AUTH__COGNITO__USER_POOL_ID and COGNITO_AUTH__COGNITO__CLIENT_ID.",
            e
        )
    })?;

    logging::init_tracing(&config.logging.level);

    tracing::info!(
        "Starting Cognito auth adapter for pool {} ({})",
        config.cognito.user_pool_id,
        config.cognito.region
    );

    let provider = Arc::new(CognitoClient::new(
        &config.cognito.endpoint_url(),
        &config.cognito.client_id,
    ));
    let state = Arc::new(AppState::new(config.clone(), provider)?);

    let app = app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
