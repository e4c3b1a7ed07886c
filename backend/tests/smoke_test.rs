use cognito_auth_backend::auth::{hash_password, ACCESS_TOKEN, ID_TOKEN, REFRESH_TOKEN};
use cognito_auth_backend::session::SESSION_COOKIE;
use cognito_auth_backend::test_util::{
    create_test_state, sample_attributes, test_config, tokens_for, StubIdentityProvider,
};
use cognito_auth_backend::{app, AppState, ProviderError};
use axum::body::Body;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestResponse {
    status: StatusCode,
    session_cookie: Option<String>,
    body: Value,
}

async fn send(app: &axum::Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let session_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", SESSION_COOKIE)))
        .map(|v| v.split(';').next().unwrap().to_string());

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse { status, session_cookie, body }
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::post("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"username": username, "password": password}).to_string(),
        ))
        .unwrap()
}

fn me_request(cookie: Option<&str>, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::get("/me");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(api_key) = api_key {
        builder = builder.header("Authorization-Id", api_key);
    }
    builder.body(Body::empty()).unwrap()
}

fn stub_provider() -> Arc<StubIdentityProvider> {
    Arc::new(StubIdentityProvider::new().with_user("testuser", "password", sample_attributes()))
}

fn setup() -> (Arc<AppState>, axum::Router) {
    let state = create_test_state(test_config(), stub_provider());
    let router = app(state.clone());
    (state, router)
}

#[tokio::test]
async fn test_health() {
    let (_, app) = setup();
    let response = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_login_creates_user_and_session() {
    let (state, app) = setup();
    assert_eq!(state.store.count().unwrap(), 0);

    let response = send(&app, login_request("testuser", "password")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "testuser");
    assert_eq!(response.body["email"], "test@email.com");
    assert_eq!(response.body["first_name"], "FirstName");
    assert_eq!(response.body["last_name"], "LastName");
    assert!(response.body.get("password_hash").is_none());
    assert_eq!(state.store.count().unwrap(), 1);

    let cookie = response.session_cookie.expect("session cookie");
    let session_id = cookie.trim_start_matches(&format!("{}=", SESSION_COOKIE));
    let session = state.sessions.load(session_id).await.unwrap();

    let expected = tokens_for("testuser");
    assert_eq!(session.get(ACCESS_TOKEN), expected.access_token.as_deref());
    assert_eq!(session.get(ID_TOKEN), expected.id_token.as_deref());
    assert_eq!(session.get(REFRESH_TOKEN), expected.refresh_token.as_deref());

    let user = state.store.find_by_username("testuser").unwrap().unwrap();
    assert!(user.last_login.is_some());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (state, app) = setup();
    let response = send(&app, login_request("testuser", "wrongpassword")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.session_cookie.is_none());
    assert_eq!(state.store.count().unwrap(), 0);
    assert_eq!(state.sessions.len().await, 0);
}

#[tokio::test]
async fn test_login_wrong_username() {
    let (state, app) = setup();
    let response = send(&app, login_request("wrongusername", "password")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_provider_error_is_reported() {
    let provider = stub_provider();
    provider.fail_with(ProviderError::service("SomeError", "Generic Error Message."));
    let state = create_test_state(test_config(), provider);
    let app = app(state.clone());

    let response = send(&app, login_request("testuser", "password")).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"]["type"], "identity_provider_error");
    assert_eq!(response.body["error"]["code"], "SomeError");
    assert_eq!(state.store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_existing_user_updated() {
    let (state, app) = setup();
    let existing = state.store.create_user("testuser", Some("None")).unwrap();

    let response = send(&app, login_request("testuser", "password")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], existing.id);
    assert_eq!(response.body["email"], "test@email.com");
    assert_eq!(state.store.count().unwrap(), 1);

    let updated = state.store.find_by_username("testuser").unwrap().unwrap();
    assert_eq!(updated.id, existing.id);
    assert_eq!(updated.email.as_deref(), Some("test@email.com"));
}

#[tokio::test]
async fn test_unknown_user_not_created_when_disabled() {
    let mut config = test_config();
    config.auth.create_unknown_user = false;
    let state = create_test_state(config, stub_provider());
    let app = app(state.clone());

    let response = send(&app, login_request("testuser", "password")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_known_user_updated_when_creation_disabled() {
    let mut config = test_config();
    config.auth.create_unknown_user = false;
    let state = create_test_state(config, stub_provider());
    let app = app(state.clone());
    let existing = state.store.create_user("testuser", Some("None")).unwrap();

    let response = send(&app, login_request("testuser", "password")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], existing.id);
    assert_eq!(
        state.store.find_by_username("testuser").unwrap().unwrap().email.as_deref(),
        Some("test@email.com")
    );
}

#[tokio::test]
async fn test_local_backend_login_leaves_tokens_out_of_session() {
    let mut config = test_config();
    config.auth.backends = vec!["cognito".to_string(), "local".to_string()];
    let state = create_test_state(config, stub_provider());
    let app = app(state.clone());

    let username = state.config.testing.username.clone();
    let local_name = format!("{}-local", username);
    state.store.create_user(&local_name, None).unwrap();
    state
        .store
        .set_password(&local_name, &hash_password("localpass", 4).unwrap())
        .unwrap();

    let response = send(&app, login_request(&local_name, "localpass")).await;
    assert_eq!(response.status, StatusCode::OK);

    let cookie = response.session_cookie.expect("session cookie");
    let me = send(&app, me_request(Some(&cookie), None)).await;
    assert_eq!(me.body["user"]["username"], local_name.as_str());
    assert_eq!(me.body["backend"], "local");
    assert_eq!(me.body["tokens"]["access_token"], false);
    assert_eq!(me.body["tokens"]["id_token"], false);
    assert_eq!(me.body["tokens"]["refresh_token"], false);
}

#[tokio::test]
async fn test_me_reports_cognito_session() {
    let (_, app) = setup();
    let login = send(&app, login_request("testuser", "password")).await;
    let cookie = login.session_cookie.unwrap();

    let me = send(&app, me_request(Some(&cookie), None)).await;

    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["username"], "testuser");
    assert_eq!(me.body["backend"], "cognito");
    assert_eq!(me.body["tokens"]["access_token"], true);
    assert_eq!(me.body["tokens"]["id_token"], true);
    assert_eq!(me.body["tokens"]["refresh_token"], true);
    assert!(me.body["api_key"].is_null());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (state, app) = setup();
    let login = send(&app, login_request("testuser", "password")).await;
    let cookie = login.session_cookie.unwrap();
    assert_eq!(state.sessions.len().await, 1);

    let logout = send(
        &app,
        Request::post("/logout")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert_eq!(state.sessions.len().await, 0);

    let me = send(&app, me_request(Some(&cookie), None)).await;
    assert!(me.body["user"].is_null());
    assert!(me.body["tokens"].is_null());
}

#[tokio::test]
async fn test_login_response_has_current_last_login() {
    let (state, app) = setup();
    let response = send(&app, login_request("testuser", "password")).await;
    assert_eq!(response.status, StatusCode::OK);

    let stored = state.store.find_by_username("testuser").unwrap().unwrap();
    assert!(!response.body["last_login"].is_null());
    assert_eq!(
        response.body["last_login"],
        serde_json::to_value(stored.last_login).unwrap()
    );
}

#[tokio::test]
async fn test_expired_session_is_logged_out() {
    let mut config = test_config();
    config.session.ttl_secs = 0;
    let state = create_test_state(config, stub_provider());
    let app = app(state.clone());

    let login = send(&app, login_request("testuser", "password")).await;
    assert_eq!(login.status, StatusCode::OK);
    let cookie = login.session_cookie.unwrap();

    let me = send(&app, me_request(Some(&cookie), None)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert!(me.body["user"].is_null());
    assert!(me.body["tokens"].is_null());
    assert_eq!(state.sessions.len().await, 0);
}

#[tokio::test]
async fn test_cookieless_logins_are_bounded_by_expiry() {
    let mut config = test_config();
    config.session.ttl_secs = 0;
    let state = create_test_state(config, stub_provider());
    let app = app(state.clone());

    for _ in 0..10 {
        let response = send(&app, login_request("testuser", "password")).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    assert_eq!(state.sessions.len().await, 0);
}

#[tokio::test]
async fn test_relogin_replaces_session() {
    let (state, app) = setup();
    let first = send(&app, login_request("testuser", "password")).await;
    let cookie = first.session_cookie.unwrap();

    let second = send(
        &app,
        Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, &cookie)
            .body(Body::from(json!({"username": "testuser", "password": "password"}).to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(second.status, StatusCode::OK);
    assert_ne!(second.session_cookie.unwrap(), cookie);
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn test_api_key_header_transfers() {
    let (_, app) = setup();
    let me = send(&app, me_request(None, Some("testapikey"))).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["api_key"], "testapikey");
    assert!(me.body["user"].is_null());
}

#[tokio::test]
async fn test_api_key_header_missing() {
    let (_, app) = setup();
    let me = send(&app, me_request(None, None)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert!(me.body["api_key"].is_null());
}
