//! Wire types for the user-pool JSON API.
//!
//! The provider speaks JSON 1.1 over HTTPS: every call is a `POST /` with an
//! `X-Amz-Target` header naming the operation and a PascalCase JSON body.
//!
//! # Operations used
//!
//! - `InitiateAuth` with the `USER_PASSWORD_AUTH` flow exchanges a username
//!   and password for a token set.
//! - `GetUser` exchanges an access token for the user's attribute list.
//!
//! Neither operation needs request signing.
//!
//! # Errors
//!
//! Failed calls answer with a 4xx/5xx status and a body such as
//! `{"__type": "NotAuthorizedException", "message": "..."}`. The type may be
//! namespaced (`com.amazonaws...#NotAuthorizedException`); [`ErrorBody::code`]
//! strips the prefix.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{AttributeType, RemoteUser, TokenSet, UserAttributes, UserStatus};

/// `X-Amz-Target` prefix shared by every operation.
pub const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Content type the API expects.
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

pub const USER_PASSWORD_AUTH: &str = "USER_PASSWORD_AUTH";

/// Error code returned for a wrong username or password.
pub const NOT_AUTHORIZED: &str = "NotAuthorizedException";

/// Body of an `InitiateAuth` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateAuthRequest {
    pub auth_flow: String,
    pub client_id: String,
    pub auth_parameters: HashMap<String, String>,
}

impl InitiateAuthRequest {
    /// Password flow request for `username`/`password`.
    pub fn user_password(client_id: &str, username: &str, password: &str) -> Self {
        let mut auth_parameters = HashMap::new();
        auth_parameters.insert("USERNAME".to_string(), username.to_string());
        auth_parameters.insert("PASSWORD".to_string(), password.to_string());

        Self {
            auth_flow: USER_PASSWORD_AUTH.to_string(),
            client_id: client_id.to_string(),
            auth_parameters,
        }
    }
}

/// Response of an `InitiateAuth` call.
///
/// Either `authentication_result` is set, or the provider asks for another
/// step via `challenge_name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateAuthResponse {
    #[serde(default)]
    pub authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    pub challenge_name: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl From<AuthenticationResult> for TokenSet {
    fn from(result: AuthenticationResult) -> Self {
        TokenSet {
            access_token: result.access_token,
            id_token: result.id_token,
            refresh_token: result.refresh_token,
        }
    }
}

/// Body of a `GetUser` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetUserRequest {
    pub access_token: String,
}

/// Response of a `GetUser` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetUserResponse {
    pub username: String,
    #[serde(default)]
    pub user_attributes: Vec<AttributeType>,
    /// Only the admin variant reports this.
    #[serde(default)]
    pub user_status: Option<UserStatus>,
}

impl From<GetUserResponse> for RemoteUser {
    fn from(response: GetUserResponse) -> Self {
        RemoteUser {
            username: response.username,
            attributes: UserAttributes::new(response.user_attributes),
            status: response.user_status,
        }
    }
}

/// Error body of a failed call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Error code with any namespace prefix removed.
    pub fn code(&self) -> Option<&str> {
        self.error_type.as_deref().map(strip_error_namespace)
    }
}

/// `com.amazonaws.cognito#NotAuthorizedException` → `NotAuthorizedException`.
///
/// Also handles the header form `NotAuthorizedException:http://...`.
pub fn strip_error_namespace(raw: &str) -> &str {
    let code = raw.rsplit('#').next().unwrap_or(raw);
    code.split(':').next().unwrap_or(code)
}
