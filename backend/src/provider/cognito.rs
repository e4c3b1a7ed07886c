//! User-pool client speaking the provider's JSON 1.1 API.

use async_trait::async_trait;
use cognito_common::protocol::{self, CONTENT_TYPE, TARGET_PREFIX};
use cognito_common::{
    ErrorBody, GetUserRequest, GetUserResponse, InitiateAuthRequest, InitiateAuthResponse,
    RemoteUser, TokenSet,
};
use reqwest::Client;
use reqwest::header::{HeaderMap, CONTENT_TYPE as CONTENT_TYPE_HEADER};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{IdentityProvider, ProviderError};

/// Client for one user-pool app client.
pub struct CognitoClient {
    http_client: Client,
    endpoint: String,
    client_id: String,
}

impl CognitoClient {
    pub fn new(endpoint: &str, client_id: &str) -> Self {
        Self {
            http_client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
        }
    }

    /// POST one operation and decode its response.
    async fn call<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Resp, ProviderError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/", self.endpoint);
        let target = format!("{}.{}", TARGET_PREFIX, operation);

        tracing::debug!("Calling {} at {}", operation, url);

        let payload = serde_json::to_vec(body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let response = self.http_client
            .post(&url)
            .header(CONTENT_TYPE_HEADER, CONTENT_TYPE)
            .header("X-Amz-Target", target)
            .body(payload)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let headers = response.headers().clone();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("Failed to read {} error body: {}", operation, e);
                    String::new()
                }
            };
            let err = error_from_response(status.as_u16(), &headers, &body);
            tracing::debug!("{} failed with {}: {}", operation, status, err);
            return Err(err);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

/// Build a `ProviderError` from a failed call.
///
/// The code comes from the body's `__type`, falling back to the
/// `x-amzn-ErrorType` header, then to the bare HTTP status.
fn error_from_response(status: u16, headers: &HeaderMap, body: &str) -> ProviderError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = parsed
        .code()
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("x-amzn-errortype")
                .and_then(|v| v.to_str().ok())
                .map(|v| protocol::strip_error_namespace(v).to_string())
        })
        .filter(|code| !code.is_empty());

    match code {
        Some(code) => ProviderError::service(code, parsed.message.unwrap_or_default()),
        None => ProviderError::RequestFailed(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn authenticate(&self, username: &str, password: &str) -> Result<TokenSet, ProviderError> {
        let request = InitiateAuthRequest::user_password(&self.client_id, username, password);
        let response: InitiateAuthResponse = self.call("InitiateAuth", &request).await?;

        if let Some(challenge) = response.challenge_name {
            return Err(ProviderError::ChallengeRequired(challenge));
        }

        response
            .authentication_result
            .map(TokenSet::from)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("missing AuthenticationResult".to_string())
            })
    }

    async fn get_user(&self, access_token: &str) -> Result<RemoteUser, ProviderError> {
        let request = GetUserRequest {
            access_token: access_token.to_string(),
        };
        let response: GetUserResponse = self.call("GetUser", &request).await?;
        Ok(response.into())
    }
}
