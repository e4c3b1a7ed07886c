//! Cognito Auth Common Types
//!
//! Shared types describing what the identity provider hands back: session
//! tokens, user attribute lists, and the JSON wire format of the user-pool API.

pub mod attributes;
pub mod protocol;
pub mod tokens;

pub use attributes::{AttributeType, RemoteUser, UserAttributes, UserStatus};
pub use protocol::{
    AuthenticationResult, ErrorBody, GetUserRequest, GetUserResponse, InitiateAuthRequest,
    InitiateAuthResponse,
};
pub use tokens::TokenSet;
