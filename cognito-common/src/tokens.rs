//! Session tokens issued by one successful authentication.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access, identity and refresh tokens from a single authentication call.
///
/// Any of them may be missing: the provider omits the refresh token for
/// some flows, and a stubbed provider may hand back none at all.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenSet {
    pub fn new(
        access_token: impl Into<String>,
        id_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            id_token: Some(id_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// True when no token at all was issued.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.id_token.is_none() && self.refresh_token.is_none()
    }
}

// Tokens are bearer credentials; keep them out of logs.
impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(token: &Option<String>) -> &'static str {
            if token.is_some() { "<redacted>" } else { "<none>" }
        }

        f.debug_struct("TokenSet")
            .field("access_token", &mask(&self.access_token))
            .field("id_token", &mask(&self.id_token))
            .field("refresh_token", &mask(&self.refresh_token))
            .finish()
    }
}
