//! User attributes as reported by the identity provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One `{"Name": ..., "Value": ...}` entry of a provider attribute list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeType {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl AttributeType {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Ordered attribute list of a remote user.
///
/// Order is kept as received. Lookups return the first entry with a
/// matching name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserAttributes(Vec<AttributeType>);

impl UserAttributes {
    pub fn new(attributes: Vec<AttributeType>) -> Self {
        Self(attributes)
    }

    /// Build from `(name, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, value)| AttributeType::new(name, value))
                .collect(),
        )
    }

    /// Value of the first attribute called `name`, if it carries one.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .and_then(|attr| attr.value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeType> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<AttributeType> for UserAttributes {
    fn from_iter<I: IntoIterator<Item = AttributeType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Account status in the user pool.
///
/// Values the provider may add later are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserStatus {
    Unconfirmed,
    Confirmed,
    Archived,
    Compromised,
    ResetRequired,
    ForceChangePassword,
    ExternalProvider,
    Other(String),
}

impl UserStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, UserStatus::Confirmed | UserStatus::ExternalProvider)
    }

    pub fn as_str(&self) -> &str {
        match self {
            UserStatus::Unconfirmed => "UNCONFIRMED",
            UserStatus::Confirmed => "CONFIRMED",
            UserStatus::Archived => "ARCHIVED",
            UserStatus::Compromised => "COMPROMISED",
            UserStatus::ResetRequired => "RESET_REQUIRED",
            UserStatus::ForceChangePassword => "FORCE_CHANGE_PASSWORD",
            UserStatus::ExternalProvider => "EXTERNAL_PROVIDER",
            UserStatus::Other(s) => s,
        }
    }
}

impl From<String> for UserStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "UNCONFIRMED" => UserStatus::Unconfirmed,
            "CONFIRMED" => UserStatus::Confirmed,
            "ARCHIVED" => UserStatus::Archived,
            "COMPROMISED" => UserStatus::Compromised,
            "RESET_REQUIRED" => UserStatus::ResetRequired,
            "FORCE_CHANGE_PASSWORD" => UserStatus::ForceChangePassword,
            "EXTERNAL_PROVIDER" => UserStatus::ExternalProvider,
            _ => UserStatus::Other(value),
        }
    }
}

impl From<UserStatus> for String {
    fn from(status: UserStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a user fetched from the pool after authenticating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    pub username: String,
    pub attributes: UserAttributes,
    /// Not every lookup reports it; `GetUser` omits the status.
    pub status: Option<UserStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UserAttributes {
        UserAttributes::from_pairs([
            ("sub", "c7d890f6-eb38-498d-8f85-7a6c4af33d7a"),
            ("email_verified", "true"),
            ("given_name", "FirstName"),
            ("family_name", "LastName"),
            ("email", "test@email.com"),
        ])
    }

    #[test]
    fn test_get_returns_value_by_name() {
        let attrs = sample();
        assert_eq!(attrs.get("email"), Some("test@email.com"));
        assert_eq!(attrs.get("given_name"), Some("FirstName"));
        assert_eq!(attrs.get("gender"), None);
    }

    #[test]
    fn test_get_returns_first_duplicate() {
        let attrs = UserAttributes::from_pairs([("email", "first@x.com"), ("email", "second@x.com")]);
        assert_eq!(attrs.get("email"), Some("first@x.com"));
    }

    #[test]
    fn test_order_is_preserved() {
        let attrs = sample();
        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["sub", "email_verified", "given_name", "family_name", "email"]
        );
    }

    #[test]
    fn test_deserialize_provider_attribute_list() {
        let json = r#"[
            {"Name": "sub", "Value": "abc"},
            {"Name": "email", "Value": "a@b.c"},
            {"Name": "picture"}
        ]"#;
        let attrs: UserAttributes = serde_json::from_str(json).unwrap();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.get("email"), Some("a@b.c"));
        assert_eq!(attrs.get("picture"), None);
    }

    #[test]
    fn test_user_status_known_values() {
        assert_eq!(UserStatus::from("CONFIRMED".to_string()), UserStatus::Confirmed);
        assert_eq!(
            UserStatus::from("FORCE_CHANGE_PASSWORD".to_string()),
            UserStatus::ForceChangePassword
        );
        assert!(UserStatus::Confirmed.is_confirmed());
        assert!(!UserStatus::Unconfirmed.is_confirmed());
    }

    #[test]
    fn test_user_status_unknown_value_is_kept() {
        let status: UserStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(status, UserStatus::Other("SOMETHING_NEW".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"SOMETHING_NEW\"");
    }
}
