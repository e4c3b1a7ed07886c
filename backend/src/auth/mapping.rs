//! Mapping from provider attribute names to local user fields.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use cognito_common::UserAttributes;

use super::AuthError;
use crate::store::UserUpdate;

/// User record fields that provider attributes can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalField {
    Email,
    FirstName,
    LastName,
}

impl FromStr for LocalField {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(LocalField::Email),
            "first_name" => Ok(LocalField::FirstName),
            "last_name" => Ok(LocalField::LastName),
            other => Err(AuthError::Config(format!("unknown user field '{}'", other))),
        }
    }
}

impl fmt::Display for LocalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalField::Email => write!(f, "email"),
            LocalField::FirstName => write!(f, "first_name"),
            LocalField::LastName => write!(f, "last_name"),
        }
    }
}

/// Which provider attribute fills which local field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMapping {
    fields: HashMap<String, LocalField>,
}

impl Default for AttributeMapping {
    fn default() -> Self {
        let fields = [
            ("email", LocalField::Email),
            ("given_name", LocalField::FirstName),
            ("family_name", LocalField::LastName),
        ]
        .into_iter()
        .map(|(name, field)| (name.to_string(), field))
        .collect();

        Self { fields }
    }
}

impl AttributeMapping {
    /// Mapping from the `auth.attribute_mapping` table; empty means defaults.
    pub fn from_config(entries: &HashMap<String, String>) -> Result<Self, AuthError> {
        if entries.is_empty() {
            return Ok(Self::default());
        }

        let fields = entries
            .iter()
            .map(|(attribute, field)| Ok((attribute.clone(), field.parse::<LocalField>()?)))
            .collect::<Result<HashMap<_, _>, AuthError>>()?;

        Ok(Self { fields })
    }

    pub fn field_for(&self, attribute: &str) -> Option<LocalField> {
        self.fields.get(attribute).copied()
    }

    /// Field values carried by `attributes`.
    ///
    /// Unmapped attributes are ignored and fields with no matching attribute
    /// stay `None`. When several attributes map to one field, the first in
    /// list order wins.
    pub fn apply(&self, attributes: &UserAttributes) -> UserUpdate {
        let mut update = UserUpdate::default();

        for attribute in attributes.iter() {
            let (Some(field), Some(value)) = (self.field_for(&attribute.name), &attribute.value)
            else {
                continue;
            };

            let slot = match field {
                LocalField::Email => &mut update.email,
                LocalField::FirstName => &mut update.first_name,
                LocalField::LastName => &mut update.last_name,
            };
            if slot.is_none() {
                *slot = Some(value.clone());
            }
        }

        update
    }
}
