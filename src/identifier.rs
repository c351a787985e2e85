//! Model identifiers
//!
//! `owner/name` refers to a model; `owner/name:version` pins a version.
//! Parsing never touches the network.

use crate::errors::{Result, VaikerError};
use std::fmt;
use std::str::FromStr;

/// A parsed model reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelIdentifier {
    pub owner: String,
    pub name: String,
    pub version: Option<String>,
}

impl ModelIdentifier {
    /// Parse `owner/name` or `owner/name:version`
    pub fn parse(identifier: &str) -> Result<Self> {
        let invalid = || {
            VaikerError::Validation(format!(
                "Invalid model identifier '{}': expected 'owner/name' or 'owner/name:version'",
                identifier
            ))
        };

        let (model, version) = match identifier.split_once(':') {
            Some((model, version)) => (model, Some(version)),
            None => (identifier, None),
        };

        let (owner, name) = model.split_once('/').ok_or_else(invalid)?;

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        if owner.chars().any(char::is_whitespace) || name.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let version = match version {
            Some(v) if v.is_empty() || v.contains(':') => return Err(invalid()),
            Some(v) => Some(v.to_string()),
            None => None,
        };

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            version,
        })
    }

    /// Parse an `owner/name` reference that must not carry a version
    pub fn parse_model(identifier: &str) -> Result<Self> {
        let parsed = Self::parse(identifier)?;
        if parsed.version.is_some() {
            return Err(VaikerError::Validation(format!(
                "Expected a model reference 'owner/name', got '{}'",
                identifier
            )));
        }
        Ok(parsed)
    }

    /// `owner/name` without the version
    pub fn model(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl FromStr for ModelIdentifier {
    type Err = VaikerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}/{}:{}", self.owner, self.name, version),
            None => write!(f, "{}/{}", self.owner, self.name),
        }
    }
}
