//! Model, version, collection, account and hardware records

use crate::types::prediction::Prediction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Model visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// A hosted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub url: Option<String>,

    pub owner: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub visibility: Visibility,

    #[serde(default)]
    pub github_url: Option<String>,

    #[serde(default)]
    pub paper_url: Option<String>,

    #[serde(default)]
    pub license_url: Option<String>,

    #[serde(default)]
    pub run_count: Option<u64>,

    #[serde(default)]
    pub cover_image_url: Option<String>,

    /// Example prediction shown on the model page
    #[serde(default)]
    pub default_example: Option<Box<Prediction>>,

    #[serde(default)]
    pub latest_version: Option<Version>,
}

impl Model {
    /// `owner/name`
    pub fn id(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A pinned model version with its input/output schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Version of the packaging tool that built this version
    #[serde(default)]
    pub cog_version: Option<String>,

    /// OpenAPI document describing `Input` and `Output`
    #[serde(default)]
    pub openapi_schema: Option<Value>,
}

impl Version {
    /// `components.schemas.Output` from the OpenAPI document
    pub fn output_schema(&self) -> Option<&Value> {
        self.openapi_schema
            .as_ref()?
            .get("components")?
            .get("schemas")?
            .get("Output")
    }
}

/// A curated group of models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub slug: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Only populated when fetching a single collection
    #[serde(default)]
    pub models: Option<Vec<Model>>,
}

/// Account kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    User,
    Organization,
}

/// The account the API token belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "type")]
    pub kind: AccountType,

    pub username: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub github_url: Option<String>,
}

/// A hardware SKU models can run on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardware {
    pub sku: String,
    pub name: String,
}

impl fmt::Display for Hardware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.sku)
    }
}
