//! Models namespace
//!
//! - `GET|POST /v1/models`, `QUERY /v1/models` (search)
//! - `GET|DELETE /v1/models/{owner}/{name}`
//! - `/v1/models/{owner}/{name}/versions[/{id}]`
//! - `POST /v1/models/{owner}/{name}/predictions`

use crate::client::{Client, RequestBody};
use crate::errors::{Result, VaikerError};
use crate::identifier::ModelIdentifier;
use crate::pagination::cursor_path;
use crate::resources::path_segment;
use crate::resources::predictions::PredictionOptions;
use crate::types::{Model, Page, Prediction, Version, Visibility};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

/// Body of `POST /v1/models`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateModel {
    pub owner: String,
    pub name: String,
    pub visibility: Visibility,
    /// Hardware SKU, see `hardware().list()`
    pub hardware: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
}

impl CreateModel {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
        hardware: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            visibility,
            hardware: hardware.into(),
            description: None,
            github_url: None,
            paper_url: None,
            license_url: None,
            cover_image_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self) -> Result<()> {
        path_segment("model owner", &self.owner)?;
        path_segment("model name", &self.name)?;
        if self.hardware.is_empty() {
            return Err(VaikerError::Validation("hardware cannot be empty".to_string()));
        }
        Ok(())
    }
}

fn model_path(model: &str) -> Result<String> {
    let id = ModelIdentifier::parse_model(model)?;
    Ok(format!("/v1/models/{}/{}", id.owner, id.name))
}

/// Model lookups and management
#[derive(Debug, Clone, Copy)]
pub struct ModelsClient<'a> {
    client: &'a Client,
}

impl<'a> ModelsClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetch `owner/name`
    pub async fn get(&self, model: &str) -> Result<Model> {
        let path = model_path(model)?;
        self.client.request_json(Method::GET, &path, None).await
    }

    /// One page of public models; `None` starts from the first page
    pub async fn list(&self, cursor: Option<&str>) -> Result<Page<Model>> {
        let path = cursor_path(self.client.base_url(), "/v1/models", cursor)?;
        self.client.request_json(Method::GET, &path, None).await
    }

    pub async fn create(&self, request: CreateModel) -> Result<Model> {
        request.validate()?;
        self.client
            .request_json(Method::POST, "/v1/models", Some(RequestBody::json(&request)?))
            .await
    }

    /// Full-text model search
    pub async fn search(&self, query: &str) -> Result<Page<Model>> {
        if query.trim().is_empty() {
            return Err(VaikerError::Validation("search query cannot be empty".to_string()));
        }

        let method = Method::from_bytes(b"QUERY")
            .map_err(|e| VaikerError::Validation(format!("invalid HTTP method: {}", e)))?;

        self.client
            .request_json(method, "/v1/models", Some(RequestBody::Text(query.to_string())))
            .await
    }

    /// Delete a model; it must have no versions left
    pub async fn delete(&self, model: &str) -> Result<()> {
        let path = model_path(model)?;
        self.client.request(Method::DELETE, &path, None).await?;
        Ok(())
    }

    /// Versions of `owner/name`
    pub fn versions(&self, model: &str) -> Result<ModelVersionsClient<'a>> {
        Ok(ModelVersionsClient {
            client: self.client,
            base: format!("{}/versions", model_path(model)?),
        })
    }

    /// Predictions against a model's current version
    pub fn predictions(&self) -> ModelPredictionsClient<'a> {
        ModelPredictionsClient {
            client: self.client,
        }
    }
}

/// Versions of a single model
#[derive(Debug, Clone)]
pub struct ModelVersionsClient<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> ModelVersionsClient<'a> {
    pub async fn get(&self, id: &str) -> Result<Version> {
        let id = path_segment("version id", id)?;
        self.client
            .request_json(Method::GET, &format!("{}/{}", self.base, id), None)
            .await
    }

    pub async fn list(&self, cursor: Option<&str>) -> Result<Page<Version>> {
        let path = cursor_path(self.client.base_url(), &self.base, cursor)?;
        self.client.request_json(Method::GET, &path, None).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = path_segment("version id", id)?;
        self.client
            .request(Method::DELETE, &format!("{}/{}", self.base, id), None)
            .await?;
        Ok(())
    }
}

/// Predictions addressed by model rather than version
#[derive(Debug, Clone, Copy)]
pub struct ModelPredictionsClient<'a> {
    client: &'a Client,
}

impl<'a> ModelPredictionsClient<'a> {
    /// Create a prediction on `owner/name`, letting the service pick the version
    pub async fn create(
        &self,
        model: &str,
        input: Value,
        options: PredictionOptions,
    ) -> Result<Prediction> {
        options.validate()?;
        let path = format!("{}/predictions", model_path(model)?);

        let mut body = json!({ "input": input });
        if let (Value::Object(body), Value::Object(extra)) = (&mut body, serde_json::to_value(&options)?) {
            body.extend(extra);
        }

        self.client
            .request_json(Method::POST, &path, Some(RequestBody::Json(body)))
            .await
    }
}
