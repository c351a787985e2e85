//! Trainings namespace
//!
//! - `POST /v1/models/{owner}/{name}/versions/{version}/trainings`
//! - `GET /v1/trainings[/{id}]`
//! - `POST /v1/trainings/{id}/cancel`

use crate::client::{Client, RequestBody};
use crate::errors::{Result, VaikerError};
use crate::identifier::ModelIdentifier;
use crate::pagination::cursor_path;
use crate::resources::path_segment;
use crate::types::{Page, Training, WebhookEvent};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// A training request
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTraining {
    /// Base model, `owner/name`
    pub model: String,
    /// Version hash of the base model
    pub version: String,
    pub input: Value,
    /// Model that receives the trained version, `owner/name`
    pub destination: String,
    pub webhook: Option<String>,
    pub webhook_events_filter: Vec<WebhookEvent>,
}

#[derive(Serialize)]
struct TrainingBody<'r> {
    input: &'r Value,
    destination: &'r str,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook: Option<&'r str>,
    #[serde(skip_serializing_if = "no_events")]
    webhook_events_filter: &'r [WebhookEvent],
}

fn no_events(events: &&[WebhookEvent]) -> bool {
    events.is_empty()
}

impl CreateTraining {
    pub fn new(
        model: impl Into<String>,
        version: impl Into<String>,
        input: Value,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            version: version.into(),
            input,
            destination: destination.into(),
            webhook: None,
            webhook_events_filter: Vec::new(),
        }
    }

    /// Build from a pinned `owner/name:version` identifier
    pub fn from_identifier(identifier: &str, input: Value, destination: impl Into<String>) -> Result<Self> {
        let id = ModelIdentifier::parse(identifier)?;
        let version = id.version.clone().ok_or_else(|| {
            VaikerError::Validation(format!(
                "'{}' must pin a version as 'owner/name:version'",
                identifier
            ))
        })?;
        Ok(Self::new(id.model(), version, input, destination))
    }

    pub fn with_webhook(mut self, url: impl Into<String>, events: Vec<WebhookEvent>) -> Self {
        self.webhook = Some(url.into());
        self.webhook_events_filter = events;
        self
    }

    /// Request path, checking every component before anything is sent
    fn path(&self) -> Result<String> {
        let model = ModelIdentifier::parse_model(&self.model)?;
        let version = path_segment("version id", &self.version)?;

        ModelIdentifier::parse_model(&self.destination).map_err(|_| {
            VaikerError::Validation(format!(
                "invalid destination '{}': expected 'owner/name'",
                self.destination
            ))
        })?;

        if self.webhook.is_none() && !self.webhook_events_filter.is_empty() {
            return Err(VaikerError::Validation(
                "webhook_events_filter requires a webhook URL".to_string(),
            ));
        }

        Ok(format!(
            "/v1/models/{}/{}/versions/{}/trainings",
            model.owner, model.name, version
        ))
    }

    fn body(&self) -> Result<RequestBody> {
        RequestBody::json(&TrainingBody {
            input: &self.input,
            destination: &self.destination,
            webhook: self.webhook.as_deref(),
            webhook_events_filter: &self.webhook_events_filter,
        })
    }
}

/// Training lifecycle operations
#[derive(Debug, Clone, Copy)]
pub struct TrainingsClient<'a> {
    client: &'a Client,
}

impl<'a> TrainingsClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: CreateTraining) -> Result<Training> {
        let path = request.path()?;
        self.client
            .request_json(Method::POST, &path, Some(request.body()?))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Training> {
        let id = path_segment("training id", id)?;
        self.client
            .request_json(Method::GET, &format!("/v1/trainings/{}", id), None)
            .await
    }

    pub async fn list(&self, cursor: Option<&str>) -> Result<Page<Training>> {
        let path = cursor_path(self.client.base_url(), "/v1/trainings", cursor)?;
        self.client.request_json(Method::GET, &path, None).await
    }

    pub async fn cancel(&self, id: &str) -> Result<Training> {
        let id = path_segment("training id", id)?;
        self.client
            .request_json(Method::POST, &format!("/v1/trainings/{}/cancel", id), None)
            .await
    }

    pub async fn reload(&self, training: &Training) -> Result<Training> {
        self.client.reload_job(training).await
    }

    /// Poll until the training reaches a terminal status
    pub async fn wait(&self, training: Training) -> Result<Training> {
        self.client.wait_job(training, None).await
    }

    pub async fn wait_with_cancel(
        &self,
        training: Training,
        cancel: &CancellationToken,
    ) -> Result<Training> {
        self.client.wait_job(training, Some(cancel)).await
    }
}
