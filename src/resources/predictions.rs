//! Predictions namespace
//!
//! - `POST /v1/predictions`
//! - `GET /v1/predictions[/{id}]`
//! - `POST /v1/predictions/{id}/cancel`

use crate::client::{Client, RequestBody};
use crate::errors::{Result, VaikerError};
use crate::identifier::ModelIdentifier;
use crate::pagination::cursor_path;
use crate::resources::path_segment;
use crate::streaming::PredictionStream;
use crate::types::{Page, Prediction, WebhookEvent};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Options shared by every prediction-creating endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub webhook_events_filter: Vec<WebhookEvent>,

    /// Ask the server for an event stream URL
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl PredictionOptions {
    pub fn streaming() -> Self {
        Self {
            stream: true,
            ..Self::default()
        }
    }

    pub fn with_webhook(mut self, url: impl Into<String>, events: Vec<WebhookEvent>) -> Self {
        self.webhook = Some(url.into());
        self.webhook_events_filter = events;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.webhook.is_none() && !self.webhook_events_filter.is_empty() {
            return Err(VaikerError::Validation(
                "webhook_events_filter requires a webhook URL".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of `POST /v1/predictions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePrediction {
    /// Version hash; `owner/name:hash` is accepted and reduced to the hash
    pub version: String,

    pub input: Value,

    #[serde(flatten)]
    pub options: PredictionOptions,
}

impl CreatePrediction {
    pub fn new(version: impl Into<String>, input: Value) -> Self {
        Self {
            version: version.into(),
            input,
            options: PredictionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PredictionOptions) -> Self {
        self.options = options;
        self
    }

    fn normalized(mut self) -> Result<Self> {
        if self.version.contains('/') {
            let identifier = ModelIdentifier::parse(&self.version)?;
            self.version = identifier.version.ok_or_else(|| {
                VaikerError::Validation(format!(
                    "'{}' does not pin a version; use models().predictions() for unpinned models",
                    self.version
                ))
            })?;
        }

        if self.version.is_empty() {
            return Err(VaikerError::Validation("version cannot be empty".to_string()));
        }

        self.options.validate()?;
        Ok(self)
    }
}

/// Prediction lifecycle operations
#[derive(Debug, Clone, Copy)]
pub struct PredictionsClient<'a> {
    client: &'a Client,
}

impl<'a> PredictionsClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a prediction against a pinned version
    pub async fn create(&self, request: CreatePrediction) -> Result<Prediction> {
        let request = request.normalized()?;
        self.client
            .request_json(
                Method::POST,
                "/v1/predictions",
                Some(RequestBody::json(&request)?),
            )
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Prediction> {
        let id = path_segment("prediction id", id)?;
        self.client
            .request_json(Method::GET, &format!("/v1/predictions/{}", id), None)
            .await
    }

    /// One page of predictions; `None` starts from the first page
    pub async fn list(&self, cursor: Option<&str>) -> Result<Page<Prediction>> {
        let path = cursor_path(self.client.base_url(), "/v1/predictions", cursor)?;
        self.client.request_json(Method::GET, &path, None).await
    }

    /// Ask the service to stop the prediction
    pub async fn cancel(&self, id: &str) -> Result<Prediction> {
        let id = path_segment("prediction id", id)?;
        self.client
            .request_json(Method::POST, &format!("/v1/predictions/{}/cancel", id), None)
            .await
    }

    /// Fetch the latest state of `prediction`, rejecting backwards status moves
    pub async fn reload(&self, prediction: &Prediction) -> Result<Prediction> {
        self.client.reload_job(prediction).await
    }

    /// Poll until the prediction reaches a terminal status
    pub async fn wait(&self, prediction: Prediction) -> Result<Prediction> {
        self.client.wait_job(prediction, None).await
    }

    /// Like [`wait`](Self::wait), giving up with `Aborted` once `cancel` fires
    pub async fn wait_with_cancel(
        &self,
        prediction: Prediction,
        cancel: &CancellationToken,
    ) -> Result<Prediction> {
        self.client.wait_job(prediction, Some(cancel)).await
    }

    /// Open the event stream of a prediction created with `stream: true`
    pub async fn stream(&self, prediction: &Prediction) -> Result<PredictionStream> {
        self.client.stream_prediction(prediction, None).await
    }
}
