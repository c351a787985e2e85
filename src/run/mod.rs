//! Run orchestrator
//!
//! `run` turns an identifier and an input into an output:
//! 1. Parse the identifier (no network on failure)
//! 2. Resolve the version: a pinned hash is fetched for its schema, a bare
//!    model uses its latest version, or the model endpoint when it has none
//! 3. Create the prediction and poll it at the configured interval
//! 4. Map the terminal status to output, `Model` or `Canceled`
//!
//! Runs share nothing but the read-only client configuration, so any number
//! of them can be in flight on one [`Client`].

pub mod schema;

use crate::client::Client;
use crate::errors::{Result, VaikerError};
use crate::identifier::ModelIdentifier;
use crate::resources::path_segment;
use crate::resources::{CreatePrediction, PredictionOptions};
use crate::streaming::PredictionStream;
use crate::types::{Job, Outcome, Prediction, Version, WebhookEvent};
use reqwest::Method;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Per-run settings
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stops polling (or streaming) with `Aborted`; the remote job keeps running
    pub cancel: Option<CancellationToken>,
    pub webhook: Option<String>,
    pub webhook_events_filter: Vec<WebhookEvent>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_webhook(mut self, url: impl Into<String>, events: Vec<WebhookEvent>) -> Self {
        self.webhook = Some(url.into());
        self.webhook_events_filter = events;
        self
    }

    fn prediction_options(&self, stream: bool) -> PredictionOptions {
        PredictionOptions {
            webhook: self.webhook.clone(),
            webhook_events_filter: self.webhook_events_filter.clone(),
            stream,
        }
    }

    fn check_cancel(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(VaikerError::Aborted),
            _ => Ok(()),
        }
    }
}

impl Client {
    /// Run a model and wait for its output
    pub async fn run(&self, identifier: &str, input: Value) -> Result<Value> {
        self.run_with(identifier, input, RunOptions::default()).await
    }

    pub async fn run_with(&self, identifier: &str, input: Value, options: RunOptions) -> Result<Value> {
        let id = ModelIdentifier::parse(identifier)?;
        let prediction_options = options.prediction_options(false);
        prediction_options.validate()?;
        options.check_cancel()?;

        debug!(model = %id, "starting run");
        let (prediction, version) = self
            .create_for_identifier(&id, input, prediction_options, true)
            .await?;

        let prediction = self.wait_job(prediction, options.cancel.as_ref()).await?;
        finish_run(prediction, version.as_ref())
    }

    /// Run a model and consume its output as server-sent events
    pub async fn stream(&self, identifier: &str, input: Value) -> Result<PredictionStream> {
        self.stream_with(identifier, input, RunOptions::default()).await
    }

    pub async fn stream_with(
        &self,
        identifier: &str,
        input: Value,
        options: RunOptions,
    ) -> Result<PredictionStream> {
        let id = ModelIdentifier::parse(identifier)?;
        let prediction_options = options.prediction_options(true);
        prediction_options.validate()?;
        options.check_cancel()?;

        let (prediction, _) = self
            .create_for_identifier(&id, input, prediction_options, false)
            .await?;
        self.stream_prediction(&prediction, options.cancel).await
    }

    /// Create the prediction for `id`, returning the version when it was looked up
    async fn create_for_identifier(
        &self,
        id: &ModelIdentifier,
        input: Value,
        options: PredictionOptions,
        with_schema: bool,
    ) -> Result<(Prediction, Option<Version>)> {
        let model = id.model();

        let version = match &id.version {
            Some(hash) if with_schema => Some(self.models().versions(&model)?.get(hash).await?),
            Some(_) => None,
            None => self.models().get(&model).await?.latest_version,
        };

        let version_id = id
            .version
            .clone()
            .or_else(|| version.as_ref().map(|v| v.id.clone()));

        let prediction = match version_id {
            Some(version_id) => {
                let request = CreatePrediction::new(version_id, input).with_options(options);
                self.predictions().create(request).await?
            }
            None => {
                debug!(%model, "no latest version, using model endpoint");
                self.models().predictions().create(&model, input, options).await?
            }
        };

        debug!(id = %prediction.id, status = %prediction.status, "prediction created");
        Ok((prediction, version))
    }

    /// Fetch the latest state of a job, rejecting backwards status moves
    pub(crate) async fn reload_job<J: Job>(&self, job: &J) -> Result<J> {
        let path = match job.urls().get.as_deref() {
            Some(url) => url.to_string(),
            None => format!("{}/{}", J::COLLECTION, path_segment("job id", job.id())?),
        };

        let next: J = self.request_json(Method::GET, &path, None).await?;
        job.status().transition(next.status())?;
        Ok(next)
    }

    /// Poll until the job is terminal.
    ///
    /// Sleeps for the poll interval before every refresh and stops at the
    /// first terminal observation. A fired token ends the wait with `Aborted`.
    pub(crate) async fn wait_job<J: Job>(
        &self,
        mut job: J,
        cancel: Option<&CancellationToken>,
    ) -> Result<J> {
        let interval = self.poll_interval();

        while !job.status().is_terminal() {
            let tick = async {
                tokio::time::sleep(interval).await;
                self.reload_job(&job).await
            };

            // the token races both the sleep and the in-flight refresh
            let next = match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            debug!(id = job.id(), "wait aborted");
                            return Err(VaikerError::Aborted);
                        }
                        next = tick => next?,
                    }
                }
                None => tick.await?,
            };

            job = next;
            debug!(id = job.id(), status = %job.status(), "polled job");
        }

        Ok(job)
    }
}

/// Map a terminal prediction to the value `run` returns
fn finish_run(prediction: Prediction, version: Option<&Version>) -> Result<Value> {
    match prediction.outcome() {
        Outcome::Succeeded(output) => Ok(match version {
            Some(version) => schema::transform_output(version, output),
            None => output,
        }),
        Outcome::Failed(message) => Err(VaikerError::Model {
            message,
            prediction: Box::new(prediction),
        }),
        Outcome::Canceled => Err(VaikerError::Canceled {
            prediction: Box::new(prediction),
        }),
        Outcome::Pending(status) => Err(VaikerError::InvalidTransition {
            from: status.to_string(),
            to: "terminal".to_string(),
        }),
    }
}
