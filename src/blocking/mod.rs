//! Blocking client
//!
//! Mirrors the async API one-to-one. Every call drives the same async code
//! on a private current-thread runtime, so both flavours send identical
//! requests in identical order and return identical results.
//!
//! Calling into this module from inside an async runtime is unsupported.

use crate::config::ClientConfig;
use crate::errors::Result;
use crate::http::Transport;
use crate::pagination::PageCursor;
use crate::resources::{CreateModel, CreatePrediction, CreateTraining, PredictionOptions};
use crate::run::RunOptions;
use crate::streaming::{PredictionStream, ServerSentEvent};
use crate::types::{Account, Collection, Hardware, Model, Page, Prediction, Training, Version};
use futures_util::StreamExt;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Blocking client for the VaikerAI API
#[derive(Debug, Clone)]
pub struct Client {
    inner: crate::Client,
    runtime: Arc<Runtime>,
}

impl Client {
    /// Create a client from the environment
    pub fn new() -> Result<Self> {
        Self::from_async(crate::Client::new()?)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::from_async(crate::Client::with_config(config)?)
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::from_async(crate::Client::with_transport(config, transport)?)
    }

    /// Wrap an existing async client; both share configuration and transport
    pub fn from_async(inner: crate::Client) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    /// The async client underneath
    pub fn as_async(&self) -> &crate::Client {
        &self.inner
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval()
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn account(&self) -> AccountClient<'_> {
        AccountClient { client: self }
    }

    pub fn collections(&self) -> CollectionsClient<'_> {
        CollectionsClient { client: self }
    }

    pub fn hardware(&self) -> HardwareClient<'_> {
        HardwareClient { client: self }
    }

    pub fn models(&self) -> ModelsClient<'_> {
        ModelsClient { client: self }
    }

    pub fn predictions(&self) -> PredictionsClient<'_> {
        PredictionsClient { client: self }
    }

    pub fn trainings(&self) -> TrainingsClient<'_> {
        TrainingsClient { client: self }
    }

    /// Run a model and wait for its output
    pub fn run(&self, identifier: &str, input: Value) -> Result<Value> {
        self.block_on(self.inner.run(identifier, input))
    }

    pub fn run_with(&self, identifier: &str, input: Value, options: RunOptions) -> Result<Value> {
        self.block_on(self.inner.run_with(identifier, input, options))
    }

    /// Run a model and iterate over its events
    pub fn stream(&self, identifier: &str, input: Value) -> Result<EventIter> {
        self.stream_with(identifier, input, RunOptions::default())
    }

    pub fn stream_with(
        &self,
        identifier: &str,
        input: Value,
        options: RunOptions,
    ) -> Result<EventIter> {
        let stream = self.block_on(self.inner.stream_with(identifier, input, options))?;
        Ok(self.events(stream))
    }

    fn events(&self, stream: PredictionStream) -> EventIter {
        EventIter {
            stream,
            runtime: Arc::clone(&self.runtime),
        }
    }
}

/// Blocking iterator over a prediction's events
#[derive(Debug)]
pub struct EventIter {
    stream: PredictionStream,
    runtime: Arc<Runtime>,
}

impl EventIter {
    /// Number of events handed out so far
    pub fn delivered(&self) -> usize {
        self.stream.delivered()
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_open()
    }
}

impl Iterator for EventIter {
    type Item = Result<ServerSentEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}

/// Walk every page of a listing, in order.
///
/// Same cursor handling as [`crate::paginate`]: `list_fn` gets `None` first,
/// then each `next` cursor until one is absent. The first error ends it.
pub fn paginate<T, F>(list_fn: F) -> Pages<T, F>
where
    F: FnMut(Option<String>) -> Result<Page<T>>,
{
    Pages {
        list_fn,
        cursor: PageCursor::new(),
        _marker: std::marker::PhantomData,
    }
}

/// Iterator returned by [`paginate`]
pub struct Pages<T, F> {
    list_fn: F,
    cursor: PageCursor,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, F> Iterator for Pages<T, F>
where
    F: FnMut(Option<String>) -> Result<Page<T>>,
{
    type Item = Result<Page<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let request = self.cursor.request()?;

        match (self.list_fn)(request) {
            Ok(page) => {
                self.cursor.advance(&page);
                Some(Ok(page))
            }
            Err(err) => {
                self.cursor = PageCursor::Done;
                Some(Err(err))
            }
        }
    }
}

/// Blocking `account` namespace
#[derive(Debug, Clone, Copy)]
pub struct AccountClient<'a> {
    client: &'a Client,
}

impl AccountClient<'_> {
    pub fn current(&self) -> Result<Account> {
        self.client.block_on(self.client.inner.account().current())
    }
}

/// Blocking `collections` namespace
#[derive(Debug, Clone, Copy)]
pub struct CollectionsClient<'a> {
    client: &'a Client,
}

impl CollectionsClient<'_> {
    pub fn get(&self, slug: &str) -> Result<Collection> {
        self.client.block_on(self.client.inner.collections().get(slug))
    }

    pub fn list(&self, cursor: Option<&str>) -> Result<Page<Collection>> {
        self.client.block_on(self.client.inner.collections().list(cursor))
    }
}

/// Blocking `hardware` namespace
#[derive(Debug, Clone, Copy)]
pub struct HardwareClient<'a> {
    client: &'a Client,
}

impl HardwareClient<'_> {
    pub fn list(&self) -> Result<Vec<Hardware>> {
        self.client.block_on(self.client.inner.hardware().list())
    }
}

/// Blocking `models` namespace
#[derive(Debug, Clone, Copy)]
pub struct ModelsClient<'a> {
    client: &'a Client,
}

impl<'a> ModelsClient<'a> {
    pub fn get(&self, model: &str) -> Result<Model> {
        self.client.block_on(self.client.inner.models().get(model))
    }

    pub fn list(&self, cursor: Option<&str>) -> Result<Page<Model>> {
        self.client.block_on(self.client.inner.models().list(cursor))
    }

    pub fn create(&self, request: CreateModel) -> Result<Model> {
        self.client.block_on(self.client.inner.models().create(request))
    }

    pub fn search(&self, query: &str) -> Result<Page<Model>> {
        self.client.block_on(self.client.inner.models().search(query))
    }

    pub fn delete(&self, model: &str) -> Result<()> {
        self.client.block_on(self.client.inner.models().delete(model))
    }

    pub fn versions(&self, model: &str) -> Result<ModelVersionsClient<'a>> {
        // validates the identifier up front, like the async accessor
        self.client.inner.models().versions(model)?;
        Ok(ModelVersionsClient {
            client: self.client,
            model: model.to_string(),
        })
    }

    pub fn predictions(&self) -> ModelPredictionsClient<'a> {
        ModelPredictionsClient {
            client: self.client,
        }
    }
}

/// Blocking versions of a single model
#[derive(Debug, Clone)]
pub struct ModelVersionsClient<'a> {
    client: &'a Client,
    model: String,
}

impl ModelVersionsClient<'_> {
    pub fn get(&self, id: &str) -> Result<Version> {
        let inner = &self.client.inner;
        self.client
            .block_on(async { inner.models().versions(&self.model)?.get(id).await })
    }

    pub fn list(&self, cursor: Option<&str>) -> Result<Page<Version>> {
        let inner = &self.client.inner;
        self.client
            .block_on(async { inner.models().versions(&self.model)?.list(cursor).await })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let inner = &self.client.inner;
        self.client
            .block_on(async { inner.models().versions(&self.model)?.delete(id).await })
    }
}

/// Blocking predictions addressed by model
#[derive(Debug, Clone, Copy)]
pub struct ModelPredictionsClient<'a> {
    client: &'a Client,
}

impl ModelPredictionsClient<'_> {
    pub fn create(&self, model: &str, input: Value, options: PredictionOptions) -> Result<Prediction> {
        self.client.block_on(
            self.client
                .inner
                .models()
                .predictions()
                .create(model, input, options),
        )
    }
}

/// Blocking `predictions` namespace
#[derive(Debug, Clone, Copy)]
pub struct PredictionsClient<'a> {
    client: &'a Client,
}

impl PredictionsClient<'_> {
    pub fn create(&self, request: CreatePrediction) -> Result<Prediction> {
        self.client.block_on(self.client.inner.predictions().create(request))
    }

    pub fn get(&self, id: &str) -> Result<Prediction> {
        self.client.block_on(self.client.inner.predictions().get(id))
    }

    pub fn list(&self, cursor: Option<&str>) -> Result<Page<Prediction>> {
        self.client.block_on(self.client.inner.predictions().list(cursor))
    }

    pub fn cancel(&self, id: &str) -> Result<Prediction> {
        self.client.block_on(self.client.inner.predictions().cancel(id))
    }

    pub fn reload(&self, prediction: &Prediction) -> Result<Prediction> {
        self.client.block_on(self.client.inner.predictions().reload(prediction))
    }

    pub fn wait(&self, prediction: Prediction) -> Result<Prediction> {
        self.client.block_on(self.client.inner.predictions().wait(prediction))
    }

    pub fn stream(&self, prediction: &Prediction) -> Result<EventIter> {
        let stream = self
            .client
            .block_on(self.client.inner.predictions().stream(prediction))?;
        Ok(self.client.events(stream))
    }
}

/// Blocking `trainings` namespace
#[derive(Debug, Clone, Copy)]
pub struct TrainingsClient<'a> {
    client: &'a Client,
}

impl TrainingsClient<'_> {
    pub fn create(&self, request: CreateTraining) -> Result<Training> {
        self.client.block_on(self.client.inner.trainings().create(request))
    }

    pub fn get(&self, id: &str) -> Result<Training> {
        self.client.block_on(self.client.inner.trainings().get(id))
    }

    pub fn list(&self, cursor: Option<&str>) -> Result<Page<Training>> {
        self.client.block_on(self.client.inner.trainings().list(cursor))
    }

    pub fn cancel(&self, id: &str) -> Result<Training> {
        self.client.block_on(self.client.inner.trainings().cancel(id))
    }

    pub fn reload(&self, training: &Training) -> Result<Training> {
        self.client.block_on(self.client.inner.trainings().reload(training))
    }

    pub fn wait(&self, training: Training) -> Result<Training> {
        self.client.block_on(self.client.inner.trainings().wait(training))
    }
}
