//! VaikerAI API client
//!
//! Owns the immutable configuration and the transport, builds requests
//! (auth, user agent, custom headers), maps non-2xx responses to
//! [`ApiError`] and hands out the namespace clients.

use crate::config::{ClientConfig, MIN_POLL_INTERVAL};
use crate::errors::{ApiError, Result, VaikerError};
use crate::http::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::resources::{
    AccountClient, CollectionsClient, HardwareClient, ModelsClient, PredictionsClient,
    TrainingsClient,
};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Request body variants the API accepts
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
}

impl RequestBody {
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }
}

/// Async client for the VaikerAI API
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    headers: Arc<HeaderMap>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .field("poll_interval", &self.config.poll_interval)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client from the environment, read once here
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Create a client with explicit configuration and the default transport
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let headers = default_headers(&config)?;
        Ok(Self {
            config: Arc::new(config),
            transport,
            headers: Arc::new(headers),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Effective poll interval, never below [`MIN_POLL_INTERVAL`]
    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval.max(MIN_POLL_INTERVAL)
    }

    pub fn base_url(&self) -> &str {
        self.config.base()
    }

    pub fn account(&self) -> AccountClient<'_> {
        AccountClient::new(self)
    }

    pub fn collections(&self) -> CollectionsClient<'_> {
        CollectionsClient::new(self)
    }

    pub fn hardware(&self) -> HardwareClient<'_> {
        HardwareClient::new(self)
    }

    pub fn models(&self) -> ModelsClient<'_> {
        ModelsClient::new(self)
    }

    pub fn predictions(&self) -> PredictionsClient<'_> {
        PredictionsClient::new(self)
    }

    pub fn trainings(&self) -> TrainingsClient<'_> {
        TrainingsClient::new(self)
    }

    /// Resolve a path against the base URL; absolute URLs pass through
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.config.base(), path)
        } else {
            format!("{}/{}", self.config.base(), path)
        }
    }

    /// Send a request and fail on non-2xx status
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<HttpResponse> {
        let mut request = self.build_request(method, path, body)?;
        request.timeout = Some(self.config.timeout);
        self.send(request).await
    }

    /// Send a request and decode the JSON response
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<T> {
        self.request(method, path, body).await?.json().await
    }

    /// Open a long-lived event stream
    pub(crate) async fn open_stream(&self, url: &str) -> Result<HttpResponse> {
        let mut request = self.build_request(Method::GET, url, None)?;
        request
            .headers
            .insert("accept", HeaderValue::from_static("text/event-stream"));
        request
            .headers
            .insert("cache-control", HeaderValue::from_static("no-store"));
        self.send(request).await
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<HttpRequest> {
        let mut request = HttpRequest::new(method, self.url(path));
        request.headers = (*self.headers).clone();

        match body {
            Some(RequestBody::Json(value)) => {
                request
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                request.body = Some(Bytes::from(serde_json::to_vec(&value)?));
            }
            Some(RequestBody::Text(text)) => {
                request
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                request.body = Some(Bytes::from(text));
            }
            None => {}
        }

        Ok(request)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let url = request.url.clone();

        let response = self.transport.send(request).await?;
        debug!(%method, %url, status = response.status.as_u16(), "vaikerai request");

        if !response.status.is_success() {
            let status = response.status.as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(VaikerError::Api(ApiError::from_body(status, &body)));
        }

        Ok(response)
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(token) = &config.api_token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| VaikerError::Config(format!("Invalid API token: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
    }

    let agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| VaikerError::Config(format!("Invalid user agent: {}", e)))?;
    headers.insert(USER_AGENT, agent);

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| VaikerError::Config(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| VaikerError::Config(format!("Invalid header value for '{}': {}", name, e)))?;
        headers.insert(name, value);
    }

    Ok(headers)
}
