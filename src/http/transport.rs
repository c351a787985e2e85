//! reqwest-backed transport
//!
//! - Connection pooling via a shared `reqwest::Client`
//! - Response bodies exposed as chunk streams (`bytes_stream`)
//! - Whole-request timeouts only when the request asks for one, so event
//!   streams can stay open indefinitely

use crate::config::ClientConfig;
use crate::errors::{Result, VaikerError};
use crate::http::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

/// Default transport over reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(VaikerError::from));

        Ok(HttpResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
