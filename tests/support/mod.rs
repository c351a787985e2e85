//! In-memory transport and fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vaikerai::{ClientConfig, HttpRequest, HttpResponse, Result, Transport, VaikerError};

/// A scripted response
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Text(u16, &'static str),
    /// Body delivered chunk by chunk; `Err` fails the read with that message
    Chunks(Vec<std::result::Result<&'static str, &'static str>>),
    /// Never answers
    Stall,
}

impl Reply {
    fn into_response(self) -> HttpResponse {
        match self {
            Reply::Json(status, body) => {
                HttpResponse::from_bytes(status_code(status), body.to_string())
            }
            Reply::Text(status, body) => HttpResponse::from_bytes(status_code(status), body),
            Reply::Stall => unreachable!("stalled replies never produce a response"),
            Reply::Chunks(chunks) => {
                let body = futures_util::stream::iter(chunks.into_iter().map(|chunk| match chunk {
                    Ok(text) => Ok(Bytes::from_static(text.as_bytes())),
                    Err(message) => Err(VaikerError::Http {
                        message: message.to_string(),
                        events_delivered: None,
                    }),
                }));
                HttpResponse {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: Box::pin(body),
                }
            }
        }
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

/// A recorded request
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    /// Path and query, host stripped
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Call {
    pub fn json(&self) -> Value {
        serde_json::from_slice(self.body.as_deref().unwrap_or(b"null")).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone().unwrap_or_default().to_vec()).unwrap()
    }
}

/// Routes requests by method and path to scripted replies.
///
/// Each route answers with its replies in order and keeps repeating the
/// last one. Unknown routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(String, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &str, path: &str, replies: Vec<Reply>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), replies.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    /// `METHOD path` of every call, in order
    pub fn trace(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| format!("{} {}", call.method, call.path))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.as_str().to_string();
        let path = path_of(&request.url);

        self.calls.lock().unwrap().push(Call {
            method: method.clone(),
            path: path.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&(method, path)) {
                Some(replies) if replies.len() > 1 => replies.pop_front(),
                Some(replies) => replies.front().cloned(),
                None => None,
            }
        };

        Ok(match reply {
            Some(Reply::Stall) => futures_util::future::pending().await,
            Some(reply) => reply.into_response(),
            None => HttpResponse::from_bytes(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#),
        })
    }
}

fn path_of(url: &str) -> String {
    match url.split_once("://") {
        Some((_, rest)) => match rest.find('/') {
            Some(index) => rest[index..].to_string(),
            None => "/".to_string(),
        },
        None => url.to_string(),
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::default()
        .with_api_token("test-token")
        .with_poll_interval(Duration::from_millis(1))
}

pub fn client(transport: &Arc<MockTransport>) -> vaikerai::Client {
    vaikerai::Client::with_transport(config(), transport.clone()).unwrap()
}

pub fn blocking_client(transport: &Arc<MockTransport>) -> vaikerai::blocking::Client {
    vaikerai::blocking::Client::with_transport(config(), transport.clone()).unwrap()
}

pub fn prediction(id: &str, status: &str, output: Value, error: Value) -> Value {
    json!({
        "id": id,
        "model": "test/example",
        "version": "v1",
        "urls": {
            "get": format!("https://api.vaikerai.com/v1/predictions/{}", id),
            "cancel": format!("https://api.vaikerai.com/v1/predictions/{}/cancel", id),
        },
        "created_at": "2023-10-05T12:00:00.000000Z",
        "source": "api",
        "status": status,
        "input": {"text": "world"},
        "output": output,
        "error": error,
        "logs": "",
    })
}

pub fn streaming_prediction(id: &str) -> Value {
    let mut body = prediction(id, "starting", Value::Null, Value::Null);
    body["urls"]["stream"] = json!(format!("https://streaming.vaikerai.com/v1/streams/{}", id));
    body
}

pub fn version(id: &str, cog_version: &str, output_schema: Value) -> Value {
    json!({
        "id": id,
        "created_at": "2022-03-16T00:35:56.210272Z",
        "cog_version": cog_version,
        "openapi_schema": {
            "openapi": "3.0.2",
            "info": {"title": "Cog", "version": "0.1.0"},
            "paths": {},
            "components": {
                "schemas": {
                    "Input": {
                        "type": "object",
                        "title": "Input",
                        "required": ["text"],
                        "properties": {"text": {"type": "string", "title": "Text"}}
                    },
                    "Output": output_schema
                }
            }
        }
    })
}

pub fn model(owner: &str, name: &str, latest_version: Value) -> Value {
    json!({
        "url": format!("https://vaikerai.com/{}/{}", owner, name),
        "owner": owner,
        "name": name,
        "description": "An example model",
        "visibility": "public",
        "github_url": null,
        "paper_url": null,
        "license_url": null,
        "run_count": 12345,
        "cover_image_url": null,
        "default_example": null,
        "latest_version": latest_version,
    })
}
