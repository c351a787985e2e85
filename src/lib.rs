//! VaikerAI client
//!
//! Async and blocking access to the VaikerAI inference API.
//!
//! # Architecture
//!
//! - **Resources**: typed records and one namespace client per endpoint group
//! - **Run**: create a prediction, poll it to a terminal state, post-process output
//! - **Streaming**: incremental server-sent-event parsing over an open connection
//! - **Pagination**: cursor walking shared by the async and blocking flavours
//!
//! ```no_run
//! # async fn example() -> vaikerai::Result<()> {
//! let client = vaikerai::Client::new()?;
//! let output = client
//!     .run("stability-ai/sdxl:39ed52f2", serde_json::json!({"prompt": "a corgi"}))
//!     .await?;
//! println!("{output}");
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod identifier;
pub mod pagination;
pub mod resources;
pub mod run;
pub mod streaming;
pub mod types;

// Re-export commonly used types
pub use client::{Client, RequestBody};
pub use config::ClientConfig;
pub use errors::{ApiError, Result, VaikerError};
pub use http::{HttpRequest, HttpResponse, Transport};
pub use identifier::ModelIdentifier;
pub use pagination::{paginate, PageCursor};
pub use resources::{CreateModel, CreatePrediction, CreateTraining, PredictionOptions};
pub use run::RunOptions;
pub use streaming::{EventType, PredictionStream, ServerSentEvent};
pub use types::{
    Account, Collection, Hardware, Model, Outcome, Page, Prediction, PredictionStatus, Training,
    Version, Visibility, WebhookEvent,
};

pub use tokio_util::sync::CancellationToken;
