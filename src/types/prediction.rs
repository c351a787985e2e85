//! Prediction and training records
//!
//! Both are jobs tracked by the service through the same status lifecycle:
//!
//! ```text
//! starting ──► processing ──► succeeded | failed | canceled
//!     └──────────────────────────┘
//! ```
//!
//! Terminal states never move again.

use crate::errors::{Result, VaikerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Job status as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }

    fn rank(&self) -> u8 {
        match self {
            PredictionStatus::Starting => 0,
            PredictionStatus::Processing => 1,
            _ => 2,
        }
    }

    /// Validate an observed status change.
    ///
    /// Staying put is always allowed. Non-terminal states may only move
    /// forward; terminal states may not change at all.
    pub fn transition(&self, next: PredictionStatus) -> Result<PredictionStatus> {
        let valid = *self == next || (!self.is_terminal() && next.rank() >= self.rank());
        if valid {
            Ok(next)
        } else {
            Err(VaikerError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control URLs attached to a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUrls {
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
    /// Present only when the job was created with `stream: true`
    #[serde(default)]
    pub stream: Option<String>,
}

/// What a job settled on, with exactly one payload per variant
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Not terminal yet
    Pending(PredictionStatus),
    Succeeded(Value),
    Failed(String),
    Canceled,
}

/// A prediction resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,

    /// Owning model, `owner/name`
    #[serde(default)]
    pub model: Option<String>,

    /// Version hash the prediction runs against
    #[serde(default)]
    pub version: Option<String>,

    pub status: PredictionStatus,

    #[serde(default)]
    pub input: Option<Value>,

    #[serde(default)]
    pub output: Option<Value>,

    #[serde(default, deserialize_with = "deserialize_error")]
    pub error: Option<String>,

    #[serde(default)]
    pub logs: Option<String>,

    #[serde(default)]
    pub metrics: Option<Value>,

    /// `api` or `web`
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub urls: JobUrls,
}

impl Prediction {
    /// Collapse the optional output/error fields into a single outcome
    pub fn outcome(&self) -> Outcome {
        job_outcome(self.status, &self.output, &self.error)
    }
}

/// A training resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    /// Destination model, `owner/name`
    #[serde(default)]
    pub destination: Option<String>,

    pub status: PredictionStatus,

    #[serde(default)]
    pub input: Option<Value>,

    #[serde(default)]
    pub output: Option<Value>,

    #[serde(default, deserialize_with = "deserialize_error")]
    pub error: Option<String>,

    #[serde(default)]
    pub logs: Option<String>,

    #[serde(default)]
    pub metrics: Option<Value>,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub urls: JobUrls,
}

impl Training {
    pub fn outcome(&self) -> Outcome {
        job_outcome(self.status, &self.output, &self.error)
    }

    /// Destination model, falling back to the version the training produced.
    ///
    /// A finished training reports `output.version` as `owner/name:hash`.
    pub fn destination(&self) -> Option<String> {
        if let Some(destination) = &self.destination {
            return Some(destination.clone());
        }

        let produced = self.output.as_ref()?.get("version")?.as_str()?;
        let model = produced.split_once(':').map_or(produced, |(model, _)| model);
        Some(model.to_string())
    }
}

/// Anything polled through the job lifecycle
pub trait Job: Clone + Send + Sync + serde::de::DeserializeOwned + 'static {
    /// Collection path, e.g. `/v1/predictions`
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn status(&self) -> PredictionStatus;
    fn urls(&self) -> &JobUrls;
}

impl Job for Prediction {
    const COLLECTION: &'static str = "/v1/predictions";

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> PredictionStatus {
        self.status
    }

    fn urls(&self) -> &JobUrls {
        &self.urls
    }
}

impl Job for Training {
    const COLLECTION: &'static str = "/v1/trainings";

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> PredictionStatus {
        self.status
    }

    fn urls(&self) -> &JobUrls {
        &self.urls
    }
}

fn job_outcome(status: PredictionStatus, output: &Option<Value>, error: &Option<String>) -> Outcome {
    match status {
        PredictionStatus::Succeeded => Outcome::Succeeded(output.clone().unwrap_or(Value::Null)),
        PredictionStatus::Failed => {
            Outcome::Failed(error.clone().unwrap_or_else(|| "Prediction failed".to_string()))
        }
        PredictionStatus::Canceled => Outcome::Canceled,
        pending => Outcome::Pending(pending),
    }
}

/// The API reports errors as a string, but older records carry objects
fn deserialize_error<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(message)) => Some(message),
        Some(other) => Some(other.to_string()),
    })
}

/// Webhook event kinds a job can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEvent {
    Start,
    Output,
    Logs,
    Completed,
}
