//! Error types for the VaikerAI client
//!
//! Every fallible operation in the crate returns [`Result`]. Validation
//! failures are raised before any request leaves the process; everything
//! else maps to what the remote API or the transport reported.

use crate::types::Prediction;
use thiserror::Error;

/// Main error type for the VaikerAI client
#[derive(Error, Debug)]
pub enum VaikerError {
    /// Malformed identifier, cursor or parameter combination
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-2xx response from the API
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A run ended with status `failed`
    #[error("{message}")]
    Model {
        message: String,
        prediction: Box<Prediction>,
    },

    /// A run ended with status `canceled`
    #[error("Prediction {} was canceled", .prediction.id)]
    Canceled { prediction: Box<Prediction> },

    /// The job record carries no stream URL
    #[error("Streaming is not supported for prediction {id}")]
    StreamingUnsupported { id: String },

    /// Transport failure, including failures in the middle of an event stream
    #[error("HTTP request failed: {message}")]
    Http {
        message: String,
        events_delivered: Option<usize>,
    },

    /// A refresh observed a status moving backwards
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The caller's cancellation token fired
    #[error("Operation aborted by caller")]
    Aborted,

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, VaikerError>;

impl VaikerError {
    /// HTTP status code, when the error came from an API response
    pub fn status(&self) -> Option<u16> {
        match self {
            VaikerError::Api(err) => Some(err.status),
            _ => None,
        }
    }

    /// Terminal job record attached to run failures
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            VaikerError::Model { prediction, .. } | VaikerError::Canceled { prediction } => {
                Some(prediction.as_ref())
            }
            _ => None,
        }
    }

    /// Tag a transport error with how many stream events were already handed out
    pub(crate) fn with_events_delivered(self, delivered: usize) -> Self {
        match self {
            VaikerError::Http { message, .. } if delivered > 0 => VaikerError::Http {
                message,
                events_delivered: Some(delivered),
            },
            other => other,
        }
    }
}

impl From<reqwest::Error> for VaikerError {
    fn from(err: reqwest::Error) -> Self {
        VaikerError::Http {
            message: err.to_string(),
            events_delivered: None,
        }
    }
}

/// Convert anyhow errors (config loading) to VaikerError
impl From<anyhow::Error> for VaikerError {
    fn from(err: anyhow::Error) -> Self {
        VaikerError::Config(format!("{:#}", err))
    }
}

/// Error payload returned by the API alongside a non-2xx status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("VaikerAI API error (status: {status}, detail: {})", .detail.as_deref().unwrap_or("<none>"))]
pub struct ApiError {
    pub status: u16,
    pub title: Option<String>,
    pub detail: Option<String>,
    /// Raw response body
    pub body: String,
}

impl ApiError {
    /// Build from status and raw body, reading `{"detail": ...}` when present
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();

        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let detail = match parsed {
            Some(_) => field("detail"),
            None if body.trim().is_empty() => None,
            None => Some(body.trim().to_string()),
        };

        Self {
            status,
            title: field("title"),
            detail,
            body: body.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::from_body(400, r#"{"detail": "Client error occurred"}"#);
        let text = VaikerError::from(err).to_string();
        assert!(text.contains("status: 400"));
        assert!(text.contains("detail: Client error occurred"));
    }

    #[test]
    fn test_api_error_plain_text_body() {
        let err = ApiError::from_body(502, "Bad Gateway\n");
        assert_eq!(err.detail.as_deref(), Some("Bad Gateway"));
        assert!(err.title.is_none());
    }

    #[test]
    fn test_api_error_empty_json() {
        let err = ApiError::from_body(401, "{}");
        assert!(err.detail.is_none());
        assert!(err.to_string().contains("status: 401"));
    }

    #[test]
    fn test_status_accessor() {
        let err = VaikerError::from(ApiError::from_body(500, r#"{"detail":"boom"}"#));
        assert_eq!(err.status(), Some(500));
        assert_eq!(VaikerError::Aborted.status(), None);
    }

    #[test]
    fn test_events_delivered_tagging() {
        let err = VaikerError::Http {
            message: "connection reset".to_string(),
            events_delivered: None,
        };
        match err.with_events_delivered(3) {
            VaikerError::Http { events_delivered, .. } => assert_eq!(events_delivered, Some(3)),
            other => panic!("unexpected error: {other:?}"),
        }

        let untouched = VaikerError::Http {
            message: "refused".to_string(),
            events_delivered: None,
        }
        .with_events_delivered(0);
        assert!(matches!(
            untouched,
            VaikerError::Http { events_delivered: None, .. }
        ));
    }
}
