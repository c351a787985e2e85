//! Event streaming module
//!
//! Provides the incremental SSE parser and the lazy event stream of a
//! prediction created with `stream: true`.

pub mod event;
pub mod parser;
pub mod stream;

// Re-export commonly used types
pub use event::{EventType, ServerSentEvent};
pub use parser::{SseParser, MAX_BUFFER_SIZE};
pub use stream::PredictionStream;

use crate::client::Client;
use crate::errors::{Result, VaikerError};
use crate::types::Prediction;
use tokio_util::sync::CancellationToken;
use tracing::debug;

impl Client {
    /// Open the event stream advertised by `prediction.urls.stream`
    pub(crate) async fn stream_prediction(
        &self,
        prediction: &Prediction,
        cancel: Option<CancellationToken>,
    ) -> Result<PredictionStream> {
        let Some(url) = prediction.urls.stream.as_deref() else {
            return Err(VaikerError::StreamingUnsupported {
                id: prediction.id.clone(),
            });
        };

        if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(VaikerError::Aborted);
        }

        let response = self.open_stream(url).await?;
        debug!(id = %prediction.id, %url, "event stream opened");

        Ok(PredictionStream::new(response.body, cancel))
    }
}
