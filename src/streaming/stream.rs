//! Lazy, single-pass event sequence over an open connection
//!
//! The connection is dropped as soon as the `done` event is handed out, the
//! body ends, an error occurs, the cancellation token fires, or the consumer
//! drops the stream.

use crate::errors::{Result, VaikerError};
use crate::http::ByteStream;
use crate::streaming::event::ServerSentEvent;
use crate::streaming::parser::SseParser;
use futures_util::{ready, Stream};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::debug;

/// Events of one prediction stream
pub struct PredictionStream {
    body: Option<ByteStream>,
    parser: SseParser,
    pending: VecDeque<ServerSentEvent>,
    delivered: usize,
    finished: bool,
    /// Error held back until the events completed before it are handed out
    failed: Option<VaikerError>,
    cancelled: Option<Pin<Box<WaitForCancellationFutureOwned>>>,
}

impl std::fmt::Debug for PredictionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionStream")
            .field("open", &self.body.is_some())
            .field("delivered", &self.delivered)
            .field("finished", &self.finished)
            .finish()
    }
}

impl PredictionStream {
    pub(crate) fn new(body: ByteStream, cancel: Option<CancellationToken>) -> Self {
        Self {
            body: Some(body),
            parser: SseParser::new(),
            pending: VecDeque::new(),
            delivered: 0,
            finished: false,
            failed: None,
            cancelled: cancel.map(|token| Box::pin(token.cancelled_owned())),
        }
    }

    /// Number of events handed out so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Whether the underlying connection is still held
    pub fn is_open(&self) -> bool {
        self.body.is_some()
    }

    fn close(&mut self) {
        if self.body.take().is_some() {
            debug!(delivered = self.delivered, "event stream closed");
        }
        self.pending.clear();
        self.parser.clear();
        self.finished = true;
    }
}

impl Stream for PredictionStream {
    type Item = Result<ServerSentEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if let Some(event) = this.pending.pop_front() {
                this.delivered += 1;
                if event.is_done() {
                    this.close();
                }
                return Poll::Ready(Some(Ok(event)));
            }

            if let Some(err) = this.failed.take() {
                let delivered = this.delivered;
                this.close();
                return Poll::Ready(Some(Err(err.with_events_delivered(delivered))));
            }

            // registers the waker, so a fired token interrupts an idle read
            if let Some(cancelled) = this.cancelled.as_mut() {
                if cancelled.as_mut().poll(cx).is_ready() {
                    this.close();
                    return Poll::Ready(Some(Err(VaikerError::Aborted)));
                }
            }

            let Some(body) = this.body.as_mut() else {
                this.close();
                return Poll::Ready(None);
            };

            match ready!(body.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    if let Err(err) = this.parser.feed(&chunk, &mut this.pending) {
                        // events completed ahead of the overflow still go out first
                        this.body = None;
                        this.parser.clear();
                        this.failed = Some(err);
                    }
                }
                Some(Err(err)) => {
                    let delivered = this.delivered;
                    this.close();
                    return Poll::Ready(Some(Err(err.with_events_delivered(delivered))));
                }
                None => {
                    // unterminated trailing block is discarded
                    this.close();
                    return Poll::Ready(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::event::EventType;
    use bytes::Bytes;
    use futures_util::StreamExt;

    fn body(chunks: Vec<Result<&'static str>>) -> ByteStream {
        Box::pin(futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|chunk| chunk.map(|text| Bytes::from_static(text.as_bytes()))),
        ))
    }

    #[tokio::test]
    async fn test_done_is_last_element() {
        let mut stream = PredictionStream::new(
            body(vec![
                Ok("event: output\ndata: Hel"),
                Ok("lo\n\nevent: done\ndata: {}\n\nevent: output\ndata: ignored\n\n"),
            ]),
            None,
        );

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.event, EventType::Output);
        assert!(stream.is_open());

        let last = stream.next().await.unwrap().unwrap();
        assert!(last.is_done());
        assert!(!stream.is_open());

        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
        assert_eq!(stream.delivered(), 2);
    }

    #[tokio::test]
    async fn test_trailing_partial_block_discarded() {
        let stream = PredictionStream::new(
            body(vec![Ok("event: logs\ndata: a\n\nevent: output\ndata: cut off")]),
            None,
        );

        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().data, "a");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_tagged() {
        let mut stream = PredictionStream::new(
            body(vec![
                Ok("event: output\ndata: one\n\n"),
                Err(VaikerError::Http {
                    message: "connection reset".to_string(),
                    events_delivered: None,
                }),
            ]),
            None,
        );

        assert!(stream.next().await.unwrap().is_ok());
        match stream.next().await.unwrap() {
            Err(VaikerError::Http { events_delivered, .. }) => assert_eq!(events_delivered, Some(1)),
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(!stream.is_open());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_failure_before_any_event_is_untagged() {
        let mut stream = PredictionStream::new(
            body(vec![Err(VaikerError::Http {
                message: "connection reset".to_string(),
                events_delivered: None,
            })]),
            None,
        );

        assert!(matches!(
            stream.next().await,
            Some(Err(VaikerError::Http { events_delivered: None, .. }))
        ));
    }

    #[tokio::test]
    async fn test_cancellation_checked_before_read() {
        let token = CancellationToken::new();
        let mut stream = PredictionStream::new(
            body(vec![Ok("event: output\ndata: one\n\n"), Ok("event: output\ndata: two\n\n")]),
            Some(token.clone()),
        );

        assert_eq!(stream.next().await.unwrap().unwrap().data, "one");
        token.cancel();

        assert!(matches!(stream.next().await, Some(Err(VaikerError::Aborted))));
        assert!(!stream.is_open());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_idle_read() {
        let token = CancellationToken::new();
        let mut stream = PredictionStream::new(
            Box::pin(futures_util::stream::pending::<Result<Bytes>>()),
            Some(token.clone()),
        );

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            token.cancel();
        });

        let item = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
            .await
            .expect("cancel did not wake the pending read");
        assert!(matches!(item, Some(Err(VaikerError::Aborted))));
        assert!(!stream.is_open());
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_events_before_overflow_are_delivered() {
        let oversized = "x".repeat(crate::streaming::parser::MAX_BUFFER_SIZE + 1);
        let chunk = format!("event: output\ndata: complete\n\n{oversized}");
        let mut stream = PredictionStream::new(
            Box::pin(futures_util::stream::iter(vec![Ok::<_, VaikerError>(Bytes::from(chunk))])),
            None,
        );

        assert_eq!(stream.next().await.unwrap().unwrap().data, "complete");
        assert!(!stream.is_open());
        match stream.next().await.unwrap() {
            Err(VaikerError::Http { events_delivered, .. }) => assert_eq!(events_delivered, Some(1)),
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(stream.next().await.is_none());
    }
}
