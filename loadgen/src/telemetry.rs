//! Request events and where they go.
//!
//! Every HTTP request and every dispatched store operation produces exactly one
//! [`RequestEvent`]. Events are handed to an [`EventSink`]; the runner uses a
//! [`ChannelSink`] feeding a single [`aggregator_task`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::statistics::Statistics;

pub struct RequestEvent {
    /// `GET`, `POST`, ... for HTTP, `store` for dispatched statements.
    pub request_type: String,
    pub name: String,
    pub start_time: SystemTime,
    pub response_time: Duration,
    /// Body bytes for HTTP, row count for store operations. Zero on failure.
    pub response_length: u64,
    pub response: Option<Bytes>,
    pub context: HashMap<String, String>,
    pub exception: Option<anyhow::Error>,
}

impl RequestEvent {
    #[must_use]
    pub fn new(request_type: impl Into<String>, name: impl Into<String>, start_time: SystemTime) -> Self {
        Self {
            request_type: request_type.into(),
            name: name.into(),
            start_time,
            response_time: Duration::ZERO,
            response_length: 0,
            response: None,
            context: HashMap::new(),
            exception: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exception.is_none()
    }
}

impl fmt::Debug for RequestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEvent")
            .field("request_type", &self.request_type)
            .field("name", &self.name)
            .field("response_time", &self.response_time)
            .field("response_length", &self.response_length)
            .field("context", &self.context)
            .field("exception", &self.exception.as_ref().map(|e| format!("{e:#}")))
            .finish_non_exhaustive()
    }
}

pub trait EventSink: Send + Sync {
    fn fire(&self, event: RequestEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    #[inline]
    fn fire(&self, event: RequestEvent) {
        (**self).fire(event);
    }
}

/// Forwards events to the aggregation task.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RequestEvent>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RequestEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn fire(&self, event: RequestEvent) {
        if let Err(e) = self.tx.send(event) {
            let dropped = e.0;
            tracing::debug!(op = %dropped.name, "aggregator gone, dropping event");
        }
    }
}

/// Folds events into [`Statistics`] until every sender is dropped.
pub async fn aggregator_task(mut rx: mpsc::UnboundedReceiver<RequestEvent>) -> Statistics {
    let mut stats = Statistics::default();
    while let Some(event) = rx.recv().await {
        if let Some(e) = &event.exception {
            let err = format!("{e:#}");
            tracing::debug!(
                request_type = %event.request_type,
                op = %event.name,
                error = %err,
                "request failed"
            );
        }
        stats.record(&event);
    }
    stats
}
