//! Routes named operations to a [`StatementStore`] and reports each one as a
//! [`RequestEvent`].
//!
//! The operation name is only a telemetry label. Routing depends solely on the
//! [`OperationKind`]: reads go to [`StatementStore::snapshot_read`], writes to
//! [`StatementStore::run_in_transaction`]. Store failures never reach the
//! caller, they end up in the event's `exception`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Instant, SystemTime};

use crate::store::{StatementStore, StoreError};
use crate::telemetry::{EventSink, RequestEvent};

pub const STORE_REQUEST_TYPE: &str = "store";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Read,
    Write,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported operation kind '{0}', expected 'read' or 'write'")]
pub struct UnsupportedOperationKind(pub String);

impl FromStr for OperationKind {
    type Err = UnsupportedOperationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(OperationKind::Read),
            "write" => Ok(OperationKind::Write),
            other => Err(UnsupportedOperationKind(other.to_string())),
        }
    }
}

pub struct Dispatcher<S, K> {
    store: S,
    sink: K,
    context: HashMap<String, String>,
}

impl<S, K> Dispatcher<S, K>
where
    S: StatementStore,
    K: EventSink,
{
    #[must_use]
    pub fn new(store: S, sink: K) -> Self {
        Self {
            store,
            sink,
            context: HashMap::new(),
        }
    }

    /// Attached to every emitted event.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parses `mode` and runs the statement. An unknown mode is returned as an
    /// error before anything runs and emits no event. Otherwise yields the row
    /// count, or `None` when the store failed.
    pub async fn dispatch(
        &self,
        name: &str,
        mode: &str,
        statement: &str,
    ) -> Result<Option<u64>, UnsupportedOperationKind> {
        let kind: OperationKind = mode.parse()?;
        Ok(self.execute(name, kind, statement).await.ok())
    }

    /// Runs the statement and emits exactly one event describing the outcome.
    pub async fn execute(
        &self,
        name: &str,
        kind: OperationKind,
        statement: &str,
    ) -> Result<u64, StoreError> {
        let mut event = RequestEvent::new(STORE_REQUEST_TYPE, name, SystemTime::now());
        event.context = self.context.clone();
        let start = Instant::now();
        let res = match kind {
            OperationKind::Read => self.store.snapshot_read(statement).await,
            OperationKind::Write => self.store.run_in_transaction(statement).await,
        };
        event.response_time = start.elapsed();
        match &res {
            Ok(rows) => event.response_length = *rows,
            Err(e) => {
                tracing::debug!(op = name, kind = %kind, error = %e, "store operation failed");
                event.exception = Some(anyhow::anyhow!("{kind} {name}: {e}"));
            }
        }
        self.sink.fire(event);
        res
    }
}
