use hyper::StatusCode;

use crate::dispatch::UnsupportedOperationKind;

/// Why a single task iteration stopped early. The runner logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("{method} {path} failed")]
    Transport {
        method: String,
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("{path} returned {status}")]
    Status { path: String, status: StatusCode },
    #[error("failed to decode response of {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("identifier pool index out of range (pool size {len})")]
    PoolOutOfRange { len: usize },
    #[error("session has not been started")]
    SessionInactive,
    #[error(transparent)]
    UnsupportedKind(#[from] UnsupportedOperationKind),
}
