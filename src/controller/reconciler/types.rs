//! # Reconciler Types
//!
//! Shared types for the lifecycle reconciler: record keys, requeue hints,
//! the error type, and cancellation-aware call wrapping.

use crate::controller::reconciler::store::StoreError;
use crate::crd::RDSInstance;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Identity of a record in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub namespace: String,
    pub name: String,
}

impl RecordKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn from_record(record: &RDSInstance) -> Self {
        Self::new(record.namespace(), record.name())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// When the dispatcher should invoke the reconciler again
///
/// A hint only: the dispatcher owns actual timing and backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Run again promptly (work is in flight or the attempt failed)
    Immediately,
    /// Run again after a fixed delay
    After(Duration),
    /// No follow-up needed; periodic resync will revisit the record
    Never,
}

impl Requeue {
    /// Label used for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediately => "immediate",
            Self::After(_) => "delayed",
            Self::Never => "none",
        }
    }
}

/// Errors propagated to the dispatcher
///
/// Failures of provider calls never show up here: they are recorded as
/// conditions on the record and answered with a requeue hint.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("cannot get managed resource {key}: {source}")]
    Fetch {
        key: RecordKey,
        #[source]
        source: StoreError,
    },
    #[error("cannot update managed resource status: {0}")]
    Persist(#[source] StoreError),
    #[error("reconcile cancelled")]
    Cancelled,
}

impl ReconcilerError {
    /// The record changed underneath us; re-fetch and retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Persist(StoreError::Conflict(_)))
    }
}

/// Run `fut` unless `cancel` fires first
///
/// # Errors
///
/// Returns [`ReconcilerError::Cancelled`] if the token is (or becomes) cancelled.
pub async fn guarded<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ReconcilerError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ReconcilerError::Cancelled),
        output = fut => Ok(output),
    }
}
