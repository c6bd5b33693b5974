//! # Error Policy
//!
//! Error handling and backoff for the controller watch loop.

use crate::controller::reconciler::{ReconcilerError, RecordKey};
use crate::crd::RDSInstance;
use crate::observability;
use crate::runtime::context::ControllerContext;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Handle reconciliation errors with per-record Fibonacci backoff
///
/// A conflict means the record changed while we worked on it; the retry
/// re-fetches it.
pub fn handle_reconciliation_error(
    obj: Arc<RDSInstance>,
    error: &ReconcilerError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let key = RecordKey::from_record(&obj).to_string();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = obj.name(),
        resource.namespace = obj.namespace(),
        error = %error
    );
    let _error_guard = error_span.enter();

    match error {
        e if e.is_conflict() => {
            info!("RDSInstance {} was modified concurrently, retrying", key);
        }
        ReconcilerError::Cancelled => {
            warn!("Reconciliation of {} was cancelled", key);
        }
        e => {
            error!("Reconciliation error for {}: {:?}", key, e);
        }
    }
    observability::metrics::increment_reconciliation_errors();

    let delay = ctx.backoff.next(&key);
    info!(
        "🔄 Retrying {} in {}s (error count: {}, trigger source: error-backoff)",
        key,
        delay.as_secs(),
        ctx.backoff.error_count(&key)
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}
