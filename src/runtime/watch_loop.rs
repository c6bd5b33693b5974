//! # Watch Loop
//!
//! Runs the kube-runtime controller for RDSInstance records.
//!
//! The controller serializes invocations per record key. Changes to owned
//! connection secrets trigger their RDSInstance again.

use crate::controller::reconciler::{ReconcilerError, RecordKey};
use crate::crd::RDSInstance;
use crate::observability;
use crate::runtime::context::ControllerContext;
use crate::runtime::error_policy::handle_reconciliation_error;
use anyhow::{Context, Result};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ListParams;
use kube::{Api, Client};
use kube_runtime::controller::{Action, Controller};
use kube_runtime::watcher;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reconcile one record on behalf of the controller
///
/// Each invocation gets its own cancellation token, cancelled on shutdown or
/// once the configured timeout elapses.
pub async fn reconcile_record(
    obj: Arc<RDSInstance>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcilerError> {
    let key = RecordKey::from_record(&obj);
    let cancel = ctx.shutdown.child_token();
    let timeout = ctx.config.reconcile_timeout();
    let timer = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        })
    };

    observability::metrics::increment_reconciliations();
    let start = Instant::now();
    let result = ctx.reconciler.reconcile(&key, &cancel).await;
    timer.abort();
    observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    let requeue = result?;
    observability::metrics::increment_requeues_total(requeue.as_str());
    Ok(ctx.action_for(&key.to_string(), requeue))
}

/// Run the controller until a shutdown signal is received
///
/// # Errors
///
/// Returns an error if the RDSInstance API is not served by the cluster,
/// usually because the CRD has not been installed. Failures inside the
/// controller stream are logged and never end the loop.
pub async fn run_watch_loop(client: Client, ctx: Arc<ControllerContext>) -> Result<()> {
    let instances: Api<RDSInstance> = Api::all(client.clone());
    let secrets: Api<Secret> = Api::all(client);

    instances
        .list(&ListParams::default().limit(1))
        .await
        .context("RDSInstance CRD is not queryable; is it installed?")?;

    info!("Starting RDSInstance controller");
    Controller::new(instances, watcher::Config::default())
        .owns(secrets, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile_record, handle_reconciliation_error, ctx.clone())
        .for_each(|result| {
            match result {
                Ok((object, action)) => {
                    debug!(?action, "Reconciled {}", object);
                }
                Err(e) => {
                    warn!("Controller stream error: {}", e);
                }
            }
            std::future::ready(())
        })
        .await;

    ctx.shutdown.cancel();
    info!("Controller stopped");
    Ok(())
}
