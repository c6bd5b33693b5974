//! # Reconciliation Logic
//!
//! Entry point invoked by the dispatcher for one RDSInstance key.
//!
//! The phase is derived from the record on every invocation; nothing about
//! progress is kept between calls. Every blocking call honours the supplied
//! cancellation token.

use crate::controller::reconciler::phases::{fail, InstancePhases, LifecyclePhase};
use crate::controller::reconciler::references::ReferenceResolver;
use crate::controller::reconciler::store::RecordStore;
use crate::controller::reconciler::types::{guarded, ReconcilerError, RecordKey, Requeue};
use crate::crd::{Condition, ConditionType, RDSInstance};
use crate::provider::Connector;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

/// Lifecycle reconciler for RDSInstance records
///
/// All collaborators are injected; the reconciler keeps no state of its own
/// between invocations.
pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    connector: Arc<dyn Connector>,
    resolver: Arc<dyn ReferenceResolver>,
    phases: Arc<dyn InstancePhases>,
    long_wait: Duration,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("long_wait", &self.long_wait)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// `long_wait` is the requeue delay used when references cannot be resolved
    pub fn new(
        store: Arc<dyn RecordStore>,
        connector: Arc<dyn Connector>,
        resolver: Arc<dyn ReferenceResolver>,
        phases: Arc<dyn InstancePhases>,
        long_wait: Duration,
    ) -> Self {
        Self {
            store,
            connector,
            resolver,
            phases,
            long_wait,
        }
    }

    /// Drive the record at `key` one step toward its desired state
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be fetched or persisted, or if
    /// `cancel` fires. Provider failures are recorded on the record instead.
    pub async fn reconcile(
        &self,
        key: &RecordKey,
        cancel: &CancellationToken,
    ) -> Result<Requeue, ReconcilerError> {
        let span = tracing::info_span!(
            "reconcile",
            resource.name = %key.name,
            resource.namespace = %key.namespace,
            resource.kind = "RDSInstance"
        );
        self.reconcile_internal(key, cancel).instrument(span).await
    }

    async fn reconcile_internal(
        &self,
        key: &RecordKey,
        cancel: &CancellationToken,
    ) -> Result<Requeue, ReconcilerError> {
        debug!("Reconciling RDSInstance {}", key);

        let fetched = guarded(cancel, self.store.get(key))
            .await?
            .map_err(|source| ReconcilerError::Fetch {
                key: key.clone(),
                source,
            })?;
        let Some(mut record) = fetched else {
            // Deleted records are garbage collected; nothing left to do
            debug!("RDSInstance {} no longer exists", key);
            return Ok(Requeue::Never);
        };

        let client = match guarded(cancel, self.connector.connect(&record)).await? {
            Ok(client) => client,
            Err(e) if e.is_blocked() => {
                info!("Provider of {} is not available: {}", key, e);
                record.set_conditions([Condition::reference_resolution_blocked(&e)]);
                self.persist(&record, cancel).await?;
                return Ok(Requeue::After(self.long_wait));
            }
            Err(e) => {
                let requeue = fail(&mut record, &e);
                self.persist(&record, cancel).await?;
                return Ok(requeue);
            }
        };

        if !record.is_condition_true(ConditionType::ReferencesResolved) {
            if let Err(e) = guarded(cancel, self.resolver.resolve(&record)).await? {
                let condition = if e.is_blocked() {
                    info!("References of {} are blocked: {}", key, e);
                    Condition::reference_resolution_blocked(&e)
                } else {
                    warn!("Cannot resolve references of {}: {}", key, e);
                    Condition::reconcile_error(&e)
                };
                record.set_conditions([condition]);
                self.persist(&record, cancel).await?;
                return Ok(Requeue::After(self.long_wait));
            }
            record.set_conditions([Condition::reference_resolution_success()]);
        }

        let phase = LifecyclePhase::of(&record);
        debug!(?phase, "Entering phase for {}", key);
        let requeue = match phase {
            LifecyclePhase::Delete => {
                self.phases
                    .delete(&mut record, client.as_ref(), cancel)
                    .await?
            }
            LifecyclePhase::Create => {
                self.phases
                    .create(&mut record, client.as_ref(), cancel)
                    .await?
            }
            LifecyclePhase::Sync => {
                self.phases
                    .sync(&mut record, client.as_ref(), cancel)
                    .await?
            }
        };

        self.persist(&record, cancel).await?;
        debug!(requeue = requeue.as_str(), "Reconciled RDSInstance {}", key);
        Ok(requeue)
    }

    /// Persist the record; failures are propagated, never retried here
    async fn persist(
        &self,
        record: &RDSInstance,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcilerError> {
        guarded(cancel, self.store.update(record))
            .await?
            .map_err(ReconcilerError::Persist)
    }
}
