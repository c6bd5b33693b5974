//! # Lifecycle Phases
//!
//! Create, sync and delete steps for an RDSInstance.
//!
//! Each phase mutates the record's status and finalizers and returns a
//! requeue hint; the reconciler persists the record once the phase returns.
//! Provider failures are recorded as a `ReconcileError` condition and answered
//! with an immediate requeue rather than surfaced as errors.

use crate::constants;
use crate::controller::meta::{add_finalizer, external_name, remove_finalizer};
use crate::controller::reconciler::password::generate_password;
use crate::controller::reconciler::publisher::{ConnectionDetails, ConnectionPublisher};
use crate::controller::reconciler::types::{guarded, ReconcilerError, Requeue};
use crate::crd::{Condition, RDSInstance, RDSInstanceState, ReclaimPolicy};
use crate::provider::RdsClient;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Phase of the lifecycle a record is in, derived from its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Create,
    Sync,
    Delete,
}

impl LifecyclePhase {
    /// Deletion intent wins; otherwise the provisioning marker decides
    pub fn of(record: &RDSInstance) -> Self {
        if record.is_being_deleted() {
            Self::Delete
        } else if record.instance_name().is_empty() {
            Self::Create
        } else {
            Self::Sync
        }
    }
}

/// Strategy for the provisioning phases
#[async_trait]
pub trait InstancePhases: Send + Sync {
    async fn create(
        &self,
        record: &mut RDSInstance,
        client: &dyn RdsClient,
        cancel: &CancellationToken,
    ) -> Result<Requeue, ReconcilerError>;

    async fn sync(
        &self,
        record: &mut RDSInstance,
        client: &dyn RdsClient,
        cancel: &CancellationToken,
    ) -> Result<Requeue, ReconcilerError>;

    async fn delete(
        &self,
        record: &mut RDSInstance,
        client: &dyn RdsClient,
        cancel: &CancellationToken,
    ) -> Result<Requeue, ReconcilerError>;
}

/// Record a failed attempt on the record and ask to be run again
pub fn fail(record: &mut RDSInstance, err: &dyn fmt::Display) -> Requeue {
    warn!(
        resource.name = record.name(),
        resource.namespace = record.namespace(),
        error = %err,
        "Reconcile attempt failed"
    );
    record.set_conditions([Condition::reconcile_error(err)]);
    Requeue::Immediately
}

fn detail(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// Phases for RDS instances provisioned through an [`RdsClient`]
pub struct ManagedInstancePhases {
    publisher: Arc<dyn ConnectionPublisher>,
    credential_length: usize,
}

impl std::fmt::Debug for ManagedInstancePhases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedInstancePhases")
            .field("credential_length", &self.credential_length)
            .finish_non_exhaustive()
    }
}

impl ManagedInstancePhases {
    pub fn new(publisher: Arc<dyn ConnectionPublisher>, credential_length: usize) -> Self {
        Self {
            publisher,
            credential_length,
        }
    }
}

#[async_trait]
impl InstancePhases for ManagedInstancePhases {
    async fn create(
        &self,
        record: &mut RDSInstance,
        client: &dyn RdsClient,
        cancel: &CancellationToken,
    ) -> Result<Requeue, ReconcilerError> {
        record.set_conditions([Condition::creating()]);

        let Some(name) = external_name(record) else {
            return Ok(fail(record, &"resource has no UID yet"));
        };
        let password = generate_password(self.credential_length);

        match guarded(cancel, client.create_instance(&name, &password, &record.spec)).await? {
            Ok(created) => {
                info!(instance = %name, "DB instance creation started");
                if let Some(provider_id) = created.provider_id {
                    record.status_mut().provider_id = Some(provider_id);
                }
                let details = ConnectionDetails::from([
                    (
                        constants::CONNECTION_USERNAME_KEY.to_string(),
                        detail(&record.spec.master_username),
                    ),
                    (
                        constants::CONNECTION_PASSWORD_KEY.to_string(),
                        detail(&password),
                    ),
                ]);
                if let Err(e) = guarded(cancel, self.publisher.publish(record, details)).await? {
                    return Ok(fail(record, &e));
                }
            }
            Err(e) if e.is_already_exists() => {
                // An existing instance was not created with the password generated
                // above, so it is not published
                info!(instance = %name, "DB instance already exists, not publishing credentials");
            }
            Err(e) => return Ok(fail(record, &e)),
        }

        record.status_mut().instance_name = name;
        add_finalizer(&mut record.metadata, constants::FINALIZER);
        record.set_conditions([Condition::reconcile_success()]);
        Ok(Requeue::Immediately)
    }

    async fn sync(
        &self,
        record: &mut RDSInstance,
        client: &dyn RdsClient,
        cancel: &CancellationToken,
    ) -> Result<Requeue, ReconcilerError> {
        let name = record.instance_name().to_string();
        let observed = match guarded(cancel, client.describe_instance(&name)).await? {
            Ok(observed) => observed,
            Err(e) => return Ok(fail(record, &e)),
        };

        let status = record.status_mut();
        status.state = Some(observed.state);
        status.endpoint = observed.endpoint;
        status.provider_id = observed.provider_id;

        match observed.state {
            RDSInstanceState::Creating => {
                record.set_conditions([Condition::creating(), Condition::reconcile_success()]);
                Ok(Requeue::Immediately)
            }
            RDSInstanceState::Failed => {
                record.set_conditions([Condition::unavailable(), Condition::reconcile_success()]);
                Ok(Requeue::Never)
            }
            RDSInstanceState::Available => {
                record.set_conditions([Condition::available()]);
                record.status_mut().set_bindable();

                let endpoint = record.status_mut().endpoint.clone().unwrap_or_default();
                let details = ConnectionDetails::from([
                    (
                        constants::CONNECTION_USERNAME_KEY.to_string(),
                        detail(&record.spec.master_username),
                    ),
                    (constants::CONNECTION_ENDPOINT_KEY.to_string(), detail(&endpoint)),
                ]);
                if let Err(e) = guarded(cancel, self.publisher.publish(record, details)).await? {
                    return Ok(fail(record, &e));
                }

                record.set_conditions([Condition::reconcile_success()]);
                Ok(Requeue::Never)
            }
        }
    }

    async fn delete(
        &self,
        record: &mut RDSInstance,
        client: &dyn RdsClient,
        cancel: &CancellationToken,
    ) -> Result<Requeue, ReconcilerError> {
        record.set_conditions([Condition::deleting()]);
        let name = record.instance_name().to_string();

        match record.spec.reclaim_policy {
            ReclaimPolicy::Delete if !name.is_empty() => {
                match guarded(cancel, client.delete_instance(&name)).await? {
                    Ok(()) => info!(instance = %name, "DB instance deletion started"),
                    Err(e) if e.is_not_found() => {
                        info!(instance = %name, "DB instance already gone");
                    }
                    Err(e) => return Ok(fail(record, &e)),
                }
            }
            ReclaimPolicy::Delete => {
                info!(resource.name = record.name(), "No DB instance was ever created");
            }
            ReclaimPolicy::Retain => {
                info!(instance = %name, "Retaining DB instance");
            }
        }

        remove_finalizer(&mut record.metadata, constants::FINALIZER);
        record.set_conditions([Condition::reconcile_success()]);
        Ok(Requeue::Never)
    }
}
