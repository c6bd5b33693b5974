//! # Record Store
//!
//! Fetches and persists RDSInstance records.
//!
//! Updates are optimistic: a write against a stale resourceVersion fails with
//! [`StoreError::Conflict`] instead of overwriting concurrent changes.

use crate::controller::reconciler::types::RecordKey;
use crate::crd::RDSInstance;
use async_trait::async_trait;
use kube::api::PostParams;
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} was modified concurrently")]
    Conflict(String),
    #[error(transparent)]
    Kube(kube::Error),
    #[error("cannot encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    fn from_kube(key: &RecordKey, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 409 => {
                Self::Conflict(key.to_string())
            }
            other => Self::Kube(other),
        }
    }
}

/// Whether a failed status write hit a record purged by its own final update
///
/// Removing the last finalizer of a deleted record lets the API server drop it
/// before the status subresource is written.
fn is_purged(record: &RDSInstance, err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
        && record.is_being_deleted()
        && record.metadata.finalizers.as_deref().unwrap_or_default().is_empty()
}

/// Source of truth for records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record; `None` if it no longer exists
    async fn get(&self, key: &RecordKey) -> Result<Option<RDSInstance>, StoreError>;

    /// Persist metadata (finalizers) and status of `record`
    async fn update(&self, record: &RDSInstance) -> Result<(), StoreError>;
}

/// Record store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeRecordStore {
    client: Client,
}

impl std::fmt::Debug for KubeRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeRecordStore").finish_non_exhaustive()
    }
}

impl KubeRecordStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<RDSInstance> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl RecordStore for KubeRecordStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<RDSInstance>, StoreError> {
        self.api(&key.namespace)
            .get_opt(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(key, e))
    }

    async fn update(&self, record: &RDSInstance) -> Result<(), StoreError> {
        let key = RecordKey::from_record(record);
        let api = self.api(&key.namespace);
        let params = PostParams {
            field_manager: Some(crate::constants::CONTROLLER_NAME.to_string()),
            ..PostParams::default()
        };

        // Status is a subresource: the main write carries metadata, the second one status
        let updated = api
            .replace(&key.name, &params, record)
            .await
            .map_err(|e| StoreError::from_kube(&key, e))?;

        let mut with_status = record.clone();
        with_status.metadata.resource_version = updated.metadata.resource_version;
        let body = serde_json::to_vec(&with_status)?;

        match api.replace_status(&key.name, &params, body).await {
            Ok(_) => Ok(()),
            Err(e) if is_purged(record, &e) => {
                debug!("RDSInstance {} was purged, skipping status update", key);
                Ok(())
            }
            Err(e) => Err(StoreError::from_kube(&key, e)),
        }
    }
}
