//! # Connection Publishing
//!
//! Writes connection details (username, password, endpoint) to the record's
//! connection secret.

use crate::crd::RDSInstance;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Key/value connection details, e.g. `username` → `admin`
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("secret {0} is controlled by another resource")]
    NotOwned(String),
    #[error("cannot publish connection secret {secret}: {source}")]
    Kube {
        secret: String,
        #[source]
        source: kube::Error,
    },
}

/// Durable store for connection details, keyed by record
#[async_trait]
pub trait ConnectionPublisher: Send + Sync {
    /// Merge `details` into the record's connection secret; idempotent for
    /// identical payloads
    async fn publish(
        &self,
        record: &RDSInstance,
        details: ConnectionDetails,
    ) -> Result<(), PublishError>;
}

/// Publishes connection details to a Kubernetes Secret owned by the record
#[derive(Clone)]
pub struct SecretPublisher {
    client: Client,
}

impl std::fmt::Debug for SecretPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretPublisher").finish_non_exhaustive()
    }
}

impl SecretPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Whether `meta` names a controller other than the record with `uid`
fn controlled_by_other(meta: &ObjectMeta, uid: Option<&str>) -> bool {
    meta.owner_references
        .iter()
        .flatten()
        .find(|owner| owner.controller == Some(true))
        .is_some_and(|owner| Some(owner.uid.as_str()) != uid)
}

fn to_secret_data(details: ConnectionDetails) -> BTreeMap<String, ByteString> {
    details
        .into_iter()
        .map(|(key, value)| (key, ByteString(value)))
        .collect()
}

#[async_trait]
impl ConnectionPublisher for SecretPublisher {
    async fn publish(
        &self,
        record: &RDSInstance,
        details: ConnectionDetails,
    ) -> Result<(), PublishError> {
        let name = record.connection_secret_name().to_string();
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), record.namespace());
        let kube_err = |source| PublishError::Kube {
            secret: name.clone(),
            source,
        };
        let data = to_secret_data(details);

        match secrets.get_opt(&name).await.map_err(kube_err)? {
            None => {
                let secret = Secret {
                    metadata: ObjectMeta {
                        name: Some(name.clone()),
                        namespace: record.metadata.namespace.clone(),
                        owner_references: record.controller_owner_ref(&()).map(|r| vec![r]),
                        ..ObjectMeta::default()
                    },
                    data: Some(data),
                    ..Secret::default()
                };
                secrets
                    .create(&PostParams::default(), &secret)
                    .await
                    .map_err(kube_err)?;
                debug!(secret = %name, "Created connection secret");
            }
            Some(existing) => {
                if controlled_by_other(&existing.metadata, record.metadata.uid.as_deref()) {
                    return Err(PublishError::NotOwned(name.clone()));
                }

                // Merge patch keeps keys published earlier (e.g. the password)
                let patch = serde_json::json!({ "data": data });
                secrets
                    .patch(
                        &name,
                        &PatchParams::apply(crate::constants::CONTROLLER_NAME),
                        &Patch::Merge(&patch),
                    )
                    .await
                    .map_err(kube_err)?;
                debug!(secret = %name, "Updated connection secret");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    fn owned_by(uid: &str, controller: Option<bool>) -> ObjectMeta {
        ObjectMeta {
            owner_references: Some(vec![OwnerReference {
                api_version: "database.aws.microscaler.io/v1alpha2".to_string(),
                kind: "RDSInstance".to_string(),
                name: "orders-db".to_string(),
                uid: uid.to_string(),
                controller,
                ..OwnerReference::default()
            }]),
            ..ObjectMeta::default()
        }
    }

    #[test]
    fn test_secret_controlled_by_other_record_is_refused() {
        assert!(controlled_by_other(&owned_by("uid-other", Some(true)), Some("uid-1")));
    }

    #[test]
    fn test_secret_controlled_by_same_record_is_accepted() {
        assert!(!controlled_by_other(&owned_by("uid-1", Some(true)), Some("uid-1")));
    }

    #[test]
    fn test_secret_without_controller_is_accepted() {
        assert!(!controlled_by_other(&ObjectMeta::default(), Some("uid-1")));
        assert!(!controlled_by_other(&owned_by("uid-other", None), Some("uid-1")));
        assert!(!controlled_by_other(&owned_by("uid-other", Some(false)), Some("uid-1")));
    }

    #[test]
    fn test_secret_data_is_base64_on_the_wire() {
        let details = ConnectionDetails::from([("username".to_string(), b"admin".to_vec())]);
        let value = serde_json::to_value(to_secret_data(details)).unwrap();
        assert_eq!(value["username"], "YWRtaW4=");
    }
}
