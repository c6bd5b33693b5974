//! # Reference Resolution
//!
//! Checks that the records an RDSInstance points at exist before anything is
//! provisioned: the Provider and its credentials secret, plus the optional
//! claim and class references.

use crate::crd::{ObjectReference, Provider, RDSInstance};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{ApiResource, DynamicObject};
use kube::core::GroupVersionKind;
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// A referenced record is missing or incomplete; retrying soon will not help
    #[error("{0}")]
    Blocked(String),
    /// Lookup failed for another reason
    #[error("cannot resolve references: {0}")]
    Transient(String),
}

impl ResolveError {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn resolve(&self, record: &RDSInstance) -> Result<(), ResolveError>;
}

/// Resolves references against the Kubernetes API
#[derive(Clone)]
pub struct KubeReferenceResolver {
    client: Client,
}

impl std::fmt::Debug for KubeReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeReferenceResolver").finish_non_exhaustive()
    }
}

fn classify(what: &str, err: kube::Error) -> ResolveError {
    match err {
        kube::Error::Api(ref response) if response.code == 404 => {
            ResolveError::Blocked(format!("referenced {what} not found"))
        }
        other => ResolveError::Transient(format!("{what}: {other}")),
    }
}

fn has_credentials_key(secret: &Secret, key: &str) -> bool {
    secret
        .data
        .as_ref()
        .is_some_and(|data| data.contains_key(key))
}

impl KubeReferenceResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn resolve_provider(&self, record: &RDSInstance) -> Result<(), ResolveError> {
        let namespace = record.provider_namespace();
        let name = &record.spec.provider_ref.name;
        let what = format!("provider {namespace}/{name}");

        let providers: Api<Provider> = Api::namespaced(self.client.clone(), namespace);
        let provider = providers.get(name).await.map_err(|e| classify(&what, e))?;

        let selector = &provider.spec.credentials_secret_ref;
        let what = format!("credentials secret {namespace}/{}", selector.name);
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get(&selector.name)
            .await
            .map_err(|e| classify(&what, e))?;

        if !has_credentials_key(&secret, &selector.key) {
            return Err(ResolveError::Blocked(format!(
                "{what} has no key {}",
                selector.key
            )));
        }
        Ok(())
    }

    async fn resolve_object(
        &self,
        record: &RDSInstance,
        reference: &ObjectReference,
    ) -> Result<(), ResolveError> {
        let (group, version) = match reference.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", reference.api_version.as_str()),
        };
        let gvk = GroupVersionKind::gvk(group, version, &reference.kind);
        let resource = ApiResource::from_gvk(&gvk);
        let namespace = reference
            .namespace
            .as_deref()
            .unwrap_or_else(|| record.namespace());
        let what = format!("{} {}/{}", reference.kind, namespace, reference.name);

        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &resource);
        api.get(&reference.name)
            .await
            .map(|_| ())
            .map_err(|e| classify(&what, e))
    }
}

#[async_trait]
impl ReferenceResolver for KubeReferenceResolver {
    async fn resolve(&self, record: &RDSInstance) -> Result<(), ResolveError> {
        self.resolve_provider(record).await?;
        for reference in [&record.spec.claim_ref, &record.spec.class_ref]
            .into_iter()
            .flatten()
        {
            self.resolve_object(record, reference).await?;
        }
        debug!(
            resource.name = record.name(),
            resource.namespace = record.namespace(),
            "References resolved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "test".to_string(),
            reason: "Test".to_string(),
            code,
        })
    }

    #[test]
    fn test_missing_reference_is_blocked() {
        let err = classify("provider default/aws", api_error(404));
        assert!(err.is_blocked());
        assert_eq!(err.to_string(), "referenced provider default/aws not found");
    }

    #[test]
    fn test_other_lookup_failures_are_transient() {
        let err = classify("provider default/aws", api_error(500));
        assert!(!err.is_blocked());
    }

    #[test]
    fn test_credentials_key_must_be_present() {
        let secret = Secret {
            data: Some(BTreeMap::from([(
                "credentials".to_string(),
                ByteString(b"[default]".to_vec()),
            )])),
            ..Secret::default()
        };
        assert!(has_credentials_key(&secret, "credentials"));
        assert!(!has_credentials_key(&secret, "token"));
        assert!(!has_credentials_key(&Secret::default(), "credentials"));
    }

    #[test]
    fn test_blocked_is_distinguished() {
        assert!(ResolveError::Blocked("provider missing".to_string()).is_blocked());
        assert!(!ResolveError::Transient("timeout".to_string()).is_blocked());
    }

    #[test]
    fn test_transient_message() {
        let err = ResolveError::Transient("provider default/aws: connection reset".to_string());
        assert_eq!(
            err.to_string(),
            "cannot resolve references: provider default/aws: connection reset"
        );
    }
}
