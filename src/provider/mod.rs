//! # Providers
//!
//! Seam between the reconciler and the service that hosts the database.
//!
//! - [`RdsClient`]: create, describe and delete DB instances
//! - [`Connector`]: build an [`RdsClient`] for a given record
//!
//! Provider responses are validated here, so the reconciler only ever sees
//! states from the closed [`RDSInstanceState`] set.

pub mod aws;

use crate::crd::{RDSInstance, RDSInstanceSpec, RDSInstanceState, UnknownInstanceState};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by provider calls
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("DB instance {0} already exists")]
    AlreadyExists(String),
    #[error("DB instance {0} not found")]
    NotFound(String),
    #[error(transparent)]
    UnexpectedState(#[from] UnknownInstanceState),
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result of a create call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedInstance {
    /// Provider identifier of the new instance, when reported
    pub provider_id: Option<String>,
}

/// Observed state of an external instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedInstance {
    pub state: RDSInstanceState,
    pub endpoint: Option<String>,
    pub provider_id: Option<String>,
}

impl ObservedInstance {
    /// Validate a raw provider response
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnexpectedState`] if `status` is not a known state.
    pub fn from_provider(
        status: &str,
        endpoint: Option<String>,
        provider_id: Option<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            state: status.parse()?,
            endpoint,
            provider_id,
        })
    }
}

/// Client for the managed database service
#[async_trait]
pub trait RdsClient: Send + Sync {
    /// Create an instance named `name`; idempotent by name
    async fn create_instance(
        &self,
        name: &str,
        password: &str,
        spec: &RDSInstanceSpec,
    ) -> Result<CreatedInstance, ProviderError>;

    /// Fetch the current state of instance `name`
    async fn describe_instance(&self, name: &str) -> Result<ObservedInstance, ProviderError>;

    /// Delete instance `name`
    async fn delete_instance(&self, name: &str) -> Result<(), ProviderError>;
}

/// Errors building a provider client
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("cannot get provider {namespace}/{name}: {source}")]
    Provider {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error("cannot get credentials secret {namespace}/{name}: {source}")]
    Secret {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error("credentials secret {secret} has no key {key}")]
    MissingCredentials { secret: String, key: String },
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl ConnectError {
    /// The Provider or its credentials are missing rather than unreachable
    pub fn is_blocked(&self) -> bool {
        match self {
            Self::Provider { source, .. } | Self::Secret { source, .. } => {
                matches!(source, kube::Error::Api(response) if response.code == 404)
            }
            Self::MissingCredentials { .. } => true,
            Self::InvalidCredentials(_) => false,
        }
    }
}

/// Builds provider clients from a record's provider reference
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, record: &RDSInstance) -> Result<Arc<dyn RdsClient>, ConnectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_known_state() {
        let observed = ObservedInstance::from_provider(
            "available",
            Some("db.example.com".to_string()),
            Some("arn:aws:rds:us-east-1:123456789012:db:postgres-1".to_string()),
        )
        .unwrap();

        assert_eq!(observed.state, RDSInstanceState::Available);
        assert_eq!(observed.endpoint.as_deref(), Some("db.example.com"));
    }

    #[test]
    fn test_from_provider_unknown_state() {
        let err = ObservedInstance::from_provider("rebooting", None, None).unwrap_err();

        assert!(matches!(err, ProviderError::UnexpectedState(_)));
        assert!(!err.is_not_found());
        assert!(!err.is_already_exists());
        assert_eq!(err.to_string(), "unexpected resource status: rebooting");
    }

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "test".to_string(),
            reason: "Test".to_string(),
            code,
        })
    }

    #[test]
    fn test_missing_provider_blocks_connect() {
        let missing = ConnectError::Provider {
            namespace: "default".to_string(),
            name: "aws".to_string(),
            source: api_error(404),
        };
        let unavailable = ConnectError::Secret {
            namespace: "default".to_string(),
            name: "aws-creds".to_string(),
            source: api_error(503),
        };

        assert!(missing.is_blocked());
        assert!(!unavailable.is_blocked());
        assert!(ConnectError::MissingCredentials {
            secret: "default/aws-creds".to_string(),
            key: "credentials".to_string(),
        }
        .is_blocked());
        assert!(!ConnectError::InvalidCredentials("no profile".to_string()).is_blocked());
    }
}
