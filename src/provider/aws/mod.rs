//! # AWS Provider
//!
//! Builds RDS clients from `Provider` records.
//!
//! - `auth`: shared-credentials parsing and SDK configuration
//! - `rds`: the RDS client itself

pub mod auth;
mod rds;

pub use rds::AwsRdsClient;

use crate::constants;
use crate::crd::{Provider, RDSInstance};
use crate::provider::{ConnectError, Connector, RdsClient};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::sync::Arc;
use tracing::debug;

use self::auth::{create_sdk_config, parse_credentials};

/// Connects to RDS using the credentials referenced by a record's Provider
#[derive(Clone)]
pub struct AwsConnector {
    client: Client,
    endpoint_url: Option<String>,
}

impl std::fmt::Debug for AwsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConnector")
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

impl AwsConnector {
    pub fn new(client: Client, endpoint_url: Option<String>) -> Self {
        Self {
            client,
            endpoint_url,
        }
    }
}

#[async_trait]
impl Connector for AwsConnector {
    async fn connect(&self, record: &RDSInstance) -> Result<Arc<dyn RdsClient>, ConnectError> {
        let namespace = record.provider_namespace();
        let provider_name = &record.spec.provider_ref.name;

        let providers: Api<Provider> = Api::namespaced(self.client.clone(), namespace);
        let provider = providers
            .get(provider_name)
            .await
            .map_err(|source| ConnectError::Provider {
                namespace: namespace.to_string(),
                name: provider_name.clone(),
                source,
            })?;

        let selector = &provider.spec.credentials_secret_ref;
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get(&selector.name)
            .await
            .map_err(|source| ConnectError::Secret {
                namespace: namespace.to_string(),
                name: selector.name.clone(),
                source,
            })?;

        let document = secret
            .data
            .as_ref()
            .and_then(|data| data.get(&selector.key))
            .ok_or_else(|| ConnectError::MissingCredentials {
                secret: selector.name.clone(),
                key: selector.key.clone(),
            })?;
        let document = std::str::from_utf8(&document.0)
            .map_err(|e| ConnectError::InvalidCredentials(e.to_string()))?;

        let credentials = parse_credentials(document, constants::DEFAULT_CREDENTIALS_PROFILE)?;
        let sdk_config = create_sdk_config(
            &provider.spec.region,
            &credentials,
            self.endpoint_url.as_deref(),
        )
        .await;

        debug!(
            provider = %provider_name,
            region = %provider.spec.region,
            "Connected to RDS"
        );
        Ok(Arc::new(AwsRdsClient::new(&sdk_config)))
    }
}
