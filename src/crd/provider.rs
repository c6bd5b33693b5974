//! # Provider Configuration
//!
//! AWS provider records holding the region and a reference to the
//! credentials used to talk to RDS.

use crate::constants;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// AWS Provider Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: aws.microscaler.io/v1alpha1
/// kind: Provider
/// metadata:
///   name: aws-provider
///   namespace: crossplane-system
/// spec:
///   region: eu-west-1
///   credentialsSecretRef:
///     name: aws-creds
///     key: credentials
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "Provider",
    group = "aws.microscaler.io",
    version = "v1alpha1",
    namespaced,
    printcolumn = r#"{"name":"Region", "type":"string", "jsonPath":".spec.region"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// AWS region RDS calls are made in (e.g., "us-east-1", "eu-west-1")
    pub region: String,
    /// Secret holding an AWS shared-credentials document
    pub credentials_secret_ref: SecretKeySelector,
}

/// Selects a key of a Secret in the Provider's namespace
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Key within the secret data
    #[serde(default = "default_credentials_key")]
    pub key: String,
}

fn default_credentials_key() -> String {
    constants::DEFAULT_CREDENTIALS_KEY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_key_defaults() {
        let spec: ProviderSpec = serde_json::from_value(serde_json::json!({
            "region": "us-east-1",
            "credentialsSecretRef": {"name": "aws-creds"}
        }))
        .unwrap();

        assert_eq!(spec.credentials_secret_ref.key, "credentials");
        assert_eq!(spec.region, "us-east-1");
    }
}
