//! # Custom Resource Definitions
//!
//! CRD types for the RDS Instance Controller.
//!
//! `RDSInstance` is the managed resource: its spec is the desired state of an
//! RDS database instance, its status the controller's observation of it.
//! `Provider` carries the AWS region and credentials reference.

mod condition;
mod provider;
mod status;

pub use condition::{Condition, ConditionStatus, ConditionType, Conditions};
pub use provider::{Provider, ProviderSpec, SecretKeySelector};
pub use status::{BindingPhase, RDSInstanceState, RDSInstanceStatus, UnknownInstanceState};

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// RDSInstance Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: database.aws.microscaler.io/v1alpha2
/// kind: RDSInstance
/// metadata:
///   name: orders-db
///   namespace: default
/// spec:
///   masterUsername: admin
///   engine: postgres
///   engineVersion: "16.3"
///   class: db.t3.micro
///   size: 20
///   reclaimPolicy: Delete
///   providerRef:
///     name: aws-provider
///     namespace: crossplane-system
///   writeConnectionSecretToRef:
///     name: orders-db-conn
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "RDSInstance",
    group = "database.aws.microscaler.io",
    version = "v1alpha2",
    namespaced,
    status = "RDSInstanceStatus",
    shortname = "rds",
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}, {"name":"Engine", "type":"string", "jsonPath":".spec.engine"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RDSInstanceSpec {
    /// Master username for the database
    pub master_username: String,
    /// Database engine (e.g., "postgres", "mysql")
    pub engine: String,
    /// Engine version; the provider default is used when unset
    #[serde(default)]
    pub engine_version: Option<String>,
    /// DB instance class (e.g., "db.t3.micro")
    pub class: String,
    /// Allocated storage in GiB
    pub size: i32,
    /// VPC security groups to associate with the instance
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    /// DB subnet group to place the instance in
    #[serde(default)]
    pub subnet_group_name: Option<String>,
    /// What happens to the external instance when this record is deleted
    #[serde(default)]
    pub reclaim_policy: ReclaimPolicy,
    /// Provider holding the credentials to use
    pub provider_ref: ProviderReference,
    /// Claim this resource is bound to
    #[serde(default)]
    pub claim_ref: Option<ObjectReference>,
    /// Class this resource was provisioned from
    #[serde(default)]
    pub class_ref: Option<ObjectReference>,
    /// Secret to publish connection details to
    /// Defaults to a secret named after this resource
    #[serde(default)]
    pub write_connection_secret_to_ref: Option<SecretReference>,
}

/// Reclaim policy for the external resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
pub enum ReclaimPolicy {
    /// Delete the external instance with the record
    Delete,
    /// Keep the external instance after the record is gone
    #[default]
    Retain,
}

/// Reference to a Provider record
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReference {
    pub name: String,
    /// Defaults to the namespace of the referencing record
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Reference to an arbitrary Kubernetes object
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Reference to a Secret in the record's namespace
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,
}

impl RDSInstance {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or("default")
    }

    /// Name of the external instance, empty until provisioned
    pub fn instance_name(&self) -> &str {
        self.status
            .as_ref()
            .map_or("", |status| status.instance_name.as_str())
    }

    pub fn status_mut(&mut self) -> &mut RDSInstanceStatus {
        self.status.get_or_insert_with(RDSInstanceStatus::default)
    }

    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        let status = self.status_mut();
        for condition in conditions {
            status.conditions.set(condition);
        }
    }

    pub fn condition(&self, r#type: ConditionType) -> Option<&Condition> {
        self.status.as_ref()?.conditions.get(r#type)
    }

    pub fn is_condition_true(&self, r#type: ConditionType) -> bool {
        self.condition(r#type).is_some_and(Condition::is_true)
    }

    /// Deletion has been requested for this record
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Namespace of the referenced Provider
    pub fn provider_namespace(&self) -> &str {
        self.spec
            .provider_ref
            .namespace
            .as_deref()
            .unwrap_or_else(|| self.namespace())
    }

    /// Secret that receives connection details
    pub fn connection_secret_name(&self) -> &str {
        self.spec
            .write_connection_secret_to_ref
            .as_ref()
            .map_or_else(|| self.name(), |secret| secret.name.as_str())
    }
}
