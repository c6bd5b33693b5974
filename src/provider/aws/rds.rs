//! # AWS RDS Client
//!
//! [`RdsClient`] backed by the official AWS SDK.

use crate::crd::RDSInstanceSpec;
use crate::observability::metrics;
use crate::provider::{CreatedInstance, ObservedInstance, ProviderError, RdsClient};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rds::error::DisplayErrorContext;
use aws_sdk_rds::Client;
use tracing::{debug, info};

/// RDS provider implementation
pub struct AwsRdsClient {
    client: Client,
}

impl std::fmt::Debug for AwsRdsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsRdsClient").finish_non_exhaustive()
    }
}

impl AwsRdsClient {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn record<T>(operation: &'static str, result: &Result<T, ProviderError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(ProviderError::AlreadyExists(_)) => "already_exists",
        Err(ProviderError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    metrics::increment_provider_operations(operation, outcome);
}

#[async_trait]
impl RdsClient for AwsRdsClient {
    async fn create_instance(
        &self,
        name: &str,
        password: &str,
        spec: &RDSInstanceSpec,
    ) -> Result<CreatedInstance, ProviderError> {
        info!(instance = name, engine = %spec.engine, "Creating DB instance");
        let result = self
            .client
            .create_db_instance()
            .db_instance_identifier(name)
            .engine(&spec.engine)
            .set_engine_version(spec.engine_version.clone())
            .db_instance_class(&spec.class)
            .allocated_storage(spec.size)
            .master_username(&spec.master_username)
            .master_user_password(password)
            .set_vpc_security_group_ids(
                (!spec.security_group_ids.is_empty()).then(|| spec.security_group_ids.clone()),
            )
            .set_db_subnet_group_name(spec.subnet_group_name.clone())
            .send()
            .await
            .map(|output| CreatedInstance {
                provider_id: output
                    .db_instance()
                    .and_then(|db| db.db_instance_arn())
                    .map(str::to_string),
            })
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_db_instance_already_exists_fault())
                {
                    ProviderError::AlreadyExists(name.to_string())
                } else {
                    ProviderError::Api {
                        operation: "CreateDBInstance",
                        message: DisplayErrorContext(&err).to_string(),
                    }
                }
            });
        record("create", &result);
        result
    }

    async fn describe_instance(&self, name: &str) -> Result<ObservedInstance, ProviderError> {
        debug!(instance = name, "Describing DB instance");
        let result = match self
            .client
            .describe_db_instances()
            .db_instance_identifier(name)
            .send()
            .await
        {
            Ok(output) => match output.db_instances().first() {
                Some(db) => ObservedInstance::from_provider(
                    db.db_instance_status().unwrap_or_default(),
                    db.endpoint()
                        .and_then(|endpoint| endpoint.address())
                        .map(str::to_string),
                    db.db_instance_arn().map(str::to_string),
                ),
                None => Err(ProviderError::NotFound(name.to_string())),
            },
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_db_instance_not_found_fault()) =>
            {
                Err(ProviderError::NotFound(name.to_string()))
            }
            Err(err) => Err(ProviderError::Api {
                operation: "DescribeDBInstances",
                message: DisplayErrorContext(&err).to_string(),
            }),
        };
        record("describe", &result);
        result
    }

    async fn delete_instance(&self, name: &str) -> Result<(), ProviderError> {
        info!(instance = name, "Deleting DB instance");
        let result = self
            .client
            .delete_db_instance()
            .db_instance_identifier(name)
            .skip_final_snapshot(true)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_db_instance_not_found_fault())
                {
                    ProviderError::NotFound(name.to_string())
                } else {
                    ProviderError::Api {
                        operation: "DeleteDBInstance",
                        message: DisplayErrorContext(&err).to_string(),
                    }
                }
            });
        record("delete", &result);
        result
    }
}
