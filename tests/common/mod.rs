//! Shared in-memory collaborators for reconciler tests.

#![allow(dead_code, reason = "Not every test binary uses every helper")]

use async_trait::async_trait;
use rds_instance_controller::controller::reconciler::{
    ConnectionDetails, ConnectionPublisher, ManagedInstancePhases, PublishError, Reconciler,
    RecordKey, RecordStore, ReferenceResolver, ResolveError, StoreError,
};
use rds_instance_controller::provider::{
    ConnectError, Connector, CreatedInstance, ObservedInstance, ProviderError, RdsClient,
};
use rds_instance_controller::{RDSInstance, RDSInstanceSpec};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const NAMESPACE: &str = "default";
pub const NAME: &str = "orders-db";
pub const UID: &str = "0c4f6c1e-5b1f-4f8e-9a53-2d4c1b7f0a11";
pub const LONG_WAIT: Duration = Duration::from_secs(60);

pub fn key() -> RecordKey {
    RecordKey::new(NAMESPACE, NAME)
}

pub fn spec(reclaim_policy: &str) -> RDSInstanceSpec {
    serde_json::from_value(serde_json::json!({
        "masterUsername": "admin",
        "engine": "postgres",
        "engineVersion": "16.3",
        "class": "db.t3.micro",
        "size": 20,
        "reclaimPolicy": reclaim_policy,
        "providerRef": {"name": "aws"}
    }))
    .unwrap()
}

/// A stored record the way the API server would return it
pub fn record(reclaim_policy: &str) -> RDSInstance {
    let mut record = RDSInstance::new(NAME, spec(reclaim_policy));
    record.metadata.namespace = Some(NAMESPACE.to_string());
    record.metadata.uid = Some(UID.to_string());
    record
}

pub fn mark_deleted(record: &mut RDSInstance) {
    record.metadata.deletion_timestamp =
        Some(serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z")).unwrap());
}

pub fn expected_instance_name() -> String {
    format!("postgres-{UID}")
}

/// Record store with resourceVersion checks
#[derive(Debug, Default)]
pub struct FakeStore {
    records: Mutex<HashMap<RecordKey, RDSInstance>>,
    pub updates: AtomicUsize,
    /// Bump the stored version right before the next update
    pub race_next_update: Mutex<bool>,
}

impl FakeStore {
    pub fn with(record: RDSInstance) -> Arc<Self> {
        let store = Self::default();
        store.put(record);
        Arc::new(store)
    }

    /// Store `record`, bumping its resourceVersion
    pub fn put(&self, mut record: RDSInstance) {
        let mut records = self.records.lock().unwrap();
        let key = RecordKey::from_record(&record);
        let version = records
            .get(&key)
            .and_then(|r| r.metadata.resource_version.as_deref())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        record.metadata.resource_version = Some((version + 1).to_string());
        records.insert(key, record);
    }

    pub fn current(&self) -> RDSInstance {
        self.records.lock().unwrap().get(&key()).cloned().unwrap()
    }

    /// Simulate a concurrent writer
    pub fn touch(&self) {
        let record = self.current();
        self.put(record);
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<RDSInstance>, StoreError> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn update(&self, record: &RDSInstance) -> Result<(), StoreError> {
        let key = RecordKey::from_record(record);
        if std::mem::take(&mut *self.race_next_update.lock().unwrap()) {
            self.touch();
        }
        {
            let records = self.records.lock().unwrap();
            let stored = records.get(&key).map(|r| r.metadata.resource_version.clone());
            if stored != Some(record.metadata.resource_version.clone()) {
                return Err(StoreError::Conflict(key.to_string()));
            }
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.put(record.clone());
        Ok(())
    }
}

/// Scripted answer for a describe call
#[derive(Debug, Clone)]
pub enum Describe {
    State(&'static str),
    NotFound,
    Fail(&'static str),
}

/// In-memory RDS API
#[derive(Debug, Default)]
pub struct FakeRds {
    instances: Mutex<HashMap<String, String>>,
    describes: Mutex<VecDeque<Describe>>,
    pub create_calls: AtomicUsize,
    pub describe_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_create: Mutex<Option<&'static str>>,
    pub fail_delete: Mutex<Option<&'static str>>,
    pub passwords: Mutex<Vec<String>>,
}

impl FakeRds {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pretend `name` was created outside this controller
    pub fn preexisting(&self, name: &str) {
        self.instances
            .lock()
            .unwrap()
            .insert(name.to_string(), "available".to_string());
    }

    pub fn script_describe(&self, answers: impl IntoIterator<Item = Describe>) {
        self.describes.lock().unwrap().extend(answers);
    }

    pub fn instance_count(&self) -> usize {
        self.instances.lock().unwrap().len()
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn describes(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RdsClient for FakeRds {
    async fn create_instance(
        &self,
        name: &str,
        password: &str,
        _spec: &RDSInstanceSpec,
    ) -> Result<CreatedInstance, ProviderError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = *self.fail_create.lock().unwrap() {
            return Err(ProviderError::Api {
                operation: "CreateDBInstance",
                message: message.to_string(),
            });
        }
        let mut instances = self.instances.lock().unwrap();
        if instances.contains_key(name) {
            return Err(ProviderError::AlreadyExists(name.to_string()));
        }
        instances.insert(name.to_string(), "creating".to_string());
        self.passwords.lock().unwrap().push(password.to_string());
        Ok(CreatedInstance {
            provider_id: Some(format!("arn:aws:rds:us-east-1:123456789012:db:{name}")),
        })
    }

    async fn describe_instance(&self, name: &str) -> Result<ObservedInstance, ProviderError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.describes.lock().unwrap().pop_front();
        let status = match scripted {
            Some(Describe::State(status)) => status.to_string(),
            Some(Describe::NotFound) => return Err(ProviderError::NotFound(name.to_string())),
            Some(Describe::Fail(message)) => {
                return Err(ProviderError::Api {
                    operation: "DescribeDBInstances",
                    message: message.to_string(),
                })
            }
            None => match self.instances.lock().unwrap().get(name) {
                Some(status) => status.clone(),
                None => return Err(ProviderError::NotFound(name.to_string())),
            },
        };
        let endpoint = (status == "available").then(|| format!("{name}.rds.amazonaws.com"));
        ObservedInstance::from_provider(&status, endpoint, Some(format!("db-{name}")))
    }

    async fn delete_instance(&self, name: &str) -> Result<(), ProviderError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = *self.fail_delete.lock().unwrap() {
            return Err(ProviderError::Api {
                operation: "DeleteDBInstance",
                message: message.to_string(),
            });
        }
        match self.instances.lock().unwrap().remove(name) {
            Some(_) => Ok(()),
            None => Err(ProviderError::NotFound(name.to_string())),
        }
    }
}

/// Hands out the same client, or fails
#[derive(Debug)]
pub struct FakeConnector {
    client: Arc<FakeRds>,
    pub fail: Mutex<bool>,
    pub provider_missing: Mutex<bool>,
    pub calls: AtomicUsize,
}

impl FakeConnector {
    pub fn new(client: Arc<FakeRds>) -> Arc<Self> {
        Arc::new(Self {
            client,
            fail: Mutex::new(false),
            provider_missing: Mutex::new(false),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _record: &RDSInstance) -> Result<Arc<dyn RdsClient>, ConnectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.provider_missing.lock().unwrap() {
            return Err(ConnectError::Provider {
                namespace: NAMESPACE.to_string(),
                name: "aws-provider".to_string(),
                source: kube::Error::Api(kube::error::ErrorResponse {
                    status: "Failure".to_string(),
                    message: "providers \"aws-provider\" not found".to_string(),
                    reason: "NotFound".to_string(),
                    code: 404,
                }),
            });
        }
        if *self.fail.lock().unwrap() {
            return Err(ConnectError::InvalidCredentials(
                "profile default has no aws_access_key_id".to_string(),
            ));
        }
        let client: Arc<dyn RdsClient> = self.client.clone();
        Ok(client)
    }
}

/// Scripted reference resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    Blocked,
    Transient,
}

#[derive(Debug)]
pub struct FakeResolver {
    pub outcome: Mutex<Resolution>,
    pub calls: AtomicUsize,
}

impl FakeResolver {
    pub fn new(outcome: Resolution) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, outcome: Resolution) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReferenceResolver for FakeResolver {
    async fn resolve(&self, _record: &RDSInstance) -> Result<(), ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.outcome.lock().unwrap() {
            Resolution::Resolved => Ok(()),
            Resolution::Blocked => Err(ResolveError::Blocked(
                "referenced provider default/aws not found".to_string(),
            )),
            Resolution::Transient => Err(ResolveError::Transient(
                "provider default/aws: connection reset".to_string(),
            )),
        }
    }
}

/// Records every published payload
#[derive(Debug, Default)]
pub struct FakePublisher {
    pub published: Mutex<Vec<ConnectionDetails>>,
    pub fail: Mutex<bool>,
}

impl FakePublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn payloads(&self) -> Vec<ConnectionDetails> {
        self.published.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl ConnectionPublisher for FakePublisher {
    async fn publish(
        &self,
        record: &RDSInstance,
        details: ConnectionDetails,
    ) -> Result<(), PublishError> {
        if *self.fail.lock().unwrap() {
            return Err(PublishError::NotOwned(
                record.connection_secret_name().to_string(),
            ));
        }
        self.published.lock().unwrap().push(details);
        Ok(())
    }
}

/// A reconciler wired to fakes, plus handles to inspect them
#[derive(Debug)]
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub rds: Arc<FakeRds>,
    pub connector: Arc<FakeConnector>,
    pub resolver: Arc<FakeResolver>,
    pub publisher: Arc<FakePublisher>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new(record: RDSInstance) -> Self {
        Self::with_resolution(record, Resolution::Resolved)
    }

    pub fn with_resolution(record: RDSInstance, resolution: Resolution) -> Self {
        let store = FakeStore::with(record);
        let rds = FakeRds::new();
        let connector = FakeConnector::new(rds.clone());
        let resolver = FakeResolver::new(resolution);
        let publisher = FakePublisher::new();
        let reconciler = Reconciler::new(
            store.clone(),
            connector.clone(),
            resolver.clone(),
            Arc::new(ManagedInstancePhases::new(publisher.clone(), 20)),
            LONG_WAIT,
        );
        Self {
            store,
            rds,
            connector,
            resolver,
            publisher,
            reconciler,
        }
    }
}

pub fn detail(details: &ConnectionDetails, key: &str) -> Option<String> {
    details
        .get(key)
        .map(|value| String::from_utf8_lossy(value).into_owned())
}
