//! # Reconciler
//!
//! Lifecycle reconciliation for RDSInstance records.
//!
//! ## Sub-modules
//!
//! - `reconcile` - Entry point: fetch, connect, resolve references, run a phase, persist
//! - `phases` - Create, sync and delete steps
//! - `store` - Fetching and persisting records
//! - `references` - Reference resolution
//! - `publisher` - Connection secret publishing
//! - `password` - Master password generation
//! - `types` - Keys, requeue hints and errors

pub mod password;
pub mod phases;
pub mod publisher;
pub mod reconcile;
pub mod references;
pub mod store;
pub mod types;

pub use phases::{fail, InstancePhases, LifecyclePhase, ManagedInstancePhases};
pub use publisher::{ConnectionDetails, ConnectionPublisher, PublishError, SecretPublisher};
pub use reconcile::Reconciler;
pub use references::{KubeReferenceResolver, ReferenceResolver, ResolveError};
pub use store::{KubeRecordStore, RecordStore, StoreError};
pub use types::{guarded, ReconcilerError, RecordKey, Requeue};
