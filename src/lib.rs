//! # RDSInstance Controller
//!
//! A Kubernetes controller that provisions AWS RDS database instances from
//! `RDSInstance` records and publishes their connection details to a Secret.
//!
//! Each reconcile runs one lifecycle step (create, sync or delete), records
//! the outcome as conditions on the record and returns a requeue hint.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod provider;
pub mod runtime;

pub use crd::*;
