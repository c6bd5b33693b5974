//! # Observability
//!
//! Prometheus metrics for the controller. Logging goes through `tracing`,
//! configured in [`crate::runtime::initialization`].

pub mod metrics;
