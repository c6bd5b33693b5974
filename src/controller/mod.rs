//! # Controller
//!
//! Core controller logic for RDSInstance records.

pub mod backoff;
pub mod meta;
pub mod reconciler;
pub mod server;
