//! # Runtime Module
//!
//! Runtime components for the RDSInstance controller: initialization, the
//! shared context, the watch loop and error handling.

pub mod context;
pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use context::{ControllerContext, RequeueBackoff};
pub use error_policy::handle_reconciliation_error;
pub use initialization::{build_reconciler, initialize, InitializationResult};
pub use watch_loop::{reconcile_record, run_watch_loop};
