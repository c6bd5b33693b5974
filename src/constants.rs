//! # Constants
//!
//! Shared names and default values for the RDS Instance Controller.

/// Name used as field manager and in log output
pub const CONTROLLER_NAME: &str = "rds.database.aws.microscaler.io";

/// Finalizer owned by this controller on every RDSInstance it provisions
pub const FINALIZER: &str = "finalizer.rds.database.aws.microscaler.io";

/// Connection secret key for the master username
pub const CONNECTION_USERNAME_KEY: &str = "username";

/// Connection secret key for the generated master password
pub const CONNECTION_PASSWORD_KEY: &str = "password";

/// Connection secret key for the instance endpoint address
pub const CONNECTION_ENDPOINT_KEY: &str = "endpoint";

/// Default key inside a Provider credentials secret
pub const DEFAULT_CREDENTIALS_KEY: &str = "credentials";

/// Profile read from the shared-credentials document
pub const DEFAULT_CREDENTIALS_PROFILE: &str = "default";

/// Length of generated master passwords
pub const DEFAULT_CREDENTIAL_LENGTH: usize = 20;

/// Requeue delay after reference resolution fails (seconds)
/// Resolution usually waits on slow external state such as another resource provisioning
pub const DEFAULT_LONG_WAIT_SECS: u64 = 60;

/// Periodic resync interval for resources in steady state (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Upper bound for a single reconcile invocation (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 120;

/// Minimum backoff for immediate requeues and errors (seconds)
pub const DEFAULT_REQUEUE_BACKOFF_MIN_SECS: u64 = 1;

/// Maximum backoff for immediate requeues and errors (seconds)
pub const DEFAULT_REQUEUE_BACKOFF_MAX_SECS: u64 = 300;

/// Default port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Server startup timeout (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Server readiness poll interval (milliseconds)
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;
