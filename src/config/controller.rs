//! # Reconciliation Settings
//!
//! Timing and credential settings for the lifecycle reconciler.

use super::env_var_or_default;
use std::time::Duration;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Requeue delay while references are unresolved (seconds)
    pub long_wait_secs: u64,
    /// Periodic resync for records that need no follow-up (seconds)
    pub resync_interval_secs: u64,
    /// Upper bound on one reconcile invocation (seconds)
    pub reconcile_timeout_secs: u64,
    /// Smallest per-record retry interval (seconds)
    pub requeue_backoff_min_secs: u64,
    /// Largest per-record retry interval (seconds)
    pub requeue_backoff_max_secs: u64,
    /// Length of generated master passwords
    pub credential_length: usize,
    /// Override for the RDS API endpoint, e.g. a local emulator
    pub rds_endpoint_url: Option<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            long_wait_secs: DEFAULT_LONG_WAIT_SECS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            reconcile_timeout_secs: DEFAULT_RECONCILE_TIMEOUT_SECS,
            requeue_backoff_min_secs: DEFAULT_REQUEUE_BACKOFF_MIN_SECS,
            requeue_backoff_max_secs: DEFAULT_REQUEUE_BACKOFF_MAX_SECS,
            credential_length: DEFAULT_CREDENTIAL_LENGTH,
            rds_endpoint_url: None,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            long_wait_secs: env_var_or_default("LONG_WAIT_SECS", DEFAULT_LONG_WAIT_SECS),
            resync_interval_secs: env_var_or_default(
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            reconcile_timeout_secs: env_var_or_default(
                "RECONCILE_TIMEOUT_SECS",
                DEFAULT_RECONCILE_TIMEOUT_SECS,
            ),
            requeue_backoff_min_secs: env_var_or_default(
                "REQUEUE_BACKOFF_MIN_SECS",
                DEFAULT_REQUEUE_BACKOFF_MIN_SECS,
            ),
            requeue_backoff_max_secs: env_var_or_default(
                "REQUEUE_BACKOFF_MAX_SECS",
                DEFAULT_REQUEUE_BACKOFF_MAX_SECS,
            ),
            credential_length: env_var_or_default("CREDENTIAL_LENGTH", DEFAULT_CREDENTIAL_LENGTH),
            rds_endpoint_url: std::env::var("RDS_ENDPOINT_URL")
                .ok()
                .filter(|url| !url.is_empty()),
        }
    }

    pub fn long_wait(&self) -> Duration {
        Duration::from_secs(self.long_wait_secs)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }
}
