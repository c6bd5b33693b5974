//! # Controller Context
//!
//! Shared state handed to every reconcile invocation by the watch loop, and
//! the mapping from requeue hints to controller actions.

use crate::config::ControllerConfig;
use crate::controller::backoff::BackoffState;
use crate::controller::reconciler::{Reconciler, Requeue};
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Per-record Fibonacci backoff, keyed by `namespace/name`
///
/// Each record keeps its own sequence so one failing record never slows
/// down another.
#[derive(Debug)]
pub struct RequeueBackoff {
    states: Mutex<HashMap<String, BackoffState>>,
    min_secs: u64,
    max_secs: u64,
}

impl RequeueBackoff {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            min_secs,
            max_secs,
        }
    }

    /// Next interval for `key`, advancing its sequence
    pub fn next(&self, key: &str) -> Duration {
        match self.states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(key.to_string())
                    .or_insert_with(|| BackoffState::new(self.min_secs, self.max_secs));
                state.increment_error();
                state.backoff.next_backoff()
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using minimum backoff", e);
                Duration::from_secs(self.min_secs.max(1))
            }
        }
    }

    /// Forget the sequence for `key`
    pub fn reset(&self, key: &str) {
        match self.states.lock() {
            Ok(mut states) => {
                states.remove(key);
            }
            Err(e) => warn!("Failed to lock backoff states: {}", e),
        }
    }

    pub fn error_count(&self, key: &str) -> u32 {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(key).map(|state| state.error_count))
            .unwrap_or(0)
    }
}

/// Context shared by all reconcile invocations
pub struct ControllerContext {
    pub reconciler: Reconciler,
    pub config: ControllerConfig,
    pub backoff: RequeueBackoff,
    /// Cancelled when the controller shuts down; each invocation gets a child token
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for ControllerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ControllerContext {
    pub fn new(reconciler: Reconciler, config: ControllerConfig) -> Self {
        let backoff = RequeueBackoff::new(
            config.requeue_backoff_min_secs,
            config.requeue_backoff_max_secs,
        );
        Self {
            reconciler,
            config,
            backoff,
            shutdown: CancellationToken::new(),
        }
    }

    /// Translate a requeue hint into a controller action for `key`
    ///
    /// `Immediately` is rate limited per record; any other hint ends the
    /// record's backoff sequence.
    pub fn action_for(&self, key: &str, requeue: Requeue) -> Action {
        match requeue {
            Requeue::Immediately => Action::requeue(self.backoff.next(key)),
            Requeue::After(delay) => {
                self.backoff.reset(key);
                Action::requeue(delay)
            }
            Requeue::Never => {
                self.backoff.reset(key);
                Action::requeue(self.config.resync_interval())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_per_key() {
        let backoff = RequeueBackoff::new(1, 300);
        assert_eq!(backoff.next("a/one"), Duration::from_secs(1));
        assert_eq!(backoff.next("a/one"), Duration::from_secs(1));
        assert_eq!(backoff.next("a/one"), Duration::from_secs(2));
        assert_eq!(backoff.next("a/two"), Duration::from_secs(1));
        assert_eq!(backoff.error_count("a/one"), 3);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let backoff = RequeueBackoff::new(1, 300);
        backoff.next("a/one");
        backoff.next("a/one");
        backoff.next("a/one");
        backoff.reset("a/one");
        assert_eq!(backoff.error_count("a/one"), 0);
        assert_eq!(backoff.next("a/one"), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_is_capped() {
        let backoff = RequeueBackoff::new(1, 3);
        let intervals: Vec<u64> = (0..6).map(|_| backoff.next("k").as_secs()).collect();
        assert_eq!(intervals, vec![1, 1, 2, 3, 3, 3]);
    }
}
