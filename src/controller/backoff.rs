//! # Fibonacci Backoff
//!
//! Retry intervals that grow along the Fibonacci sequence, bounded by a
//! minimum and a maximum.
//!
//! With `min = 1s` and `max = 300s` the sequence is
//! 1s, 1s, 2s, 3s, 5s, 8s, ... 233s, then capped at 300s.

use std::time::Duration;

/// Stateful Fibonacci backoff for one resource
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_secs: u64,
    max_secs: u64,
    previous: u64,
    current: u64,
}

impl FibonacciBackoff {
    /// `min_secs` of zero is treated as one second
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        let min_secs = min_secs.max(1);
        let max_secs = max_secs.max(min_secs);
        Self {
            min_secs,
            max_secs,
            previous: 0,
            current: min_secs,
        }
    }

    /// Return the next interval and advance the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current.min(self.max_secs);
        if self.current < self.max_secs {
            let next = self.previous.saturating_add(self.current);
            self.previous = self.current;
            self.current = next;
        }
        result
    }

    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Start over from the minimum
    pub fn reset(&mut self) {
        self.previous = 0;
        self.current = self.min_secs;
    }
}

/// Per-resource error tracking used by the error policy
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}
