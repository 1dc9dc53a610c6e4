//! Retry policy for idempotent data store calls
//!
//! Reads (and filtered updates/deletes) are retried with exponential backoff
//! when the failure looks transient. Inserts are never retried here: a
//! repeated insert that already landed would surface as a 409.

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

use super::StoreError;

#[derive(Debug, Clone)]
pub struct RetryStrategy {
    initial_interval: Duration,
    max_interval: Duration,
    max_elapsed: Duration,
}

impl RetryStrategy {
    pub fn new(max_elapsed_ms: u64) -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(1),
            max_elapsed: Duration::from_millis(max_elapsed_ms),
        }
    }

    /// A strategy that gives up after the first failure
    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(2.0)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build()
    }

    pub fn is_retryable(&self, error: &StoreError) -> bool {
        match error {
            StoreError::Transport(_) => true,
            StoreError::Status { status, .. } => matches!(status, 502..=504),
            StoreError::Decode(_) => false,
        }
    }

    /// Wrap an error for `backoff::future::retry`
    pub fn classify(&self, error: StoreError) -> backoff::Error<StoreError> {
        if self.is_retryable(&error) {
            backoff::Error::transient(error)
        } else {
            backoff::Error::permanent(error)
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3_000)
    }
}
