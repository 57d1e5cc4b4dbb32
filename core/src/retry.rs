//! Exponential backoff without jitter.
//!
//! The policy is pure: given the number of the attempt that just failed and
//! its normalized error, it says how long to wait before the next attempt,
//! or that the error should be surfaced. Sleeping is the caller's job, which
//! lets the async client and a C host share the same decisions.

use std::time::Duration;

use crate::config::{or_default_retries, ClientConfig};
use crate::error::ApiError;

/// Largest exponent applied to the backoff unit.
const MAX_SHIFT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    unit: Duration,
}

impl RetryPolicy {
    /// A zero `max_retries` means the default budget.
    pub fn new(max_retries: u32, unit: Duration) -> Self {
        Self {
            max_retries: or_default_retries(max_retries),
            unit,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_retries, config.backoff_unit)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(1u32 << attempt.min(MAX_SHIFT))
    }

    /// Whether to try again after `attempt` failed with `err`, and after how long.
    ///
    /// Client errors (4xx) are never retried. Everything else, including a
    /// failure with no status at all, is retried until `attempt` reaches
    /// `max_retries`.
    pub fn next_delay(&self, attempt: u32, err: &ApiError) -> Option<Duration> {
        if err.is_client_error() || attempt >= self.max_retries {
            return None;
        }
        Some(self.backoff(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MAX_RETRIES,
            crate::config::DEFAULT_BACKOFF_UNIT,
        )
    }
}
