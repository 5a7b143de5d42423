//! Retry policy and backoff calculation

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Backoff strategy for calculating retry delays
///
/// `retry` is 1-based: the delay slept before the first retry is
/// `calculate_delay(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Linear backoff: `retry * step`
    Linear { step: Duration },
    /// Exponential backoff: `base * 2^(retry - 1)`
    Exponential { base: Duration },
}

impl BackoffStrategy {
    /// Calculate the delay before the given retry
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        match self {
            Self::Linear { step } => step.saturating_mul(retry),
            Self::Exponential { base } => {
                // 2^31 already overflows any sane base; clamp the shift
                let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
                base.saturating_mul(factor)
            }
        }
    }
}

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, first one included. Always at least 1.
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff }
    }

    /// Policy of the transport wrapper: `max_attempts` tries with linear
    /// backoff `attempt * base_delay`.
    pub fn transport(max_attempts: u32, base_delay: Duration) -> Self {
        Self::new(max_attempts, BackoffStrategy::Linear { step: base_delay })
    }

    /// Policy of the operation orchestrator: one attempt plus `max_retries`
    /// retries with exponential backoff starting at `base_delay`.
    pub fn operation(max_retries: u32, base_delay: Duration) -> Self {
        Self::new(max_retries.saturating_add(1), BackoffStrategy::Exponential { base: base_delay })
    }

    /// Number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_attempts - 1
    }

    pub fn delay_before(&self, retry: u32) -> Duration {
        self.backoff.calculate_delay(retry)
    }

    /// Sleep the backoff delay that precedes `retry`.
    pub async fn wait_before(&self, retry: u32) {
        let delay = self.delay_before(retry);
        if delay.is_zero() {
            return;
        }
        debug!(retry, delay_ms = delay.as_millis() as u64, "Backing off before retry");
        tokio::time::sleep(delay).await;
    }
}
