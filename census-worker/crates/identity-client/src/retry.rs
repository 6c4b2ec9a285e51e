//! Status-aware retry table for the lookup endpoint.
//!
//! Each retryable HTTP status owns its own ceiling and delay schedule:
//!
//! - **404**: one retry after a fixed 10s
//! - **403**: two retries, exponential (`10s * 2^attempt`: 10s, 20s)
//! - **500**: two retries, linear (`10s + 5s * attempt`: 10s, 15s)
//!
//! Any other status is terminal on first sight. The attempt index is shared across statuses,
//! so a mixed sequence such as `[403, 404]` still terminates within the largest ceiling.
use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;

use crate::constants::{RETRY_BASE_DELAY, RETRY_LINEAR_STEP};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RetryPolicyError {
    #[error("retry schedule for {status} has {delays} delays but allows {max_extra_attempts} retries")]
    ScheduleTooShort { status: StatusCode, delays: usize, max_extra_attempts: u32 },
}

/// Retry rule for a single status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRetry {
    max_extra_attempts: u32,
    delays: Vec<Duration>,
}

impl StatusRetry {
    pub fn fixed(delay: Duration, max_extra_attempts: u32) -> Self {
        Self { max_extra_attempts, delays: vec![delay; max_extra_attempts as usize] }
    }

    pub fn exponential(base: Duration, max_extra_attempts: u32) -> Self {
        let delays = (0..max_extra_attempts).map(|attempt| base.saturating_mul(2_u32.saturating_pow(attempt))).collect();
        Self { max_extra_attempts, delays }
    }

    pub fn linear(base: Duration, step: Duration, max_extra_attempts: u32) -> Self {
        let delays = (0..max_extra_attempts).map(|attempt| base + step.saturating_mul(attempt)).collect();
        Self { max_extra_attempts, delays }
    }

    pub fn max_extra_attempts(&self) -> u32 {
        self.max_extra_attempts
    }

    /// Delay before retrying after failed attempt `attempt` (zero based), or `None` once the
    /// ceiling is reached.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt < self.max_extra_attempts {
            self.delays.get(attempt as usize).copied()
        } else {
            None
        }
    }
}

/// Immutable once built; shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    rules: HashMap<StatusCode, StatusRetry>,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self { rules: HashMap::new() }
    }

    /// Builds a policy from explicit rules, rejecting any rule whose schedule is shorter than
    /// its retry ceiling.
    pub fn from_rules(
        rules: impl IntoIterator<Item = (StatusCode, StatusRetry)>,
    ) -> Result<Self, RetryPolicyError> {
        let rules: HashMap<_, _> = rules.into_iter().collect();
        for (status, rule) in &rules {
            if rule.delays.len() < rule.max_extra_attempts as usize {
                return Err(RetryPolicyError::ScheduleTooShort {
                    status: *status,
                    delays: rule.delays.len(),
                    max_extra_attempts: rule.max_extra_attempts,
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn retries(&self, status: StatusCode) -> bool {
        self.rules.contains_key(&status)
    }

    /// How long to wait before the next attempt after `status` was returned on attempt
    /// `attempt`. `None` means the status is terminal.
    pub fn delay_for(&self, status: StatusCode, attempt: u32) -> Option<Duration> {
        self.rules.get(&status).and_then(|rule| rule.delay_for(attempt))
    }

    /// Upper bound on the number of requests a single lookup can make.
    pub fn max_attempts(&self) -> u32 {
        self.rules.values().map(StatusRetry::max_extra_attempts).max().unwrap_or(0) + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rules: HashMap::from([
                (StatusCode::NOT_FOUND, StatusRetry::fixed(RETRY_BASE_DELAY, 1)),
                (StatusCode::FORBIDDEN, StatusRetry::exponential(RETRY_BASE_DELAY, 2)),
                (StatusCode::INTERNAL_SERVER_ERROR, StatusRetry::linear(RETRY_BASE_DELAY, RETRY_LINEAR_STEP, 2)),
            ]),
        }
    }
}
