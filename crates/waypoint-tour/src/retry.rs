// SPDX-License-Identifier: Apache-2.0
//! Polling for targets that have not mounted yet.
//!
//! When a step is entered its targets may not exist yet (lazy rendering, a
//! route transition still in flight). [`RetryController`] re-runs the
//! resolver on a fixed cadence until the region appears or the budget runs
//! out. It never sleeps: each [`RetryOutcome::Retry`] carries the delay the
//! caller must schedule before the next attempt.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use waypoint_tour::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.max_retries, 15);
//! assert_eq!(policy.delay(0), Duration::from_millis(200));
//! assert_eq!(policy.total_max_delay(), Duration::from_millis(3000));
//! ```

#![forbid(unsafe_code)]

use core::time::Duration;

use serde::{Deserialize, Serialize};
use waypoint_core::HostDocument;

use crate::resolver::{self, BoundingRegion};
use crate::step::Step;

/// Delay strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every attempt.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// `base_ms * 2^attempt`, capped at `max_ms`.
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Fixed { delay_ms: 200 }
    }
}

/// Upper bound on [`RetryPolicy::max_retries`] accepted by validation.
pub const MAX_RETRIES_LIMIT: u32 = 1_000;

/// How long to keep looking for a step's targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts after the first before giving up.
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 15,
            backoff: BackoffStrategy::default(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Resolve once and give up on a miss.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffStrategy::Fixed { delay_ms: 0 },
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffStrategy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            BackoffStrategy::Exponential { base_ms, max_ms } => {
                let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                Duration::from_millis(base_ms.saturating_mul(multiplier).min(max_ms))
            }
        }
    }

    /// Time from step entry until the step is given up on.
    ///
    /// Saturates at `Duration::MAX`.
    pub fn total_max_delay(&self) -> Duration {
        let cap = match self.backoff {
            BackoffStrategy::Fixed { delay_ms } => delay_ms,
            BackoffStrategy::Exponential { max_ms, .. } => max_ms,
        };
        let cap = Duration::from_millis(cap);
        let mut total = Duration::ZERO;
        for attempt in 0..self.max_retries {
            let delay = self.delay(attempt);
            // Constant from here on.
            if delay.is_zero() || delay >= cap {
                let rest = self.max_retries - attempt;
                return total.saturating_add(delay.saturating_mul(rest));
            }
            total = total.saturating_add(delay);
        }
        total
    }

    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let BackoffStrategy::Exponential { base_ms, max_ms } = self.backoff
            && max_ms < base_ms
        {
            errors.push(format!(
                "retry.backoff.max_ms ({max_ms}) must be >= base_ms ({base_ms})"
            ));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            errors.push(format!(
                "retry.max_retries ({}) must be <= {MAX_RETRIES_LIMIT}",
                self.max_retries
            ));
        }
        if self.max_retries > 0 && self.delay(0).is_zero() {
            errors.push("retry delay must be > 0 when max_retries > 0".to_string());
        }
        errors
    }
}

/// Where the controller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryState {
    #[default]
    Idle,
    Resolving,
    Resolved,
    /// Waiting for the next attempt.
    Retrying { attempt: u32 },
    Exhausted,
}

/// Result of one resolution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    Resolved(BoundingRegion),
    /// Not ready; try again after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// The step will never resolve. The caller skips past it.
    Exhausted,
}

/// Per-step retry budget.
#[derive(Debug, Clone, Default)]
pub struct RetryController {
    policy: RetryPolicy,
    attempts: u32,
    state: RetryState,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            state: RetryState::Idle,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Retries consumed for the current step.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Forget the current step's budget.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.state = RetryState::Idle;
    }

    /// Run one resolution attempt for `step`.
    pub fn attempt<D: HostDocument + ?Sized>(&mut self, step: &Step, document: &D) -> RetryOutcome {
        self.state = RetryState::Resolving;

        if step.is_malformed() {
            tracing::warn!(
                target: "waypoint.retry",
                step = step.step,
                "step has no usable target; skipping"
            );
            self.attempts = 0;
            self.state = RetryState::Exhausted;
            return RetryOutcome::Exhausted;
        }

        if let Some(region) = resolver::resolve(step.descriptors(), document) {
            if self.attempts > 0 {
                tracing::debug!(
                    target: "waypoint.retry",
                    step = step.step,
                    attempts = self.attempts,
                    "targets resolved after retry"
                );
            }
            self.attempts = 0;
            self.state = RetryState::Resolved;
            return RetryOutcome::Resolved(region);
        }

        if self.attempts < self.policy.max_retries {
            let delay = self.policy.delay(self.attempts);
            self.attempts += 1;
            tracing::trace!(
                target: "waypoint.retry",
                step = step.step,
                attempt = self.attempts,
                delay_ms = delay.as_millis() as u64,
                "targets not ready"
            );
            self.state = RetryState::Retrying {
                attempt: self.attempts,
            };
            return RetryOutcome::Retry {
                attempt: self.attempts,
                delay,
            };
        }

        tracing::warn!(
            target: "waypoint.retry",
            step = step.step,
            attempts = self.attempts,
            "targets never appeared; skipping step"
        );
        self.attempts = 0;
        self.state = RetryState::Exhausted;
        RetryOutcome::Exhausted
    }
}
