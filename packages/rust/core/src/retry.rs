//! Bounded retry with exponential backoff around any [`Agent`].
//!
//! Only errors that report themselves as retryable
//! ([`BoardroomError::is_retryable`]) are attempted again. Delays double per
//! retry and are capped; there is no jitter, so the schedule is reproducible.

use std::time::Duration;

use tracing::warn;

use boardroom_shared::{BoardroomError, Result, RetryConfig};

use crate::agent::Agent;

/// How many times to try, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }
}

/// Run `op` until it succeeds, fails fatally, or attempts run out.
///
/// `op` receives the 1-based attempt number. The last error is returned.
pub fn retry_with<T>(
    policy: &RetryPolicy,
    label: &str,
    mut op: impl FnMut(u32) -> Result<T>,
) -> Result<T> {
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                let delay = policy.delay_for(attempt - 1);
                warn!(
                    label,
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis(),
                    error = %e,
                    "transient failure, retrying"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!(label, attempts, error = %e, "retries exhausted");
                }
                return Err(e);
            }
        }
    }
}

/// Decorates an agent with [`retry_with`].
#[derive(Debug, Clone)]
pub struct RetryingAgent<A> {
    inner: A,
    policy: RetryPolicy,
}

impl<A: Agent> RetryingAgent<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<A: Agent> Agent for RetryingAgent<A> {
    fn invoke(&self, instruction: &str, payload: &str) -> Result<String> {
        retry_with(&self.policy, "agent", |_| {
            self.inner.invoke(instruction, payload)
        })
        .map_err(|e| match e {
            BoardroomError::Agent { message, retryable } if retryable => BoardroomError::Agent {
                message: format!("{message} (after {} attempts)", self.policy.attempts()),
                retryable,
            },
            other => other,
        })
    }
}
