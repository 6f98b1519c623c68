//! Retry/backoff state machine shared by every upstream request.
//!
//! ```text
//!              ┌──────────── success ───────────► Succeeded
//!              │
//!   Attempting ┼── HTTP 429 ──► RateLimited ──(fixed cooldown)──► Attempting
//!              │
//!              ├── other ─────► BackingOff ──(min(max, base·2^n))─► Attempting
//!              │
//!              └── last attempt failed ─────────► Exhausted
//! ```
//!
//! Rate limiting is handled apart from transient failure: the upstream quota
//! resets on a fixed window, so a 429 always waits one cooldown regardless of
//! how many attempts came before it. Both kinds of failure consume the attempt
//! budget. Every attempt and every sleep races the caller's cancellation token.

use std::{fmt, future::Future, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::providers::{CancelledSnafu, ExhaustedSnafu, ProviderError};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Upstream quota windows reset every minute.
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Why a single attempt did not produce a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The upstream answered HTTP 429.
    RateLimited,
    /// Network error, timeout, unexpected status or unreadable body.
    Transient(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::RateLimited => f.write_str("rate limited (HTTP 429)"),
            AttemptFailure::Transient(reason) => f.write_str(reason),
        }
    }
}

/// States of a single retried request. `attempt` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    Attempting { attempt: u32 },
    RateLimited { attempt: u32, cooldown: Duration },
    BackingOff { attempt: u32, delay: Duration, reason: String },
    Succeeded { attempt: u32, body: String },
    Exhausted { attempts: u32, last_failure: AttemptFailure },
}

/// Limits and delays applied by [`RetryPolicy::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// `min(max_backoff, base_backoff * 2^attempt)`, clamped to `max_backoff` on overflow.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_backoff.checked_mul(factor))
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    /// Decides where the machine goes after attempt number `attempt` finished.
    pub fn next_state(&self, attempt: u32, outcome: Result<String, AttemptFailure>) -> RetryState {
        let failure = match outcome {
            Ok(body) => return RetryState::Succeeded { attempt, body },
            Err(failure) => failure,
        };

        if attempt.saturating_add(1) >= self.max_attempts() {
            return RetryState::Exhausted {
                attempts: attempt.saturating_add(1),
                last_failure: failure,
            };
        }

        match failure {
            AttemptFailure::RateLimited => RetryState::RateLimited {
                attempt,
                cooldown: self.rate_limit_cooldown,
            },
            AttemptFailure::Transient(reason) => RetryState::BackingOff {
                attempt,
                delay: self.backoff_delay(attempt),
                reason,
            },
        }
    }

    /// Drives `attempt_fn` through the state machine until it succeeds, the
    /// budget runs out, or `cancel` fires.
    ///
    /// `attempt_fn` receives the zero-based attempt number.
    pub async fn run<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut attempt_fn: F,
    ) -> Result<String, ProviderError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<String, AttemptFailure>>,
    {
        let mut state = RetryState::Attempting { attempt: 0 };
        loop {
            state = match state {
                RetryState::Attempting { attempt } => {
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return CancelledSnafu.fail(),
                        outcome = attempt_fn(attempt) => outcome,
                    };
                    self.next_state(attempt, outcome)
                }
                RetryState::RateLimited { attempt, cooldown } => {
                    warn!(
                        attempt,
                        delay_ms = cooldown.as_millis() as u64,
                        "upstream rate limited, cooling down"
                    );
                    pause(cancel, cooldown).await?;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::BackingOff {
                    attempt,
                    delay,
                    reason,
                } => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %reason,
                        "upstream request failed, backing off"
                    );
                    pause(cancel, delay).await?;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Succeeded { attempt, body } => {
                    debug!(attempt, bytes = body.len(), "upstream request succeeded");
                    return Ok(body);
                }
                RetryState::Exhausted {
                    attempts,
                    last_failure,
                } => {
                    error!(attempts, error = %last_failure, "upstream retry budget exhausted");
                    return ExhaustedSnafu {
                        attempts,
                        last_failure: last_failure.to_string(),
                    }
                    .fail();
                }
            };
        }
    }
}

async fn pause(cancel: &CancellationToken, delay: Duration) -> Result<(), ProviderError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => CancelledSnafu.fail(),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
