//! Run status polling.
//!
//! Checks a run's status until it succeeds, fails, or the attempt budget runs
//! out. Waits between checks are plain `tokio` timers, so dropping the future
//! (on cancellation or a caller-side timeout) stops polling immediately.

use std::time::Duration;
use tracing::{info, warn};

use crate::api::{ArtifactReference, RunStatus, SigmaApi};
use crate::error::{Result, SigmaError};

/// Default wait between status checks.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of status checks before giving up.
const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default upper bound for a single wait.
const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(30);

/// How often and how long to poll a run.
///
/// The interval is multiplied by `backoff_factor` after each non-terminal
/// status and capped at `max_interval`. A factor of 1.0 gives a fixed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    interval: Duration,
    max_attempts: u32,
    backoff_factor: f64,
    max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: 1.0,
            max_interval: DEFAULT_MAX_INTERVAL,
        }
    }
}

impl PollPolicy {
    /// Creates a fixed-interval policy.
    pub fn new(interval: Duration, max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(SigmaError::config("max_attempts must be at least 1"));
        }

        Ok(Self {
            interval,
            max_attempts,
            backoff_factor: 1.0,
            max_interval: interval.max(DEFAULT_MAX_INTERVAL),
        })
    }

    /// Enables exponential backoff, capping each wait at `max_interval`.
    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Result<Self> {
        if !factor.is_finite() || factor < 1.0 {
            return Err(SigmaError::config(format!(
                "backoff_factor must be a finite number >= 1.0, got {}",
                factor
            )));
        }
        if max_interval < self.interval {
            return Err(SigmaError::config(
                "max_interval must not be shorter than the poll interval",
            ));
        }

        self.backoff_factor = factor;
        self.max_interval = max_interval;
        Ok(self)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the wait after the given (1-based) non-terminal attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.interval.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }

    /// Returns the longest time spent waiting before a timeout, saturating
    /// at [`Duration::MAX`].
    ///
    /// There is no wait after the final attempt.
    pub fn max_total_wait(&self) -> Duration {
        let waits = self.max_attempts - 1;
        if self.backoff_factor == 1.0 {
            return self.delay_for(1).saturating_mul(waits);
        }

        let mut total = Duration::ZERO;
        for attempt in 1..=waits {
            let delay = self.delay_for(attempt);
            if delay == self.max_interval {
                // Every later wait is capped too.
                let remaining = waits - attempt + 1;
                return total.saturating_add(delay.saturating_mul(remaining));
            }
            total = total.saturating_add(delay);
        }
        total
    }
}

/// Polls `run_id` until it reaches a terminal status.
///
/// Returns the result file of a succeeded run. Performs at most
/// `policy.max_attempts()` status checks.
pub async fn poll_until_complete(
    api: &dyn SigmaApi,
    run_id: &str,
    policy: &PollPolicy,
) -> Result<ArtifactReference> {
    let max_attempts = policy.max_attempts();

    for attempt in 1..=max_attempts {
        let run = api.retrieve_query_run(run_id).await?;
        info!(
            "Attempt {} of {}: status = {}",
            attempt, max_attempts, run.status
        );

        match &run.status {
            RunStatus::Succeeded => {
                return run.artifact().ok_or_else(|| {
                    SigmaError::protocol(format!(
                        "Query run {} succeeded without a result file",
                        run_id
                    ))
                });
            }
            RunStatus::Failed => return Err(SigmaError::query_failed(run.error_detail())),
            RunStatus::Pending => {}
            RunStatus::Other(status) => {
                // Unknown statuses may be new terminal states; keep polling but make it visible.
                warn!(
                    "Query run {} reported unrecognized status '{}', continuing to poll",
                    run_id, status
                );
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
        }
    }

    Err(SigmaError::Timeout {
        attempts: max_attempts,
    })
}
