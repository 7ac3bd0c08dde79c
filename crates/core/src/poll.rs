//! Bounded waiting on long-running remote jobs
//!
//! A freshly submitted job is not immediately visible to the status endpoint,
//! and once visible it stays pending for an unknown time. [`wait_until_complete`]
//! turns that noisy probe into a bounded wait with clear terminal outcomes:
//!
//! | Probe result | Effect |
//! |---|---|
//! | `Success` | stop, [`WaitOutcome::Completed`] |
//! | `Error` | stop, [`WaitOutcome::Failed`] |
//! | `Pending` | sleep `interval`, probe again |
//! | `NotFound` at attempt `i < not_found_tolerance` | sleep `interval`, probe again |
//! | `NotFound` at attempt `i >= not_found_tolerance` | [`PollError::NotFoundExhausted`] |
//! | overall `timeout` elapsed | stop, [`WaitOutcome::TimedOut`] |
//!
//! Attempt indices start at 0, so a job that is never found is given up on
//! after exactly `not_found_tolerance + 1` probes.
//!
//! A timeout is a returned value rather than an error: a slow job may still
//! finish later. Sustained not-found is an error because it points at a wrong
//! identifier or a server-side problem.

use crate::duration_secs;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Result of a single status probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// The job finished successfully
    Success,
    /// The job is still running
    Pending,
    /// The job finished with errors and will not progress further
    Error,
    /// The job is not (yet) visible
    NotFound,
}

impl PollOutcome {
    /// Whether this outcome ends the wait
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// Terminal, non-fatal result of a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    /// A probe reported success
    Completed,
    /// A probe reported a failed job
    Failed,
    /// The overall timeout elapsed first
    TimedOut,
}

/// Result of waiting for a value to appear
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Waited<T> {
    /// The probe produced a value
    Ready(T),
    /// The overall timeout elapsed first
    TimedOut,
}

/// Fatal polling errors
#[derive(Error, Debug)]
pub enum PollError<E> {
    /// The job was still not found after the tolerated number of probes
    #[error("resource not found after {attempts} status checks")]
    NotFoundExhausted {
        /// Number of probes made
        attempts: u32,
    },

    /// The probe itself failed
    #[error(transparent)]
    Probe(E),
}

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between probes
    #[serde(with = "duration_secs")]
    pub interval: Duration,
    /// Overall wall-clock limit for the wait
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Number of leading not-found probes that are tolerated
    pub not_found_tolerance: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5 * 60),
            not_found_tolerance: 3,
        }
    }
}

impl PollConfig {
    /// Builder-style method to set the probe interval
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Builder-style method to set the overall timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the not-found tolerance
    #[must_use]
    pub fn with_not_found_tolerance(mut self, tolerance: u32) -> Self {
        self.not_found_tolerance = tolerance;
        self
    }
}

/// Probe a job until it reaches a terminal state, the tolerance for
/// not-found probes is used up, or `config.timeout` elapses.
///
/// # Errors
///
/// Returns [`PollError::NotFoundExhausted`] when the job stays invisible past
/// the tolerance, and [`PollError::Probe`] when the probe fails.
pub async fn wait_until_complete<F, Fut, E>(
    config: &PollConfig,
    mut probe: F,
) -> Result<WaitOutcome, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollOutcome, E>>,
{
    let polling = async {
        let mut attempt: u32 = 0;
        loop {
            let outcome = match probe().await {
                Ok(outcome) => outcome,
                Err(e) => return Err(PollError::Probe(e)),
            };
            metrics::counter!("folio.poll.probe").increment(1);
            debug!(attempt, outcome = ?outcome, "Job status probed");

            if outcome.is_terminal() {
                return Ok(if outcome == PollOutcome::Success {
                    WaitOutcome::Completed
                } else {
                    WaitOutcome::Failed
                });
            }

            if outcome == PollOutcome::NotFound && attempt >= config.not_found_tolerance {
                warn!(attempts = attempt + 1, "Job still not found, giving up");
                return Err(PollError::NotFoundExhausted {
                    attempts: attempt + 1,
                });
            }

            tokio::time::sleep(config.interval).await;
            attempt += 1;
        }
    };

    if let Ok(result) = tokio::time::timeout(config.timeout, polling).await {
        result
    } else {
        warn!(timeout_secs = config.timeout.as_secs_f64(), "Timed out waiting for job");
        Ok(WaitOutcome::TimedOut)
    }
}

/// Probe until it yields a value or `config.timeout` elapses.
///
/// Used for follow-up data that is populated asynchronously after a job is
/// already marked complete. The not-found tolerance does not apply here.
///
/// # Errors
///
/// Returns the probe's error unchanged.
pub async fn wait_for<F, Fut, T, E>(config: &PollConfig, mut probe: F) -> Result<Waited<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let polling = async {
        loop {
            match probe().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) => return Err(e),
            }
            tokio::time::sleep(config.interval).await;
        }
    };

    match tokio::time::timeout(config.timeout, polling).await {
        Ok(Ok(value)) => Ok(Waited::Ready(value)),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(Waited::TimedOut),
    }
}
