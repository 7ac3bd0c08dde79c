//! Fixed-count retry keyed on a specific error signature
//!
//! This is not a general-purpose retry layer. The caller names exactly which
//! errors are worth another attempt; everything else is returned on first
//! sight.
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::retry::{retry_when, RetryPolicy};
//!
//! # async fn run() {
//! let result = retry_when(
//!     &RetryPolicy::default(),
//!     |e: &String| e.contains("duplicate key"),
//!     || async { Ok::<_, String>("saved") },
//! )
//! .await;
//! # }
//! ```

use crate::duration_secs;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy: a fixed number of attempts separated by a fixed delay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay between attempts
    #[serde(with = "duration_secs")]
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and delay
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Run `op`, retrying only while `should_retry` accepts the error and
/// attempts remain.
///
/// # Errors
///
/// Returns the first error `should_retry` rejects, or the last error once
/// the attempts are used up.
pub async fn retry_when<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    should_retry: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts && should_retry(&e) => {
                warn!(
                    attempt,
                    max_attempts,
                    delay_secs = policy.delay.as_secs_f64(),
                    "Retryable failure, trying again"
                );
                metrics::counter!("folio.duplicate_key.retry").increment(1);
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
