// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fixed-interval polling bounded by a deadline.
//!
//! Used for readiness waits, converging re-verification and absence checks
//! after a delete. An error returned by the check aborts the wait at once;
//! only a `false` result is retried.

use crate::constants::poll::{INTERVAL_SECS, TIMEOUT_SECS};
use crate::error::{ProbeError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    interval: Duration,
    timeout: Duration,
}

impl Poller {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Evaluate `check` every interval until it returns `true`.
    ///
    /// Fails with [`ProbeError::Timeout`] naming `description` once the
    /// deadline has passed.
    pub async fn until<F, Fut>(&self, description: &str, mut check: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            if check().await? {
                debug!(attempts, elapsed = ?start.elapsed(), "Condition met: {}", description);
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(ProbeError::Timeout {
                    description: description.to_string(),
                    elapsed,
                    attempts,
                });
            }

            sleep(self.interval.min(self.timeout - elapsed)).await;
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(INTERVAL_SECS),
            Duration::from_secs(TIMEOUT_SECS),
        )
    }
}
