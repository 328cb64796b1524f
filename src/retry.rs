// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Retry of read-modify-write updates that lose an optimistic-concurrency race.

use crate::error::{ProbeError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Backoff schedule between conflicting attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Total number of attempts, including the first
    pub steps: u32,
    pub duration: Duration,
    /// Multiplier applied to the delay after each attempt
    pub factor: f64,
    /// Up to this fraction of the delay is added at random
    pub jitter: f64,
}

impl Backoff {
    /// Five attempts, 10ms apart with up to 10% jitter.
    pub const DEFAULT: Backoff = Backoff {
        steps: 5,
        duration: Duration::from_millis(10),
        factor: 1.0,
        jitter: 0.1,
    };

    /// Delay to sleep after the given (1-based) failed attempt
    fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let base = self.duration.as_secs_f64() * self.factor.powi(exponent);
        let jitter = if self.jitter > 0.0 {
            base * self.jitter * rand::thread_rng().gen::<f64>()
        } else {
            0.0
        };
        Duration::from_secs_f64(base + jitter)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// True for a 409 caused by a stale resourceVersion.
///
/// `AlreadyExists` shares the status code but is a naming collision, not a
/// lost update, and must not be retried.
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409 && resp.reason != "AlreadyExists")
}

/// True for a create rejected because the name is already taken
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists")
}

/// Run `op` until it succeeds, retrying only on update conflicts.
///
/// `op` must re-fetch the object on every call so the retried attempt works
/// on the latest version. Any other error is returned immediately.
pub async fn retry_on_conflict<T, F, Fut>(backoff: &Backoff, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, kube::Error>>,
{
    let steps = backoff.steps.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_conflict(&e) && attempt < steps => {
                let delay = backoff.delay(attempt);
                debug!(attempt, steps, ?delay, "Update conflict, retrying");
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) if is_conflict(&e) => {
                warn!(attempts = attempt, "Update conflict retries exhausted");
                return Err(ProbeError::ConflictRetriesExhausted {
                    attempts: attempt,
                    source: e,
                });
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{} error", reason),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_is_conflict() {
        assert!(is_conflict(&api_error(409, "Conflict")));
        assert!(!is_conflict(&api_error(409, "AlreadyExists")));
        assert!(!is_conflict(&api_error(404, "NotFound")));
    }

    #[test]
    fn test_is_already_exists() {
        assert!(is_already_exists(&api_error(409, "AlreadyExists")));
        assert!(!is_already_exists(&api_error(409, "Conflict")));
        assert!(!is_already_exists(&api_error(500, "InternalError")));
    }

    #[test]
    fn test_delay_stays_within_jitter_bounds() {
        let backoff = Backoff::DEFAULT;
        for attempt in 1..=5 {
            let delay = backoff.delay(attempt);
            assert!(delay >= Duration::from_millis(10));
            assert!(delay < Duration::from_millis(12));
        }
    }

    #[test]
    fn test_delay_grows_with_factor() {
        let backoff = Backoff {
            steps: 4,
            duration: Duration::from_millis(10),
            factor: 2.0,
            jitter: 0.0,
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(10));
        assert_eq!(backoff.delay(3), Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_succeeds_after_conflicts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = retry_on_conflict(&Backoff::DEFAULT, move || {
            let c = calls_clone.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(api_error(409, "Conflict"))
                } else {
                    Ok("updated")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "updated");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<()> = retry_on_conflict(&Backoff::DEFAULT, move || {
            let c = calls_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(api_error(422, "Invalid"))
            }
        })
        .await;

        assert!(matches!(result, Err(ProbeError::KubeError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_after_configured_steps() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<()> = retry_on_conflict(&Backoff::DEFAULT, move || {
            let c = calls_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(api_error(409, "Conflict"))
            }
        })
        .await;

        match result {
            Err(ProbeError::ConflictRetriesExhausted { attempts, .. }) => assert_eq!(attempts, 5),
            other => panic!("expected ConflictRetriesExhausted, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}
