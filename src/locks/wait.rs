//! Bounded waiting with exponential backoff.
//!
//! Every blocking acquisition in recsync goes through [`WaitPolicy::wait`]
//! unless the policy has no timeout and the strategy can block in the OS.

use crate::error::{Result, SyncError};
use std::thread;
use std::time::{Duration, Instant};

/// How long and how often to retry a contended lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Upper bound on the total wait. `None` waits forever.
    pub timeout: Option<Duration>,

    /// Sleep after the first failed attempt.
    pub initial_interval: Duration,

    /// Cap for the doubling sleep interval.
    pub max_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            initial_interval: Duration::from_millis(50),
            max_interval: Duration::from_secs(1),
        }
    }
}

impl WaitPolicy {
    /// A policy that tries exactly once.
    pub fn no_wait() -> Self {
        Self {
            timeout: Some(Duration::ZERO),
            ..Self::default()
        }
    }

    /// The instant a wait starting now must give up, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|timeout| Instant::now() + timeout)
    }

    /// Call `attempt` until it yields a value, sleeping between tries.
    ///
    /// `attempt` returns `Ok(None)` on contention. Errors end the loop at once.
    /// Once the timeout elapses the result is `SyncError::LockTimeout`.
    pub fn wait<T>(&self, what: &str, attempt: impl FnMut() -> Result<Option<T>>) -> Result<T> {
        self.wait_until(what, self.deadline(), attempt)
    }

    /// Like [`wait`](Self::wait), but against a deadline fixed by the caller.
    ///
    /// Steps of one acquisition share a single deadline this way. A deadline
    /// already in the past still allows one attempt.
    pub fn wait_until<T>(
        &self,
        what: &str,
        deadline: Option<Instant>,
        mut attempt: impl FnMut() -> Result<Option<T>>,
    ) -> Result<T> {
        let mut interval = self.initial_interval;
        let mut tries: u64 = 0;

        loop {
            tries += 1;
            if let Some(value) = attempt()? {
                if tries > 1 {
                    log::debug!("acquired {} after {} attempts", what, tries);
                }
                return Ok(value);
            }

            let mut sleep = interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(SyncError::LockTimeout(format!(
                        "{} not acquired within {} ms ({} attempts)",
                        what,
                        self.timeout.unwrap_or_default().as_millis(),
                        tries
                    )));
                }
                sleep = sleep.min(deadline - now);
            }

            thread::sleep(sleep);
            interval = interval.saturating_mul(2).min(self.max_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_immediately_on_first_success() {
        let policy = WaitPolicy::no_wait();
        let value = policy.wait("lock", || Ok(Some(7))).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn no_wait_tries_exactly_once() {
        let policy = WaitPolicy::no_wait();
        let mut calls = 0;
        let err = policy
            .wait::<()>("lock 'a.lock'", || {
                calls += 1;
                Ok(None)
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, SyncError::LockTimeout(_)));
        assert!(err.to_string().contains("lock 'a.lock'"));
    }

    #[test]
    fn retries_until_attempt_succeeds() {
        let policy = WaitPolicy {
            timeout: Some(Duration::from_secs(5)),
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
        };
        let mut calls = 0;
        let value = policy
            .wait("lock", || {
                calls += 1;
                Ok(if calls == 4 { Some("held") } else { None })
            })
            .unwrap();

        assert_eq!(value, "held");
        assert_eq!(calls, 4);
    }

    #[test]
    fn errors_stop_the_loop() {
        let policy = WaitPolicy::default();
        let mut calls = 0;
        let err = policy
            .wait::<()>("lock", || {
                calls += 1;
                Err(SyncError::PermissionDenied("nope".to_string()))
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, SyncError::PermissionDenied(_)));
    }

    #[test]
    fn timeout_bounds_total_wait() {
        let policy = WaitPolicy {
            timeout: Some(Duration::from_millis(60)),
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(20),
        };
        let start = Instant::now();
        let err = policy.wait::<()>("lock", || Ok(None)).unwrap_err();

        assert!(matches!(err, SyncError::LockTimeout(_)));
        assert!(start.elapsed() >= Duration::from_millis(60));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn past_deadline_allows_one_attempt() {
        let policy = WaitPolicy::default();
        let deadline = Instant::now() - Duration::from_millis(1);
        let mut calls = 0;
        let err = policy
            .wait_until::<()>("lock", Some(deadline), || {
                calls += 1;
                Ok(None)
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, SyncError::LockTimeout(_)));
    }

    #[test]
    fn shared_deadline_spans_consecutive_waits() {
        let policy = WaitPolicy {
            timeout: Some(Duration::from_millis(200)),
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(10),
        };
        let start = Instant::now();
        let deadline = policy.deadline();

        let mut calls = 0;
        policy
            .wait_until("first step", deadline, || {
                calls += 1;
                Ok((start.elapsed() >= Duration::from_millis(150)).then_some(()))
            })
            .unwrap();
        let err = policy
            .wait_until::<()>("second step", deadline, || Ok(None))
            .unwrap_err();

        assert!(calls > 1);
        assert!(matches!(err, SyncError::LockTimeout(_)));
        assert!(start.elapsed() < Duration::from_millis(300));
    }
}
