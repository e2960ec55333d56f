//! Capped exponential retry used by both readiness probes.

use std::{future::Future, time::Duration};

use tokio::time::{sleep, timeout, Instant};

use crate::backend_config::ProbeSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Overall budget across every attempt and sleep.
    pub deadline: Duration,
    /// Budget of a single attempt. Expiry only fails that attempt.
    pub attempt_timeout: Duration,
}

impl BackoffPolicy {
    pub fn from_probe(settings: &ProbeSettings) -> Self {
        Self {
            initial_delay: settings.min_delay,
            multiplier: settings.multiplier,
            max_delay: settings.max_delay,
            deadline: settings.overall_timeout,
            attempt_timeout: settings.probe_timeout,
        }
    }

    pub fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max_delay)
    }

    /// Infinite sequence `initial, initial*m, ...` capped at `max_delay`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay.min(self.max_delay)), move |delay| {
            Some(self.next_delay(*delay))
        })
    }
}

/// Runs `attempt` immediately, then after each backoff delay, until it yields
/// `Some` or the deadline passes. Dropping the returned future cancels the
/// whole wait.
pub async fn retry_with_backoff<T, F, Fut>(policy: &BackoffPolicy, mut attempt: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + policy.deadline;
    let mut delays = policy.delays();
    let mut attempt_no = 0_u32;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let budget = policy.attempt_timeout.min(remaining);
        if let Ok(Some(value)) = timeout(budget, attempt(attempt_no)).await {
            return Some(value);
        }
        attempt_no += 1;

        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        let delay = delays.next().unwrap_or(policy.max_delay);
        sleep(delay.min(deadline - now)).await;
        if Instant::now() >= deadline {
            return None;
        }
    }
}
