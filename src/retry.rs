//! Bounded retries with linear backoff for flaky provider calls.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// How many times to try a request and how long to wait in between.
///
/// The wait after attempt `k` (counting from 0) is
/// `initial_delay + k * delay_step`. No wait follows the last attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub delay_step: Duration,
}

impl RetryPolicy {
    /// Geocoding backoff: waits 0 s, then 1.5 s.
    pub fn geocoding() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::ZERO,
            delay_step: Duration::from_millis(1500),
        }
    }

    /// Routing backoff: waits 2 s, then 4 s.
    pub fn routing() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            delay_step: Duration::from_secs(2),
        }
    }

    /// Retries without sleeping. Used by tests and offline runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            delay_step: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_delay + self.delay_step * attempt
    }

    /// Runs `op` until it succeeds or the attempts are exhausted.
    ///
    /// `op` receives the zero-based attempt number. The error of the last
    /// attempt is returned on exhaustion. A policy with zero attempts is
    /// treated as one.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(what, attempt = attempt + 1, attempts, error = %err, "attempt failed");
                    if attempt + 1 >= attempts {
                        return Err(err);
                    }
                    let delay = self.delay_after(attempt);
                    if !delay.is_zero() {
                        debug!(what, delay_ms = delay.as_millis() as u64, "backing off");
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
