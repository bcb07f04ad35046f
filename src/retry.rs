use std::fmt::Display;
use std::time::Duration;

use tracing::debug;

/// Fixed-count, fixed-delay retry for blocking operations.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` with the 1-based attempt number until it succeeds or the
    /// attempts run out, sleeping `delay` in between. Returns the last error.
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(v) => return Ok(v),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    debug!(attempt, "attempt failed, retrying: {e}");
                    std::thread::sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}
