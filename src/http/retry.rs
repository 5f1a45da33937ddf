//! Retry policy and status classification for authenticated requests.

use reqwest::StatusCode;
use std::time::Duration;

/// Attempts per logical request, including the first.
pub const MAX_ATTEMPTS: usize = 3;

/// Delay before re-authenticating after a 401/403, in milliseconds.
pub const RETRY_DELAY_MS: u64 = 300;

/// How many times a request is sent and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Same attempt budget, no waiting. Used by tests.
    pub fn immediate() -> Self {
        Self::new(MAX_ATTEMPTS, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, Duration::from_millis(RETRY_DELAY_MS))
    }
}

/// What a response status means for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    RateLimited,
    /// Anything else, including 401/403. The retry loop tells those apart
    /// through `ConnectError::is_auth_failure`.
    Failure,
}

pub fn classify_status(status: StatusCode) -> StatusClass {
    match status {
        StatusCode::OK | StatusCode::NO_CONTENT => StatusClass::Success,
        StatusCode::TOO_MANY_REQUESTS => StatusClass::RateLimited,
        _ => StatusClass::Failure,
    }
}
