//! # Exponential Backoff
//!
//! Bounded exponential backoff used while waiting for a dependency to become
//! ready. The budget counts attempts, not waits: a budget of 5 means one
//! initial attempt and at most four delays.
//!
//! ## Usage
//!
//! ```rust
//! use bunny_cdn_operator::controller::backoff::{BackoffSettings, ExponentialBackoff};
//! use std::time::Duration;
//!
//! let mut backoff = ExponentialBackoff::new(BackoffSettings::new(500, 2, 5));
//! assert_eq!(backoff.next_delay(), Some(Duration::from_millis(500)));
//! assert_eq!(backoff.next_delay(), Some(Duration::from_millis(1000)));
//! assert_eq!(backoff.next_delay(), Some(Duration::from_millis(2000)));
//! assert_eq!(backoff.next_delay(), Some(Duration::from_millis(4000)));
//! assert_eq!(backoff.next_delay(), None); // budget of 5 attempts used up
//! ```

use crate::constants::{
    DEFAULT_DEPENDENCY_BACKOFF_ATTEMPTS, DEFAULT_DEPENDENCY_BACKOFF_FACTOR,
    DEFAULT_DEPENDENCY_BACKOFF_START_MS,
};
use std::time::Duration;

/// Parameters of a bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffSettings {
    /// Delay before the second attempt, in milliseconds
    pub start_ms: u64,
    /// Multiplier applied to the delay after every wait
    pub factor: u32,
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
}

impl BackoffSettings {
    #[must_use]
    pub fn new(start_ms: u64, factor: u32, max_attempts: u32) -> Self {
        Self {
            start_ms,
            factor,
            max_attempts,
        }
    }
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_DEPENDENCY_BACKOFF_START_MS,
            DEFAULT_DEPENDENCY_BACKOFF_FACTOR,
            DEFAULT_DEPENDENCY_BACKOFF_ATTEMPTS,
        )
    }
}

/// Exponential backoff calculator with an attempt budget
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    settings: BackoffSettings,
    /// Attempts already made (the first attempt needs no delay)
    attempts: u32,
    current_ms: u64,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(settings: BackoffSettings) -> Self {
        Self {
            settings,
            attempts: 1,
            current_ms: settings.start_ms,
        }
    }

    /// Delay to wait before the next attempt, or `None` once the attempt
    /// budget is exhausted. Advances the sequence.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.settings.max_attempts {
            return None;
        }
        let delay = Duration::from_millis(self.current_ms);
        self.attempts += 1;
        self.current_ms = self
            .current_ms
            .saturating_mul(u64::from(self.settings.factor));
        Some(delay)
    }

    /// Number of attempts made so far
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
