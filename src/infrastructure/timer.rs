use crate::types::constants::{
    RECONNECT_INITIAL_DELAY, RECONNECT_MAX_ATTEMPTS, RECONNECT_MAX_DELAY,
};
use std::time::Duration;

/// Bounded exponential backoff for redialing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait before the first attempt.
    pub initial_delay: Duration,
    /// Ceiling the doubling stops at.
    pub max_delay: Duration,
    /// Dial attempts before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(RECONNECT_INITIAL_DELAY),
            max_delay: Duration::from_millis(RECONNECT_MAX_DELAY),
            max_attempts: RECONNECT_MAX_ATTEMPTS,
        }
    }
}

/// Timer for reconnection logic with exponential backoff
#[derive(Debug, Clone)]
pub struct Timer {
    policy: ReconnectPolicy,
    attempts: u32,
    next: Duration,
}

impl Timer {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            next: policy.initial_delay.min(policy.max_delay),
        }
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.policy.max_attempts {
            return None;
        }

        let delay = self.next;
        self.attempts += 1;
        self.next = self.next.saturating_mul(2).min(self.policy.max_delay);
        Some(delay)
    }

    /// Counts an attempt made without waiting, such as the first dial of a
    /// session. The delay schedule is left where it was.
    pub fn count_immediate_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Attempts handed out since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Reset the timer
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.next = self.policy.initial_delay.min(self.policy.max_delay);
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
