//! Resume timer for the user pause.
//!
//! # State Machine
//!
//! ```text
//!            schedule(now)             fire(now >= deadline)
//!   Disarmed ------------> Armed ---------------------------> Disarmed
//!       ^                  |   ^
//!       |     cancel()     |   | schedule(now) (restart, not extend)
//!       +------------------+   +---
//! ```
//!
//! The timer holds only a deadline. Whoever hosts the controller sleeps
//! until [`ResumeTimer::deadline`] and then reports the firing; a firing
//! that arrives after `cancel` or before the deadline is ignored, so a stale
//! wake-up can never resume follow mode.

use std::time::Duration;

use tokio::time::Instant;

/// Default quiet period after the last touch before follow resumes.
pub const DEFAULT_RESUME_DELAY: Duration = Duration::from_secs(5);

/// Cancellable, restartable, fire-once deadline.
#[derive(Debug, Clone)]
pub struct ResumeTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl ResumeTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the timer for `now + delay`.
    ///
    /// Re-arming replaces the old deadline; the countdown starts over.
    pub fn schedule(&mut self, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.deadline = Some(deadline);
        deadline
    }

    /// Disarm. Returns whether the timer was armed.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Consume the firing if the timer is armed and due.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// When the timer will fire, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for ResumeTimer {
    fn default() -> Self {
        Self::new(DEFAULT_RESUME_DELAY)
    }
}
