//! Hold-to-reveal timing.
//!
//! A reveal needs a continuous press of at least `required` duration,
//! measured on the monotonic clock between press-start and press-end.
//! Releasing early, or losing the pointer, resets the gate.

use std::time::{Duration, Instant};

/// Result of ending a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOutcome {
    /// Held long enough; disclosure may proceed.
    Completed,
    /// Released before the required duration.
    TooShort { elapsed: Duration },
}

/// An in-progress press. Exists only while the gate is `Holding`.
#[derive(Debug, Clone)]
pub struct HoldProgress {
    pub started_at: Instant,
    pub required: Duration,
}

impl HoldProgress {
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Classify the press. Consumes the progress, so a press ends once.
    pub fn finish(self, elapsed: Duration) -> HoldOutcome {
        if elapsed >= self.required {
            HoldOutcome::Completed
        } else {
            HoldOutcome::TooShort { elapsed }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HoldToRevealTimer {
    required: Duration,
}

impl HoldToRevealTimer {
    pub fn new(required: Duration) -> Self {
        Self { required }
    }

    pub fn required(&self) -> Duration {
        self.required
    }

    pub fn start(&self, now: Instant) -> HoldProgress {
        HoldProgress {
            started_at: now,
            required: self.required,
        }
    }
}
