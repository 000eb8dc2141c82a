use std::time::{Duration, Instant};

/// A countdown measured against caller-supplied instants, so that
/// heartbeats, resends and timeouts follow the tick driver's clock
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            last: now,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn ringing(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.duration
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
