//! Progress percentage animation
//!
//! Progress updates glide toward the new value instead of snapping. The
//! displayed value is a pure function of the animation start, target and
//! the current instant.

use std::time::Duration;

use tokio::time::Instant;

/// Time taken to glide from the old value to a new one
pub const ANIMATION_DURATION: Duration = Duration::from_millis(250);

/// Interval between animation frames
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Clone)]
pub struct ProgressAnimation {
    from: f64,
    to: f64,
    started_at: Instant,
    duration: Duration,
}

fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

impl ProgressAnimation {
    /// Settled at `value`
    pub fn at_rest(value: f64, now: Instant) -> Self {
        let value = value.clamp(0.0, 100.0);
        Self {
            from: value,
            to: value,
            started_at: now,
            duration: Duration::ZERO,
        }
    }

    /// Retarget from wherever the animation currently is
    pub fn retarget(&mut self, target: f64, now: Instant) {
        self.from = self.value_at(now);
        self.to = target.clamp(0.0, 100.0);
        self.started_at = now;
        self.duration = ANIMATION_DURATION;
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = now.saturating_duration_since(self.started_at).as_secs_f64()
            / self.duration.as_secs_f64();
        if t >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * ease_out_cubic(t)
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        !self.duration.is_zero() && now < self.started_at + self.duration
    }
}
