//! Countdown state
//!
//! Remaining time is always recomputed from a monotonic start instant rather
//! than decremented per tick, so dropped or late ticks never cause drift.

use std::time::Duration;

use tokio::time::Instant;

/// `max(0, duration - elapsed)`
pub fn remaining_after(duration: Duration, elapsed: Duration) -> Duration {
    duration.saturating_sub(elapsed)
}

/// Format a duration as `HH:MM:SS`
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[derive(Debug, Clone)]
pub struct CountdownState {
    duration: Duration,
    warning: Option<Duration>,
    started_at: Option<Instant>,
    expiry_raised: bool,
    warning_raised: bool,
}

impl CountdownState {
    pub fn new(duration: Duration, warning: Option<Duration>) -> Self {
        Self {
            duration,
            warning,
            started_at: None,
            expiry_raised: false,
            warning_raised: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start the stopwatch. Restarting an already running countdown is ignored.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        remaining_after(self.duration, self.elapsed(now))
    }

    /// Whether the countdown has entered its warning window
    pub fn in_warning(&self, now: Instant) -> bool {
        self.warning
            .is_some_and(|warning| self.is_started() && self.remaining(now) <= warning)
    }

    /// Returns true exactly once: the first time the countdown is observed
    /// at zero.
    pub fn take_expiry(&mut self, now: Instant) -> bool {
        if self.expiry_raised || !self.is_started() || !self.remaining(now).is_zero() {
            return false;
        }
        self.expiry_raised = true;
        true
    }

    /// Returns true exactly once: the first time the warning window is
    /// observed.
    pub fn take_warning(&mut self, now: Instant) -> bool {
        if self.warning_raised || !self.in_warning(now) {
            return false;
        }
        self.warning_raised = true;
        true
    }

    pub fn is_expired(&self) -> bool {
        self.expiry_raised
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_remaining(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_remaining(Duration::from_secs(3_725)), "01:02:05");
        assert_eq!(format_remaining(Duration::from_millis(1_999)), "00:00:01");
    }

    #[test]
    fn test_not_started_reports_full_duration() {
        let countdown = CountdownState::new(Duration::from_secs(10), None);
        let now = Instant::now();
        assert_eq!(countdown.remaining(now), Duration::from_secs(10));
        assert!(!countdown.in_warning(now));
    }

    #[test]
    fn test_expiry_raised_once() {
        let start = Instant::now();
        let mut countdown = CountdownState::new(Duration::from_secs(10), None);
        countdown.start(start);

        assert!(!countdown.take_expiry(start + Duration::from_secs(9)));
        assert!(countdown.take_expiry(start + Duration::from_secs(10)));
        assert!(!countdown.take_expiry(start + Duration::from_secs(11)));
        assert!(countdown.is_expired());
        assert_eq!(countdown.remaining(start + Duration::from_secs(30)), Duration::ZERO);
    }

    #[test]
    fn test_warning_window() {
        let start = Instant::now();
        let mut countdown = CountdownState::new(Duration::from_secs(60), Some(Duration::from_secs(15)));
        countdown.start(start);

        assert!(!countdown.take_warning(start + Duration::from_secs(44)));
        assert!(countdown.take_warning(start + Duration::from_secs(45)));
        assert!(!countdown.take_warning(start + Duration::from_secs(50)));
        assert!(countdown.in_warning(start + Duration::from_secs(50)));
    }

    #[test]
    fn test_restart_ignored() {
        let start = Instant::now();
        let mut countdown = CountdownState::new(Duration::from_secs(10), None);
        countdown.start(start);
        countdown.start(start + Duration::from_secs(5));
        assert_eq!(countdown.elapsed(start + Duration::from_secs(6)), Duration::from_secs(6));
    }
}
