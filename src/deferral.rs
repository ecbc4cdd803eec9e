//! Deferral policy
//!
//! Pure decision logic over the remaining deferral count and deadline. The
//! caller supplies `now`, which keeps every decision reproducible.

use chrono::{DateTime, Utc};

use crate::outcome::DialogOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeferralPolicy {
    pub remaining_count: Option<u32>,
    pub deadline: Option<DateTime<Utc>>,
    pub forced: bool,
}

impl DeferralPolicy {
    pub fn new(remaining_count: Option<u32>, deadline: Option<DateTime<Utc>>, forced: bool) -> Self {
        Self {
            remaining_count,
            deadline,
            forced,
        }
    }

    /// Deferral is a concept for this dialog at all
    pub fn is_configured(&self) -> bool {
        self.remaining_count.is_some() || self.deadline.is_some()
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.remaining_count.is_some_and(|count| count > 0)
            || self.deadline.is_some_and(|deadline| deadline > now)
    }

    pub fn is_exhausted(&self, now: DateTime<Utc>) -> bool {
        self.remaining_count == Some(0) || self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Enabled state of the defer (right-hand) button
    pub fn defer_enabled(&self, now: DateTime<Utc>) -> bool {
        !self.is_configured() || self.is_available(now)
    }

    /// Outcome of the primary button given the blocking-application state
    pub fn primary_outcome(blocking_present: bool) -> DialogOutcome {
        if blocking_present {
            DialogOutcome::Close
        } else {
            DialogOutcome::Continue
        }
    }

    /// Resolve a countdown expiry.
    ///
    /// With a forced countdown: no blockers → `Continue`; deferral available
    /// → `Defer`; otherwise the primary action. Without it the primary
    /// action always wins.
    pub fn resolve_countdown(&self, blocking_present: bool, now: DateTime<Utc>) -> DialogOutcome {
        if !self.forced {
            return Self::primary_outcome(blocking_present);
        }
        if !blocking_present {
            DialogOutcome::Continue
        } else if self.is_available(now) {
            DialogOutcome::Defer
        } else {
            Self::primary_outcome(blocking_present)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_unconfigured_is_always_enabled() {
        let now = Utc::now();
        let policy = DeferralPolicy::default();
        assert!(!policy.is_configured());
        assert!(!policy.is_available(now));
        assert!(!policy.is_exhausted(now));
        assert!(policy.defer_enabled(now));
    }

    #[test]
    fn test_zero_count_disables() {
        let now = Utc::now();
        let policy = DeferralPolicy::new(Some(0), None, false);
        assert!(policy.is_exhausted(now));
        assert!(!policy.defer_enabled(now));
    }

    #[test]
    fn test_deadline() {
        let now = Utc::now();
        let future = DeferralPolicy::new(None, Some(now + Duration::hours(1)), false);
        assert!(future.defer_enabled(now));

        let past = DeferralPolicy::new(None, Some(now - Duration::hours(1)), false);
        assert!(!past.defer_enabled(now));
        assert!(past.is_exhausted(now));

        // Count still available even though the deadline passed
        let mixed = DeferralPolicy::new(Some(1), Some(now - Duration::hours(1)), false);
        assert!(mixed.defer_enabled(now));
        assert!(mixed.is_exhausted(now));
    }

    #[test]
    fn test_forced_precedence() {
        let now = Utc::now();
        let policy = DeferralPolicy::new(Some(2), None, true);
        assert_eq!(policy.resolve_countdown(false, now), DialogOutcome::Continue);
        assert_eq!(policy.resolve_countdown(true, now), DialogOutcome::Defer);

        let exhausted = DeferralPolicy::new(Some(0), None, true);
        assert_eq!(exhausted.resolve_countdown(true, now), DialogOutcome::Close);
        assert_eq!(exhausted.resolve_countdown(false, now), DialogOutcome::Continue);
    }

    #[test]
    fn test_unforced_takes_primary_action() {
        let now = Utc::now();
        let policy = DeferralPolicy::new(Some(3), None, false);
        assert_eq!(policy.resolve_countdown(true, now), DialogOutcome::Close);
        assert_eq!(policy.resolve_countdown(false, now), DialogOutcome::Continue);
    }
}
