//! Single-shot timer slot with cancel-and-replace semantics
//!
//! The controller task owns one slot per timer role and sleeps until the
//! earliest armed deadline. A slot holds at most one deadline, so arming it
//! again replaces the stale one instead of stacking a second timer.

use std::time::Duration;

use tokio::time::Instant;

/// Deadline offset used when `now + delay` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// One optional deadline
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerSlot {
    deadline: Option<Instant>,
}

impl TimerSlot {
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm the slot to fire `delay` after `now`, replacing any pending deadline
    ///
    /// Delays past the representable range saturate to a far-future deadline.
    pub fn schedule_in(&mut self, now: Instant, delay: Duration) {
        let deadline = now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE);
        self.deadline = Some(deadline);
    }

    /// Disarm the slot
    ///
    /// Returns whether a deadline was pending. Cancelling an idle slot is a no-op.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarm and report `true` if the deadline has passed at `now`
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_replaces_pending_deadline() {
        let now = Instant::now();
        let mut slot = TimerSlot::new();

        slot.schedule_in(now, Duration::from_secs(10));
        slot.schedule_in(now, Duration::from_millis(5));

        assert_eq!(slot.deadline(), Some(now + Duration::from_millis(5)));
    }

    #[test]
    fn test_oversized_delay_saturates() {
        let now = Instant::now();
        let mut slot = TimerSlot::new();

        slot.schedule_in(now, Duration::MAX);

        let deadline = slot.deadline().unwrap();
        assert!(deadline > now + Duration::from_secs(365 * 24 * 60 * 60));
        assert!(!slot.take_if_due(now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut slot = TimerSlot::new();
        slot.schedule_in(Instant::now(), Duration::from_secs(1));

        assert!(slot.cancel());
        assert!(!slot.cancel());
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_take_if_due() {
        let now = Instant::now();
        let mut slot = TimerSlot::new();
        slot.schedule_in(now, Duration::from_millis(100));

        assert!(!slot.take_if_due(now));
        assert!(slot.is_pending());

        assert!(slot.take_if_due(now + Duration::from_millis(100)));
        assert!(!slot.is_pending());
        assert!(!slot.take_if_due(now + Duration::from_secs(1)));
    }
}
