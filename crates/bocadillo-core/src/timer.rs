//! Cooperative repeating timers polled from the controller's tick.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct PollTimer {
    interval: Duration,
    next_due: Option<Instant>,
    armed_count: u64,
}

impl PollTimer {
    /// Arm the timer to first fire `interval` after `now`. Any schedule that
    /// was already running is replaced.
    pub fn arm(&mut self, now: Instant, interval: Duration) {
        self.interval = interval;
        self.next_due = Some(now + interval);
        self.armed_count += 1;
    }

    /// Returns whether the timer was running. Cancelling an idle timer is a no-op.
    pub fn cancel(&mut self) -> bool {
        self.next_due.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn armed_count(&self) -> u64 {
        self.armed_count
    }

    /// Fires at most once per call; late polls do not replay missed periods.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        let mut next = due + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.next_due = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::PollTimer;
    use std::time::{Duration, Instant};

    #[test]
    fn fires_on_interval_after_arming() {
        let start = Instant::now();
        let mut timer = PollTimer::default();
        timer.arm(start, Duration::from_millis(50));
        assert!(!timer.poll(start + Duration::from_millis(49)));
        assert!(timer.poll(start + Duration::from_millis(50)));
        assert!(!timer.poll(start + Duration::from_millis(60)));
        assert!(timer.poll(start + Duration::from_millis(100)));
    }

    #[test]
    fn late_poll_fires_once_and_reschedules_from_now() {
        let start = Instant::now();
        let mut timer = PollTimer::default();
        timer.arm(start, Duration::from_millis(50));
        assert!(timer.poll(start + Duration::from_millis(500)));
        assert!(!timer.poll(start + Duration::from_millis(520)));
        assert!(timer.poll(start + Duration::from_millis(550)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let start = Instant::now();
        let mut timer = PollTimer::default();
        assert!(!timer.cancel());
        timer.arm(start, Duration::from_millis(10));
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert!(!timer.poll(start + Duration::from_secs(1)));
    }

    #[test]
    fn rearming_replaces_the_running_schedule() {
        let start = Instant::now();
        let mut timer = PollTimer::default();
        timer.arm(start, Duration::from_millis(10));
        timer.arm(start + Duration::from_millis(5), Duration::from_millis(100));
        assert!(!timer.poll(start + Duration::from_millis(20)));
        assert!(timer.poll(start + Duration::from_millis(105)));
        assert_eq!(timer.armed_count(), 2);
    }
}
