use std::time::{Duration, Instant};

use crate::shared::constants::CYCLE_PERIOD_MS;

/// Fixed-cadence scheduler for analysis cycles.
///
/// Pure bookkeeping over caller-supplied instants: hosts drive it from their
/// own clock and tests never sleep. While armed, `poll` fires at most once
/// per period. A host that polls late gets one tick, not a burst; the missed
/// periods are skipped.
#[derive(Clone, Debug)]
pub struct CycleTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl CycleTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn with_default_period() -> Self {
        Self::new(Duration::from_millis(CYCLE_PERIOD_MS))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arms the timer so the next tick lands one full period after `now`,
    /// discarding any previously scheduled tick.
    pub fn restart(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    /// Disarms the timer. `poll` returns false until the next restart.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Settings-change hook: cancels the pending tick and, when `active`,
    /// schedules a fresh full period from `now`. A change therefore takes
    /// effect after at most one period instead of waiting out the remainder
    /// of the old one.
    pub fn rearm(&mut self, now: Instant, active: bool) {
        self.cancel();
        if active {
            self.restart(now);
        }
    }

    /// Returns true when a tick is due. Firing schedules the next tick one
    /// period after `now`, never at the historical due instant.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_unarmed_timer_never_fires() {
        let mut timer = CycleTimer::new(ms(1500));
        let t0 = Instant::now();
        assert!(!timer.poll(t0));
        assert!(!timer.poll(t0 + ms(10_000)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_fires_one_full_period_after_restart() {
        let mut timer = CycleTimer::new(ms(1500));
        let t0 = Instant::now();
        timer.restart(t0);
        assert!(!timer.poll(t0));
        assert!(!timer.poll(t0 + ms(1499)));
        assert!(timer.poll(t0 + ms(1500)));
    }

    #[test]
    fn test_fires_at_most_once_per_period() {
        let mut timer = CycleTimer::new(ms(1500));
        let t0 = Instant::now();
        timer.restart(t0);
        assert!(timer.poll(t0 + ms(1500)));
        assert!(!timer.poll(t0 + ms(1501)));
        assert!(!timer.poll(t0 + ms(2999)));
        assert!(timer.poll(t0 + ms(3000)));
    }

    #[test]
    fn test_late_poll_skips_missed_periods_without_burst() {
        let mut timer = CycleTimer::new(ms(1500));
        let t0 = Instant::now();
        timer.restart(t0);
        // Host stalls for ten periods, then polls twice in a row
        assert!(timer.poll(t0 + ms(15_000)));
        assert!(!timer.poll(t0 + ms(15_001)));
        // Next tick is a full period after the late poll, not t0 + 11 periods
        assert!(!timer.poll(t0 + ms(16_499)));
        assert!(timer.poll(t0 + ms(16_500)));
    }

    #[test]
    fn test_restart_pushes_back_pending_tick() {
        let mut timer = CycleTimer::new(ms(1500));
        let t0 = Instant::now();
        timer.restart(t0);
        timer.restart(t0 + ms(1000));
        assert!(!timer.poll(t0 + ms(1500)));
        assert!(timer.poll(t0 + ms(2500)));
    }

    #[test]
    fn test_cancel_disarms() {
        let mut timer = CycleTimer::new(ms(1500));
        let t0 = Instant::now();
        timer.restart(t0);
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.poll(t0 + ms(10_000)));
    }

    #[test]
    fn test_rearm_active_schedules_fresh_period() {
        let mut timer = CycleTimer::new(ms(1500));
        let t0 = Instant::now();
        timer.restart(t0);
        // Settings change at t0+1400, just before the old tick was due
        timer.rearm(t0 + ms(1400), true);
        assert!(!timer.poll(t0 + ms(1500)));
        assert!(timer.poll(t0 + ms(2900)));
    }

    #[test]
    fn test_rearm_inactive_just_cancels() {
        let mut timer = CycleTimer::new(ms(1500));
        let t0 = Instant::now();
        timer.restart(t0);
        timer.rearm(t0 + ms(100), false);
        assert!(!timer.is_armed());
        assert!(!timer.poll(t0 + ms(60_000)));
    }

    #[test]
    fn test_default_period_is_1500ms() {
        assert_eq!(CycleTimer::with_default_period().period(), ms(1500));
    }
}
