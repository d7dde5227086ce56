//! Rest timer between sets.
//!
//! The timer stores a wall-clock deadline and recomputes the remaining time
//! on every tick, so a host that suspends its periodic callback (app in the
//! background, laptop lid closed) still sees the correct countdown when it
//! wakes up.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Countdown between sets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestTimer {
    pub is_running: bool,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    deadline: Option<DateTime<Utc>>,
    finished: bool,
}

impl RestTimer {
    /// (Re)start the countdown from `seconds`
    pub fn start(&mut self, seconds: u32, now: DateTime<Utc>) {
        self.total_seconds = seconds;
        self.remaining_seconds = seconds;
        self.is_running = seconds > 0;
        self.finished = seconds == 0;
        self.deadline = Some(now + Duration::seconds(i64::from(seconds)));
        tracing::debug!("Rest timer started: {}s", seconds);
    }

    /// Recompute remaining time from the deadline
    ///
    /// Returns true exactly once, on the tick that reaches zero. A timer
    /// that was skipped or already finished ignores ticks.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_running {
            return false;
        }
        let Some(deadline) = self.deadline else {
            return false;
        };

        let left_ms = (deadline - now).num_milliseconds().max(0);
        // Round up so "0.4s left" still shows 1
        self.remaining_seconds = u32::try_from((left_ms + 999) / 1000).unwrap_or(u32::MAX);

        if self.remaining_seconds == 0 {
            self.is_running = false;
            self.deadline = None;
            if !self.finished {
                self.finished = true;
                tracing::debug!("Rest timer finished");
                return true;
            }
        }
        false
    }

    /// Stop immediately without signalling completion
    pub fn skip(&mut self) {
        self.is_running = false;
        self.remaining_seconds = 0;
        self.deadline = None;
        self.finished = true;
    }

    /// Fraction of the rest elapsed, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 1.0;
        }
        1.0 - f64::from(self.remaining_seconds) / f64::from(self.total_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_counts_down_from_deadline() {
        let clock = ManualClock::new(start());
        let mut timer = RestTimer::default();
        timer.start(90, clock.now());
        assert!(timer.is_running);
        assert_eq!(timer.remaining_seconds, 90);

        clock.advance(Duration::seconds(30));
        assert!(!timer.tick(clock.now()));
        assert_eq!(timer.remaining_seconds, 60);
    }

    #[test]
    fn test_survives_suspension() {
        let clock = ManualClock::new(start());
        let mut timer = RestTimer::default();
        timer.start(60, clock.now());

        // No ticks for 45s, then a single wake-up
        clock.advance(Duration::seconds(45));
        timer.tick(clock.now());
        assert_eq!(timer.remaining_seconds, 15);

        clock.advance(Duration::minutes(10));
        assert!(timer.tick(clock.now()));
        assert_eq!(timer.remaining_seconds, 0);
        assert!(!timer.is_running);
    }

    #[test]
    fn test_finish_fires_once() {
        let clock = ManualClock::new(start());
        let mut timer = RestTimer::default();
        timer.start(2, clock.now());

        clock.advance(Duration::seconds(1));
        assert!(!timer.tick(clock.now()));
        clock.advance(Duration::seconds(1));
        assert!(timer.tick(clock.now()));
        clock.advance(Duration::seconds(1));
        assert!(!timer.tick(clock.now()));
    }

    #[test]
    fn test_skip_is_idempotent_and_wins_over_ticks() {
        let clock = ManualClock::new(start());
        let mut timer = RestTimer::default();
        timer.start(60, clock.now());

        timer.skip();
        assert_eq!(timer.remaining_seconds, 0);
        assert!(!timer.is_running);
        timer.skip();
        assert_eq!(timer.remaining_seconds, 0);
        assert!(!timer.is_running);

        clock.advance(Duration::seconds(60));
        assert!(!timer.tick(clock.now()));
        assert_eq!(timer.remaining_seconds, 0);
    }

    #[test]
    fn test_restart_resets() {
        let clock = ManualClock::new(start());
        let mut timer = RestTimer::default();
        timer.start(10, clock.now());
        clock.advance(Duration::seconds(10));
        assert!(timer.tick(clock.now()));

        timer.start(30, clock.now());
        assert!(timer.is_running);
        assert_eq!(timer.total_seconds, 30);
        clock.advance(Duration::seconds(30));
        assert!(timer.tick(clock.now()));
    }

    #[test]
    fn test_progress() {
        let clock = ManualClock::new(start());
        let mut timer = RestTimer::default();
        timer.start(100, clock.now());
        clock.advance(Duration::seconds(25));
        timer.tick(clock.now());
        assert!((timer.progress() - 0.25).abs() < 1e-9);
    }
}
