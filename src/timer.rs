//! Wall-clock countdown for the work and break intervals.
//!
//! The timer owns no thread. Callers pass the current instant, so reading the
//! remaining time is a pure computation and tests can drive time by hand.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Source of the current wall-clock time.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Hand-advanced clock for tests and headless runs. Clones share one instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionTimer {
    started_at: Option<SystemTime>,
    total_secs: u64,
    running: bool,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever the timer was doing with a fresh countdown.
    pub fn start(&mut self, total_secs: u64, now: SystemTime) {
        self.started_at = Some(now);
        self.total_secs = total_secs;
        self.running = true;
    }

    pub fn start_minutes(&mut self, minutes: u32, now: SystemTime) {
        self.start(minutes as u64 * 60, now);
    }

    /// Leaves `total_secs` and `started_at` readable; `remaining` reads 0 afterwards.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whole seconds since the countdown started.
    pub fn elapsed(&self, now: SystemTime) -> u64 {
        match self.started_at {
            Some(start) => now.duration_since(start).unwrap_or_default().as_secs(),
            None => 0,
        }
    }

    pub fn remaining(&self, now: SystemTime) -> u64 {
        if !self.running || self.started_at.is_none() {
            return 0;
        }
        self.total_secs.saturating_sub(self.elapsed(now))
    }

    /// Running but out of time. The owner decides what happens next.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.running && self.remaining(now) == 0
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }
}

/// `MM:SS`, minutes unbounded.
pub fn format_mmss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
