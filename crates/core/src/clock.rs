// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable entry timestamps

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A clock that provides wall-clock time as milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<i64>>,
}

impl FakeClock {
    /// Start at a fixed, recognizable instant (2026-01-01T00:00:00Z)
    pub fn new() -> Self {
        Self::at(1_767_225_600_000)
    }

    /// Start at the given epoch milliseconds
    pub fn at(millis: i64) -> Self {
        Self {
            current: Arc::new(Mutex::new(millis)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration.as_millis() as i64;
    }

    /// Set the clock to a specific epoch millisecond value
    pub fn set(&self, millis: i64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = millis;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now_millis(&self) -> i64 {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
