//! Strictly increasing timestamps for insert ordering.
//!
//! Two inserts issued in quick succession can observe the same
//! `Utc::now()` value. [`MonotonicClock`] bumps such readings by one
//! microsecond so `created_at` always increases with insertion order
//! within a process.

use std::sync::Mutex;

use chrono::{Duration, Utc};

use crate::types::Timestamp;

/// Process-local clock that never returns the same instant twice.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<Timestamp>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current UTC time, or one microsecond past the previous reading if the
    /// wall clock has not advanced (or has gone backwards).
    pub fn now(&self) -> Timestamp {
        self.next_after(Utc::now())
    }

    fn next_after(&self, candidate: Timestamp) -> Timestamp {
        // A poisoned lock only means another thread panicked mid-read; the
        // stored value is still a valid timestamp.
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let next = match *last {
            Some(prev) if candidate <= prev => prev + Duration::microseconds(1),
            _ => candidate,
        };
        *last = Some(next);
        next
    }
}
