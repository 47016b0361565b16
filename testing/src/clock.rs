//! Deterministic clocks for tests.

use chrono::{DateTime, Duration, Utc};
use flashsale_core::Clock;
use std::sync::{Mutex, PoisonError};

/// Fixed clock for deterministic tests.
///
/// Always returns the same time, making tests reproducible.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Clock that only moves when the test advances it.
#[derive(Debug)]
pub struct ManualClock {
    time: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a manual clock starting at the given time.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            time: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        *time = *time + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a default fixed clock for tests (2026-01-01 00:00:00 UTC).
///
/// # Panics
///
/// Panics if the hardcoded timestamp fails to parse, which should never
/// happen in practice.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_never_moves() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new(test_clock().now());
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));
    }
}
