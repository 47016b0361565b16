//! Clock abstraction for testability.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations so components that read the
/// clock (the ID allocator, aggregate timestamps) can be driven
/// deterministically in tests.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
