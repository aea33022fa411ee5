use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
///
/// Services take an `Arc<dyn Clock>` instead of calling `Utc::now()` so tests
/// can drive window expiry and queue ageing deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
