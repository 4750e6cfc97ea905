//! # Clock
//!
//! The only source of "now" for promotion evaluation.
//!
//! Eligibility depends on the wall clock of the store (weekday, minute of
//! day), so the clock yields a `DateTime<FixedOffset>`: the instant plus the
//! offset in which weekday/time-of-day windows are read.
//!
//! ```text
//! PromotionEngine ──► clock.now() ──► run_pass(items, promotions, now)
//!                        │
//!                        ├── SystemClock  (production: local or configured offset)
//!                        └── FixedClock   (tests, `--at` on the CLI)
//! ```

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Supplies the current timestamp.
pub trait Clock: Send + Sync {
    /// Returns the current instant in the store's local offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the system clock.
///
/// Without an explicit offset the host's local timezone is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    /// Clock in the host's local timezone.
    pub fn new() -> Self {
        SystemClock { offset: None }
    }

    /// Clock pinned to a fixed UTC offset (e.g. a till whose OS timezone is UTC).
    pub fn with_offset(offset: FixedOffset) -> Self {
        SystemClock {
            offset: Some(offset),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset),
            None => Local::now().fixed_offset(),
        }
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<FixedOffset>);

impl FixedClock {
    /// Creates a clock frozen at `at`.
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        FixedClock(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}
