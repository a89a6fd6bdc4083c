//! Time source for the stores.
//!
//! Day boundaries are evaluated in the device's local offset, so the clock
//! supplies both the instant and the offset it should be read in.

use chrono::{DateTime, FixedOffset, Local, Utc};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    /// Local UTC offset used for day boundaries.
    fn offset(&self) -> FixedOffset;

    /// `now()` in local time.
    fn local_now(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&self.offset())
    }
}

/// Wall clock in the system's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        *Local::now().offset()
    }
}
