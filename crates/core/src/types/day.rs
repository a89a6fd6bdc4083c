//! Day boundaries and the once-per-day gate.
//!
//! A "day" is not always a calendar day. Profile actions roll over at local
//! midnight, but anything scoped to a night out (daily counters, venue
//! interaction counts, chat retention) rolls over at 5:00 AM so a night that
//! runs past midnight still counts as one day. Every comparison goes through
//! [`DayBoundary::day_of`] with the boundary named explicitly.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Local wall-clock time at which one day ends and the next begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayBoundary {
    hour: u32,
    minute: u32,
}

impl DayBoundary {
    /// Plain calendar days.
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };
    /// Nightlife days, rolling over at 5:00 AM.
    pub const NIGHTLIFE: Self = Self { hour: 5, minute: 0 };
    /// Venue likes roll over one minute before the nightlife boundary.
    pub const LIKE_RESET: Self = Self {
        hour: 4,
        minute: 59,
    };

    /// Build a boundary, returning `None` for an invalid wall-clock time.
    #[must_use]
    pub const fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn hour(self) -> u32 {
        self.hour
    }

    #[must_use]
    pub const fn minute(self) -> u32 {
        self.minute
    }

    fn offset(self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.hour * 60 + self.minute))
    }

    /// The day `instant` belongs to: the local date of `instant` shifted
    /// back by the boundary.
    ///
    /// ```
    /// use barbuddy_core::DayBoundary;
    /// use chrono::{NaiveDate, TimeZone, Utc};
    ///
    /// let late = Utc.with_ymd_and_hms(2026, 3, 7, 2, 30, 0).unwrap();
    /// assert_eq!(
    ///     DayBoundary::NIGHTLIFE.day_of(late, &Utc),
    ///     NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()
    /// );
    /// assert_eq!(
    ///     DayBoundary::MIDNIGHT.day_of(late, &Utc),
    ///     NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    /// );
    /// ```
    #[must_use]
    pub fn day_of<Tz: TimeZone>(self, instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
        (instant.with_timezone(tz).naive_local() - self.offset()).date()
    }

    /// Whether both instants fall in the same day for this boundary.
    #[must_use]
    pub fn same_day<Tz: TimeZone>(self, a: DateTime<Utc>, b: DateTime<Utc>, tz: &Tz) -> bool {
        self.day_of(a, tz) == self.day_of(b, tz)
    }

    /// The most recent boundary at or before `now`.
    ///
    /// For [`DayBoundary::NIGHTLIFE`] this is the chat retention cutoff:
    /// today's 5:00 AM, or yesterday's when called before 5:00 AM.
    #[must_use]
    pub fn period_start<Tz: TimeZone>(self, now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
        let local = self.day_of(now, tz).and_time(NaiveTime::MIN) + self.offset();
        tz.from_local_datetime(&local)
            .earliest()
            .map_or_else(|| local.and_utc(), |t| t.with_timezone(&Utc))
    }
}

/// Guard for actions that may fire at most once per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OncePerDay {
    boundary: DayBoundary,
}

impl OncePerDay {
    #[must_use]
    pub const fn new(boundary: DayBoundary) -> Self {
        Self { boundary }
    }

    #[must_use]
    pub const fn boundary(self) -> DayBoundary {
        self.boundary
    }

    /// An action last taken at `last` may fire again at `now` when it has
    /// never fired or fired on a different day.
    #[must_use]
    pub fn permits<Tz: TimeZone>(
        self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> bool {
        last.is_none_or(|last| !self.boundary.same_day(last, now, tz))
    }

    /// Check the gate and, when it is open, record `now` as the last action.
    pub fn try_pass<Tz: TimeZone>(
        self,
        last: &mut Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> bool {
        let open = self.permits(*last, now, tz);
        if open {
            *last = Some(now);
        }
        open
    }
}

/// Chat sessions with no messages older than this are swept by the server.
#[must_use]
pub fn session_sweep_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - TimeDelta::days(7)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_same_calendar_day_is_gated() {
        let gate = OncePerDay::new(DayBoundary::MIDNIGHT);
        for (a, b) in [(at(17, 0, 0), at(17, 23, 59)), (at(17, 9, 0), at(17, 9, 0))] {
            assert!(!gate.permits(Some(a), b, &Utc));
        }
    }

    #[test]
    fn test_yesterday_opens_gate_and_records_now() {
        let gate = OncePerDay::new(DayBoundary::MIDNIGHT);
        let mut last = Some(at(16, 23, 59));
        let now = at(17, 0, 1);
        assert!(gate.try_pass(&mut last, now, &Utc));
        assert_eq!(last, Some(now));
        assert!(!gate.try_pass(&mut last, at(17, 12, 0), &Utc));
        assert_eq!(last, Some(now));
    }

    #[test]
    fn test_never_acted_is_permitted() {
        assert!(OncePerDay::new(DayBoundary::NIGHTLIFE).permits(None, at(17, 3, 0), &Utc));
    }

    #[test]
    fn test_midnight_and_nightlife_disagree_after_midnight() {
        let before = at(16, 23, 0);
        let after = at(17, 2, 0);
        assert!(!DayBoundary::MIDNIGHT.same_day(before, after, &Utc));
        assert!(DayBoundary::NIGHTLIFE.same_day(before, after, &Utc));
        assert!(!DayBoundary::NIGHTLIFE.same_day(after, at(17, 5, 0), &Utc));
    }

    #[test]
    fn test_like_reset_one_minute_early() {
        let late = at(17, 4, 58);
        let reset = at(17, 4, 59);
        assert!(!DayBoundary::LIKE_RESET.same_day(late, reset, &Utc));
        assert!(DayBoundary::NIGHTLIFE.same_day(late, reset, &Utc));
    }

    #[test]
    fn test_uses_local_timezone() {
        // 03:00 UTC is 23:00 the previous evening at UTC-4.
        let eastern = FixedOffset::west_opt(4 * 3600).unwrap();
        let instant = at(17, 3, 0);
        assert_eq!(
            DayBoundary::MIDNIGHT.day_of(instant, &eastern),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
        );
        assert!(DayBoundary::MIDNIGHT.same_day(at(16, 20, 0), instant, &eastern));
    }

    #[test]
    fn test_period_start() {
        assert_eq!(
            DayBoundary::NIGHTLIFE.period_start(at(17, 3, 0), &Utc),
            at(16, 5, 0)
        );
        assert_eq!(
            DayBoundary::NIGHTLIFE.period_start(at(17, 5, 0), &Utc),
            at(17, 5, 0)
        );
        assert_eq!(
            DayBoundary::MIDNIGHT.period_start(at(17, 13, 45), &Utc),
            at(17, 0, 0)
        );
    }

    #[test]
    fn test_new_validates() {
        assert!(DayBoundary::new(24, 0).is_none());
        assert!(DayBoundary::new(5, 60).is_none());
        assert_eq!(DayBoundary::new(5, 0), Some(DayBoundary::NIGHTLIFE));
    }

    #[test]
    fn test_session_sweep_cutoff() {
        assert_eq!(session_sweep_cutoff(at(17, 12, 0)), at(10, 12, 0));
    }
}
