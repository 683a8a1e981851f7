//! Time and timestamp helpers.

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};

/// UTC timestamp used for subscription dates, due dates, audit times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Add whole calendar months to a timestamp.
///
/// Package durations are expressed in months; extension arithmetic must
/// follow the calendar (Jan 31 + 1 month = Feb 28/29), not fixed 30-day
/// increments.
#[must_use]
pub fn add_months(ts: Timestamp, months: u32) -> Timestamp {
    ts.checked_add_months(Months::new(months)).unwrap_or(ts)
}

/// Add whole days to a timestamp.
#[must_use]
pub fn add_days(ts: Timestamp, days: i64) -> Timestamp {
    ts + Duration::days(days)
}

/// The first instant of the calendar day containing `ts` (UTC).
#[must_use]
pub fn start_of_day(ts: Timestamp) -> Timestamp {
    Utc.with_ymd_and_hms(ts.year(), ts.month(), ts.day(), 0, 0, 0)
        .single()
        .unwrap_or(ts)
}

/// The last instant of the calendar day containing `ts` (UTC).
#[must_use]
pub fn end_of_day(ts: Timestamp) -> Timestamp {
    start_of_day(ts) + Duration::days(1) - Duration::nanoseconds(1)
}
