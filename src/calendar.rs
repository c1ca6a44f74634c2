//! Civil calendar helpers.
//!
//! Every "today" in the system is computed in one fixed offset (IST, UTC+05:30)
//! so the same instant maps to the same date regardless of the host timezone.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

/// Offset of Indian Standard Time from UTC, in seconds.
pub const CIVIL_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

pub const CIVIL_OFFSET: FixedOffset = match FixedOffset::east_opt(CIVIL_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("civil offset out of range"),
};

/// Wall-clock time of `instant` in the civil timezone.
pub fn civil_datetime(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&CIVIL_OFFSET)
}

/// Calendar date of `instant` in the civil timezone.
pub fn civil_date(instant: DateTime<Utc>) -> NaiveDate {
    civil_datetime(instant).date_naive()
}

pub fn today() -> NaiveDate {
    civil_date(Utc::now())
}

/// The `count` most recent Mondays, newest first, including `today` when it is a Monday.
pub fn most_recent_mondays(today: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let latest = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (0..count)
        .map(|weeks_back| latest - Duration::weeks(weeks_back as i64))
        .collect()
}
