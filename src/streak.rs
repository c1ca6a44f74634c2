use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// Consecutive attended days ending today, or ending yesterday when the member
/// has not checked in yet today.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let present: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    current_streak_in(&present, today)
}

pub fn current_streak_in(present: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if present.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0u32;
    while present.contains(&cursor) {
        streak = streak.saturating_add(1);
        cursor -= Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn counts_back_from_today() {
        let today = date(2024, 1, 10);
        let dates = [today - Duration::days(2), today - Duration::days(1), today];
        assert_eq!(current_streak(&dates, today), 3);
        assert_eq!(current_streak(&dates, today), 3);
    }

    #[test]
    fn yesterday_keeps_streak_alive() {
        let today = date(2024, 1, 10);
        assert_eq!(current_streak(&[today - Duration::days(1)], today), 1);
    }

    #[test]
    fn two_day_gap_breaks_streak() {
        let today = date(2024, 1, 10);
        assert_eq!(current_streak(&[today - Duration::days(2)], today), 0);
        assert_eq!(current_streak(&[], today), 0);
    }

    #[test]
    fn stops_at_first_gap() {
        let today = date(2024, 3, 1);
        let dates = [
            date(2024, 2, 25),
            date(2024, 2, 26),
            date(2024, 2, 28),
            date(2024, 2, 29),
            date(2024, 3, 1),
        ];
        assert_eq!(current_streak(&dates, today), 3);
    }

    #[test]
    fn future_dates_are_ignored() {
        let today = date(2024, 1, 10);
        let dates = [today, today + Duration::days(1)];
        assert_eq!(current_streak(&dates, today), 1);
    }

    #[test]
    fn duplicate_and_unsorted_input() {
        let today = date(2024, 1, 10);
        let dates = [today, today - Duration::days(1), today, today - Duration::days(1)];
        assert_eq!(current_streak(&dates, today), 2);
    }
}
