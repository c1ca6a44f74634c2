//! Badge rules and their evaluation over a member's attendance history.

use crate::calendar::most_recent_mondays;
use crate::models::{AttendanceRecord, Badge, BadgeType, Member};
use crate::streak::current_streak_in;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use tracing::debug;

const FIRST_WEEK_CHECK_INS: usize = 7;
const THIRTY_DAY_STREAK: u32 = 30;
const HUNDRED_DAY_STREAK: u32 = 100;
const MONDAY_WINDOW: usize = 4;
const LEADERBOARD_CUTOFF: u32 = 10;

/// Everything a rule may look at, captured once per evaluation.
#[derive(Debug, Clone)]
pub struct BadgeContext {
    pub present: BTreeSet<NaiveDate>,
    pub total_check_ins: usize,
    pub today: NaiveDate,
    pub referrals: u32,
    pub leaderboard_rank: Option<u32>,
}

impl BadgeContext {
    pub fn new(
        history: &[AttendanceRecord],
        today: NaiveDate,
        referrals: u32,
        leaderboard_rank: Option<u32>,
    ) -> Self {
        Self {
            present: history.iter().map(|record| record.check_in_date).collect(),
            total_check_ins: history.len(),
            today,
            referrals,
            leaderboard_rank,
        }
    }

    pub fn streak(&self) -> u32 {
        current_streak_in(&self.present, self.today)
    }
}

pub type Predicate = fn(&BadgeContext) -> bool;

pub const RULES: [(BadgeType, Predicate); 7] = [
    (BadgeType::FirstWeek, first_week),
    (BadgeType::ThirtyDayStreak, thirty_day_streak),
    (BadgeType::HundredDayClub, hundred_day_club),
    (BadgeType::NeverMissedMonday, never_missed_monday),
    (BadgeType::Referral1, referral_1),
    (BadgeType::Referral3, referral_3),
    (BadgeType::Top10, top_10),
];

fn first_week(ctx: &BadgeContext) -> bool {
    ctx.total_check_ins >= FIRST_WEEK_CHECK_INS
}

fn thirty_day_streak(ctx: &BadgeContext) -> bool {
    ctx.streak() >= THIRTY_DAY_STREAK
}

fn hundred_day_club(ctx: &BadgeContext) -> bool {
    ctx.streak() >= HUNDRED_DAY_STREAK
}

fn never_missed_monday(ctx: &BadgeContext) -> bool {
    most_recent_mondays(ctx.today, MONDAY_WINDOW)
        .iter()
        .all(|monday| ctx.present.contains(monday))
}

fn referral_1(ctx: &BadgeContext) -> bool {
    ctx.referrals >= 1
}

fn referral_3(ctx: &BadgeContext) -> bool {
    ctx.referrals >= 3
}

fn top_10(ctx: &BadgeContext) -> bool {
    ctx.leaderboard_rank.is_some_and(|rank| rank <= LEADERBOARD_CUTOFF)
}

/// Badges the member qualifies for but does not hold yet, all stamped `now`.
pub fn evaluate(member: &Member, ctx: &BadgeContext, now: DateTime<Utc>) -> Vec<Badge> {
    let earned: BTreeSet<BadgeType> = member.badges.iter().map(|badge| badge.badge_type).collect();

    RULES
        .iter()
        .filter(|(badge_type, _)| {
            let held = earned.contains(badge_type);
            if held {
                debug!(member_id = %member.id, badge = %badge_type, "already earned");
            }
            !held
        })
        .filter(|(_, predicate)| predicate(ctx))
        .map(|(badge_type, _)| Badge {
            badge_type: *badge_type,
            earned_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member() -> Member {
        Member {
            id: "m-1".into(),
            gym_id: "gym-1".into(),
            name: "Asha".into(),
            phone: String::new(),
            user_id: None,
            joined_on: date(2024, 1, 1),
            badges: Vec::new(),
        }
    }

    fn history(dates: &[NaiveDate]) -> Vec<AttendanceRecord> {
        dates
            .iter()
            .map(|day| AttendanceRecord {
                member_id: "m-1".into(),
                gym_id: "gym-1".into(),
                check_in_date: *day,
                checked_in_at: Utc.from_utc_datetime(&day.and_hms_opt(3, 0, 0).unwrap()),
            })
            .collect()
    }

    fn consecutive(end: NaiveDate, days: i64) -> Vec<NaiveDate> {
        (0..days).rev().map(|offset| end - Duration::days(offset)).collect()
    }

    fn types(badges: &[Badge]) -> Vec<BadgeType> {
        badges.iter().map(|badge| badge.badge_type).collect()
    }

    #[test]
    fn first_week_needs_seven_check_ins() {
        let today = date(2024, 1, 7);
        let six = BadgeContext::new(&history(&consecutive(date(2024, 1, 6), 6)), today, 0, None);
        assert!(!first_week(&six));

        let seven = BadgeContext::new(&history(&consecutive(today, 7)), today, 0, None);
        assert!(first_week(&seven));
    }

    #[test]
    fn first_week_counts_non_consecutive_days() {
        let dates = [1, 3, 5, 8, 11, 14, 20].map(|d| date(2024, 1, d));
        let ctx = BadgeContext::new(&history(&dates), date(2024, 1, 25), 0, None);
        assert!(first_week(&ctx));
        assert_eq!(ctx.streak(), 0);
    }

    #[test]
    fn streak_rules_use_current_streak() {
        let today = date(2024, 4, 30);
        let thirty = BadgeContext::new(&history(&consecutive(today, 30)), today, 0, None);
        assert!(thirty_day_streak(&thirty));
        assert!(!hundred_day_club(&thirty));

        let broken = BadgeContext::new(&history(&consecutive(today - Duration::days(2), 40)), today, 0, None);
        assert!(!thirty_day_streak(&broken));

        let hundred = BadgeContext::new(&history(&consecutive(today, 100)), today, 0, None);
        assert!(hundred_day_club(&hundred));
    }

    #[test]
    fn never_missed_monday_checks_last_four_mondays() {
        let mondays = [date(2024, 1, 8), date(2024, 1, 15), date(2024, 1, 22), date(2024, 1, 29)];

        let on_monday = BadgeContext::new(&history(&mondays), date(2024, 1, 29), 0, None);
        assert!(never_missed_monday(&on_monday));

        let on_thursday = BadgeContext::new(&history(&mondays), date(2024, 2, 1), 0, None);
        assert!(never_missed_monday(&on_thursday));

        let missing = BadgeContext::new(&history(&mondays[1..]), date(2024, 1, 29), 0, None);
        assert!(!never_missed_monday(&missing));
    }

    #[test]
    fn today_monday_without_check_in_fails_window() {
        let mondays = [date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15), date(2024, 1, 22)];
        let ctx = BadgeContext::new(&history(&mondays), date(2024, 1, 29), 0, None);
        assert!(!never_missed_monday(&ctx));
    }

    #[test]
    fn referral_and_leaderboard_thresholds() {
        let today = date(2024, 1, 10);
        assert!(!referral_1(&BadgeContext::new(&[], today, 0, None)));
        let two = BadgeContext::new(&[], today, 2, None);
        assert!(referral_1(&two));
        assert!(!referral_3(&two));
        assert!(referral_3(&BadgeContext::new(&[], today, 3, None)));

        assert!(top_10(&BadgeContext::new(&[], today, 0, Some(10))));
        assert!(!top_10(&BadgeContext::new(&[], today, 0, Some(11))));
        assert!(!top_10(&BadgeContext::new(&[], today, 0, None)));
    }

    #[test]
    fn backfill_awards_every_eligible_badge_at_once() {
        let today = date(2024, 4, 29);
        let ctx = BadgeContext::new(&history(&consecutive(today, 35)), today, 1, Some(1));
        let now = Utc.with_ymd_and_hms(2024, 4, 29, 4, 0, 0).unwrap();

        let awarded = evaluate(&member(), &ctx, now);
        assert_eq!(
            types(&awarded),
            vec![
                BadgeType::FirstWeek,
                BadgeType::ThirtyDayStreak,
                BadgeType::NeverMissedMonday,
                BadgeType::Referral1,
                BadgeType::Top10,
            ]
        );
        assert!(awarded.iter().all(|badge| badge.earned_at == now));
    }

    #[test]
    fn evaluate_skips_held_badges() {
        let today = date(2024, 1, 7);
        let ctx = BadgeContext::new(&history(&consecutive(today, 7)), today, 0, None);
        let now = Utc.with_ymd_and_hms(2024, 1, 7, 4, 0, 0).unwrap();

        let mut member = member();
        let first = evaluate(&member, &ctx, now);
        assert_eq!(types(&first), vec![BadgeType::FirstWeek]);

        member.badges.extend(first);
        assert!(evaluate(&member, &ctx, now).is_empty());
    }
}
