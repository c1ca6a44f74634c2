use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BadgeType {
    #[serde(rename = "first_week")]
    FirstWeek,
    #[serde(rename = "30_day_streak")]
    ThirtyDayStreak,
    #[serde(rename = "100_day_club")]
    HundredDayClub,
    #[serde(rename = "never_missed_monday")]
    NeverMissedMonday,
    #[serde(rename = "referral_1")]
    Referral1,
    #[serde(rename = "referral_3")]
    Referral3,
    #[serde(rename = "top_10")]
    Top10,
}

impl BadgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstWeek => "first_week",
            Self::ThirtyDayStreak => "30_day_streak",
            Self::HundredDayClub => "100_day_club",
            Self::NeverMissedMonday => "never_missed_monday",
            Self::Referral1 => "referral_1",
            Self::Referral3 => "referral_3",
            Self::Top10 => "top_10",
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    #[serde(rename = "type")]
    pub badge_type: BadgeType,
    pub earned_at: DateTime<Utc>,
}

/// One gym membership. A person in several gyms has one `Member` per gym
/// sharing the same `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub gym_id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub joined_on: NaiveDate,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl Member {
    pub fn has_badge(&self, badge_type: BadgeType) -> bool {
        self.badges.iter().any(|badge| badge.badge_type == badge_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub member_id: String,
    pub gym_id: String,
    pub check_in_date: NaiveDate,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewMemberRequest {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FrontDeskCheckInRequest {
    pub member_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanCheckInRequest {
    pub gym_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub status: String,
    pub date: Option<NaiveDate>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberStats {
    pub member_id: String,
    pub gym_id: String,
    pub current_streak: u32,
    pub total_check_ins: usize,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GymAttendanceResponse {
    pub gym_id: String,
    pub date: NaiveDate,
    pub records: Vec<AttendanceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_type_serializes_to_rule_name() {
        let json = serde_json::to_string(&BadgeType::ThirtyDayStreak).unwrap();
        assert_eq!(json, "\"30_day_streak\"");
        let parsed: BadgeType = serde_json::from_str("\"never_missed_monday\"").unwrap();
        assert_eq!(parsed, BadgeType::NeverMissedMonday);
    }

    #[test]
    fn display_matches_serialized_name() {
        assert_eq!(BadgeType::Top10.to_string(), "top_10");
        assert_eq!(BadgeType::HundredDayClub.to_string(), "100_day_club");
    }
}
