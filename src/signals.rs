//! Read-only inputs to the badge rules that come from outside the attendance ledger.

use crate::errors::SignalError;
use crate::models::Member;
use crate::storage::Store;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

#[async_trait]
pub trait ReferralSource: Send + Sync {
    async fn successful_referrals(&self, member: &Member) -> Result<u32, SignalError>;
}

#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    /// 1-based rank of the member on their gym's leaderboard for the month of
    /// `today`, or `None` when they have no check-ins that month.
    async fn monthly_rank(&self, member: &Member, today: NaiveDate) -> Result<Option<u32>, SignalError>;
}

#[async_trait]
impl ReferralSource for Store {
    async fn successful_referrals(&self, member: &Member) -> Result<u32, SignalError> {
        Ok(self.referral_count(&member.id).await)
    }
}

#[async_trait]
impl LeaderboardSource for Store {
    async fn monthly_rank(&self, member: &Member, today: NaiveDate) -> Result<Option<u32>, SignalError> {
        let counts = self.monthly_counts(&member.gym_id, today).await;
        Ok(competition_rank(&counts, &member.id))
    }
}

/// Standard competition ranking: one more than the number of members with
/// strictly more check-ins.
pub fn competition_rank(counts: &HashMap<String, usize>, member_id: &str) -> Option<u32> {
    let own = counts.get(member_id).copied().filter(|count| *count > 0)?;
    let ahead = counts.values().filter(|count| **count > own).count();
    u32::try_from(ahead).ok().map(|ahead| ahead + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, usize)]) -> HashMap<String, usize> {
        entries.iter().map(|(id, n)| (id.to_string(), *n)).collect()
    }

    #[test]
    fn ties_share_a_rank() {
        let board = counts(&[("a", 10), ("b", 8), ("c", 8), ("d", 3)]);
        assert_eq!(competition_rank(&board, "a"), Some(1));
        assert_eq!(competition_rank(&board, "b"), Some(2));
        assert_eq!(competition_rank(&board, "c"), Some(2));
        assert_eq!(competition_rank(&board, "d"), Some(4));
    }

    #[test]
    fn absent_or_zero_is_unranked() {
        let board = counts(&[("a", 4), ("z", 0)]);
        assert_eq!(competition_rank(&board, "missing"), None);
        assert_eq!(competition_rank(&board, "z"), None);
    }
}
