//! Check-in entry point shared by the front-desk and self-service paths.

use crate::badges::{self, BadgeContext};
use crate::calendar::civil_date;
use crate::errors::{BadgeEvaluationError, StoreError};
use crate::models::{AttendanceRecord, Badge, MemberStats};
use crate::signals::{LeaderboardSource, ReferralSource};
use crate::storage::Store;
use crate::streak::current_streak;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// Record stored; badge evaluation runs in the background.
    Success(AttendanceRecord),
    AlreadyCheckedIn { date: NaiveDate },
    Rejected { reason: String },
    /// Storage failed; the caller may retry.
    Failure { message: String },
}

#[derive(Clone)]
pub struct CheckInService {
    store: Store,
    referrals: Arc<dyn ReferralSource>,
    leaderboard: Arc<dyn LeaderboardSource>,
}

impl CheckInService {
    /// Service whose referral and leaderboard signals come from `store` itself.
    pub fn new(store: Store) -> Self {
        let referrals: Arc<dyn ReferralSource> = Arc::new(store.clone());
        let leaderboard: Arc<dyn LeaderboardSource> = Arc::new(store.clone());
        Self::with_sources(store, referrals, leaderboard)
    }

    pub fn with_sources(
        store: Store,
        referrals: Arc<dyn ReferralSource>,
        leaderboard: Arc<dyn LeaderboardSource>,
    ) -> Self {
        Self {
            store,
            referrals,
            leaderboard,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub async fn check_in(&self, member_id: &str, gym_id: &str) -> CheckInOutcome {
        self.check_in_at(member_id, gym_id, Utc::now()).await
    }

    pub async fn check_in_at(&self, member_id: &str, gym_id: &str, instant: DateTime<Utc>) -> CheckInOutcome {
        match self.store.get_member(member_id).await {
            Some(member) if member.gym_id == gym_id => {}
            Some(_) => {
                warn!(member_id, gym_id, "check-in rejected: member belongs to another gym");
                return CheckInOutcome::Rejected {
                    reason: format!("member {member_id} is not a member of gym {gym_id}"),
                };
            }
            None => {
                warn!(member_id, gym_id, "check-in rejected: unknown member");
                return CheckInOutcome::Rejected {
                    reason: format!("member {member_id} not found"),
                };
            }
        }

        let record = match self.store.record_check_in(member_id, gym_id, instant).await {
            Ok(record) => record,
            Err(StoreError::Duplicate { date, .. }) => {
                debug!(member_id, gym_id, %date, "already checked in today");
                return CheckInOutcome::AlreadyCheckedIn { date };
            }
            Err(err) => {
                error!(member_id, gym_id, "check-in failed: {err}");
                return CheckInOutcome::Failure {
                    message: err.to_string(),
                };
            }
        };
        info!(member_id, gym_id, date = %record.check_in_date, "checked in");

        let service = self.clone();
        let member_id = member_id.to_string();
        let gym_id = gym_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = service.evaluate_badges(&member_id, &gym_id, instant).await {
                warn!(member_id = %member_id, gym_id = %gym_id, "badge evaluation failed: {err}");
            }
        });

        CheckInOutcome::Success(record)
    }

    /// Evaluates every rule against the member's current history and stores
    /// newly earned badges. Safe to call repeatedly; also used for backfill.
    pub async fn evaluate_badges(
        &self,
        member_id: &str,
        gym_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Badge>, BadgeEvaluationError> {
        let member = self
            .store
            .get_member(member_id)
            .await
            .ok_or_else(|| StoreError::MemberNotFound(member_id.to_string()))?;
        let today = civil_date(now);

        let history = self.store.list_for_member(member_id, gym_id).await;
        let referrals = self.referrals.successful_referrals(&member).await?;
        let rank = self.leaderboard.monthly_rank(&member, today).await?;

        let ctx = BadgeContext::new(&history, today, referrals, rank);
        let candidates: Vec<_> = badges::evaluate(&member, &ctx, now)
            .into_iter()
            .map(|badge| badge.badge_type)
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.store.award_badges(member_id, &candidates, now).await?)
    }

    pub async fn member_stats(&self, member_id: &str, today: NaiveDate) -> Result<MemberStats, StoreError> {
        let member = self
            .store
            .get_member(member_id)
            .await
            .ok_or_else(|| StoreError::MemberNotFound(member_id.to_string()))?;

        let history = self.store.list_for_member(&member.id, &member.gym_id).await;
        let dates: Vec<NaiveDate> = history.iter().map(|record| record.check_in_date).collect();

        Ok(MemberStats {
            current_streak: current_streak(&dates, today),
            total_check_ins: history.len(),
            member_id: member.id,
            gym_id: member.gym_id,
            badges: member.badges,
        })
    }
}
