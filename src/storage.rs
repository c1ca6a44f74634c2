//! Attendance ledger and member registry.
//!
//! All state lives in memory behind one async mutex. When the store has a data
//! path, every mutation rewrites the JSON snapshot before the lock is released;
//! a failed write rolls the in-memory change back. The snapshot is written to a
//! sibling temp file and renamed over the data file, so a crash never leaves a
//! half-written ledger behind.

use crate::calendar::civil_date;
use crate::errors::StoreError;
use crate::models::{AttendanceRecord, Badge, BadgeType, Member};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::{env, path::Path, path::PathBuf, sync::Arc};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

type LedgerKey = (String, String, NaiveDate);

#[derive(Debug, Default)]
struct StoreData {
    members: BTreeMap<String, Member>,
    attendance: BTreeMap<LedgerKey, AttendanceRecord>,
    referrals: BTreeMap<String, u32>,
}

/// On-disk layout of the data file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    referrals: BTreeMap<String, u32>,
}

impl StoreData {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let members = snapshot
            .members
            .into_iter()
            .map(|member| (member.id.clone(), member))
            .collect();
        let attendance = snapshot
            .attendance
            .into_iter()
            .map(|record| (ledger_key(&record.member_id, &record.gym_id, record.check_in_date), record))
            .collect();
        Self {
            members,
            attendance,
            referrals: snapshot.referrals,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            members: self.members.values().cloned().collect(),
            attendance: self.attendance.values().cloned().collect(),
            referrals: self.referrals.clone(),
        }
    }
}

fn ledger_key(member_id: &str, gym_id: &str, date: NaiveDate) -> LedgerKey {
    (member_id.to_string(), gym_id.to_string(), date)
}

#[derive(Clone)]
pub struct Store {
    data_path: Option<PathBuf>,
    data: Arc<Mutex<StoreData>>,
}

impl Store {
    /// Store without a backing file, used by tests and embedders that persist elsewhere.
    pub fn in_memory() -> Self {
        Self {
            data_path: None,
            data: Arc::new(Mutex::new(StoreData::default())),
        }
    }

    /// Loads the data file at `path`. A missing file starts an empty store; an
    /// unreadable or corrupt one is an error so it is never overwritten.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let data = load_data(&path).await?;
        Ok(Self {
            data_path: Some(path),
            data: Arc::new(Mutex::new(data)),
        })
    }

    pub async fn add_member(
        &self,
        gym_id: &str,
        name: &str,
        phone: &str,
        user_id: Option<String>,
        joined_on: NaiveDate,
    ) -> Result<Member, StoreError> {
        let member = Member {
            id: Uuid::new_v4().to_string(),
            gym_id: gym_id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            user_id,
            joined_on,
            badges: Vec::new(),
        };

        let mut data = self.data.lock().await;
        data.members.insert(member.id.clone(), member.clone());
        if let Err(err) = self.persist(&data).await {
            data.members.remove(&member.id);
            return Err(err);
        }
        Ok(member)
    }

    pub async fn get_member(&self, member_id: &str) -> Option<Member> {
        self.data.lock().await.members.get(member_id).cloned()
    }

    pub async fn list_members(&self, gym_id: &str) -> Vec<Member> {
        self.data
            .lock()
            .await
            .members
            .values()
            .filter(|member| member.gym_id == gym_id)
            .cloned()
            .collect()
    }

    /// Inserts the check-in for the civil date of `instant`.
    ///
    /// The existence check and the insert happen under one lock acquisition, so
    /// concurrent attempts for the same (member, gym, date) yield exactly one record.
    pub async fn record_check_in(
        &self,
        member_id: &str,
        gym_id: &str,
        instant: DateTime<Utc>,
    ) -> Result<AttendanceRecord, StoreError> {
        let date = civil_date(instant);
        let key = ledger_key(member_id, gym_id, date);

        let mut data = self.data.lock().await;
        if data.attendance.contains_key(&key) {
            return Err(StoreError::Duplicate {
                member_id: member_id.to_string(),
                gym_id: gym_id.to_string(),
                date,
            });
        }

        let record = AttendanceRecord {
            member_id: member_id.to_string(),
            gym_id: gym_id.to_string(),
            check_in_date: date,
            checked_in_at: instant,
        };
        data.attendance.insert(key.clone(), record.clone());
        if let Err(err) = self.persist(&data).await {
            data.attendance.remove(&key);
            return Err(err);
        }

        Ok(record)
    }

    /// Attendance of one member at one gym, oldest first.
    pub async fn list_for_member(&self, member_id: &str, gym_id: &str) -> Vec<AttendanceRecord> {
        let start = ledger_key(member_id, gym_id, NaiveDate::MIN);
        let end = ledger_key(member_id, gym_id, NaiveDate::MAX);
        let data = self.data.lock().await;
        data.attendance.range(start..=end).map(|(_, record)| record.clone()).collect()
    }

    pub async fn list_for_gym(&self, gym_id: &str, date: NaiveDate) -> Vec<AttendanceRecord> {
        let data = self.data.lock().await;
        let mut records: Vec<AttendanceRecord> = data
            .attendance
            .values()
            .filter(|record| record.gym_id == gym_id && record.check_in_date == date)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.checked_in_at);
        records
    }

    /// Appends the badges the member does not hold yet and returns them.
    ///
    /// Earned types are re-read under the lock, so two racing evaluations never
    /// award the same type twice.
    pub async fn award_badges(
        &self,
        member_id: &str,
        candidates: &[BadgeType],
        earned_at: DateTime<Utc>,
    ) -> Result<Vec<Badge>, StoreError> {
        let mut data = self.data.lock().await;
        let member = data
            .members
            .get_mut(member_id)
            .ok_or_else(|| StoreError::MemberNotFound(member_id.to_string()))?;

        let mut awarded = Vec::new();
        for &badge_type in candidates {
            if member.has_badge(badge_type) || awarded.iter().any(|b: &Badge| b.badge_type == badge_type) {
                continue;
            }
            awarded.push(Badge {
                badge_type,
                earned_at,
            });
        }

        if awarded.is_empty() {
            return Ok(awarded);
        }

        let previous_len = member.badges.len();
        member.badges.extend(awarded.iter().cloned());
        if let Err(err) = self.persist(&data).await {
            if let Some(member) = data.members.get_mut(member_id) {
                member.badges.truncate(previous_len);
            }
            return Err(err);
        }

        for badge in &awarded {
            info!(member_id, badge = %badge.badge_type, "badge awarded");
        }
        Ok(awarded)
    }

    pub async fn record_referral(&self, member_id: &str) -> Result<u32, StoreError> {
        let mut data = self.data.lock().await;
        if !data.members.contains_key(member_id) {
            return Err(StoreError::MemberNotFound(member_id.to_string()));
        }

        let previous = data.referrals.get(member_id).copied();
        let count = previous.unwrap_or(0).saturating_add(1);
        data.referrals.insert(member_id.to_string(), count);
        if let Err(err) = self.persist(&data).await {
            match previous {
                Some(value) => data.referrals.insert(member_id.to_string(), value),
                None => data.referrals.remove(member_id),
            };
            return Err(err);
        }
        Ok(count)
    }

    pub async fn referral_count(&self, member_id: &str) -> u32 {
        self.data
            .lock()
            .await
            .referrals
            .get(member_id)
            .copied()
            .unwrap_or(0)
    }

    /// Check-in counts per member of `gym_id` within the civil month containing `day`.
    pub async fn monthly_counts(&self, gym_id: &str, day: NaiveDate) -> HashMap<String, usize> {
        let data = self.data.lock().await;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in data.attendance.values() {
            let date = record.check_in_date;
            if record.gym_id == gym_id && date.year() == day.year() && date.month() == day.month() {
                *counts.entry(record.member_id.clone()).or_default() += 1;
            }
        }
        counts
    }

    async fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        match &self.data_path {
            Some(path) => persist_data(path, data).await,
            None => Ok(()),
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    env::var("APP_DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/state.json"))
}

async fn load_data(path: &Path) -> Result<StoreData, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => Ok(StoreData::from_snapshot(snapshot)),
            Err(err) => {
                error!("failed to parse data file {}: {err}", path.display());
                Err(StoreError::Corrupt {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoreData::default()),
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            Err(StoreError::Io(err))
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

async fn persist_data(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(&data.to_snapshot())?;
    let tmp = temp_path(path);
    fs::write(&tmp, payload).await?;
    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}
