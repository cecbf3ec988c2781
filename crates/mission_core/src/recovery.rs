//! Muscle fatigue classification and the sleep target derived from it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::hours_between;
use crate::config::EngineConfig;

pub const MUSCLE_GROUPS: [&str; 13] = [
    "traps",
    "chest",
    "abs",
    "obliques",
    "forearms",
    "biceps",
    "quads",
    "back",
    "shoulders",
    "glutes",
    "hamstrings",
    "triceps",
    "calves_back",
];

const PEAK_FATIGUE_HOURS: i64 = 24;
const RECOVERING_HOURS: i64 = 48;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MuscleFatigueRecord {
    pub id: i64,
    pub muscle_group: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SleepLog {
    pub id: i64,
    pub date: NaiveDate,
    pub hours_slept: f64,
}

/// Green is peak fatigue (trained within a day), red is fully recovered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FatigueTier {
    Green,
    Yellow,
    Red,
}

pub fn is_known_group(group: &str) -> bool {
    MUSCLE_GROUPS.contains(&group)
}

pub fn classify_muscle(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> FatigueTier {
    let Some(updated_at) = updated_at else {
        return FatigueTier::Red;
    };
    match hours_between(updated_at, now) {
        h if h < PEAK_FATIGUE_HOURS => FatigueTier::Green,
        h if h < RECOVERING_HOURS => FatigueTier::Yellow,
        _ => FatigueTier::Red,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuscleToggle {
    /// Undo today's session: drop the record.
    Clear,
    /// Log a new session at the given instant.
    Mark(DateTime<Utc>),
}

pub fn toggle_muscle(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> MuscleToggle {
    match classify_muscle(updated_at, now) {
        FatigueTier::Green => MuscleToggle::Clear,
        FatigueTier::Yellow | FatigueTier::Red => MuscleToggle::Mark(now),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RecoveryTarget {
    pub strain_score: u32,
    pub target_sleep_hours: f64,
}

pub fn compute_recovery_target(
    records: &[MuscleFatigueRecord],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> RecoveryTarget {
    let strain_score = records
        .iter()
        .filter(|record| classify_muscle(Some(record.updated_at), now) == FatigueTier::Green)
        .count() as u32;
    RecoveryTarget {
        strain_score,
        target_sleep_hours: config.base_sleep_hours
            + config.sleep_per_strained_group * f64::from(strain_score),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SleepStatus {
    Recovered,
    Deficit { hours_short: f64 },
    /// Nothing logged yet; neutral rather than a failure.
    Pending,
}

pub fn sleep_status(logged_hours: Option<f64>, target_hours: f64) -> SleepStatus {
    match logged_hours {
        None => SleepStatus::Pending,
        Some(hours) if hours >= target_hours => SleepStatus::Recovered,
        Some(hours) => SleepStatus::Deficit {
            hours_short: target_hours - hours,
        },
    }
}

/// Fill of the sleep ring, 0 to 100.
pub fn sleep_fill_percent(logged_hours: Option<f64>, target_hours: f64) -> f64 {
    if target_hours <= 0.0 {
        return 100.0;
    }
    (logged_hours.unwrap_or(0.0) / target_hours * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecoveryBoard {
    pub fatigued: Vec<String>,
    pub recovering: Vec<String>,
    pub ready: Vec<String>,
}

/// Partitions the known groups by tier. Groups without a record are ready.
pub fn recovery_board(records: &[MuscleFatigueRecord], now: DateTime<Utc>) -> RecoveryBoard {
    let mut board = RecoveryBoard::default();
    for group in MUSCLE_GROUPS {
        let updated_at = records
            .iter()
            .find(|record| record.muscle_group == group)
            .map(|record| record.updated_at);
        let bucket = match classify_muscle(updated_at, now) {
            FatigueTier::Green => &mut board.fatigued,
            FatigueTier::Yellow => &mut board.recovering,
            FatigueTier::Red => &mut board.ready,
        };
        bucket.push(group.to_string());
    }
    board
}
