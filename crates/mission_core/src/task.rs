use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DAILY_FREQUENCY: u8 = 7;
/// Longest single time log accepted: one full week.
pub const MAX_LOG_MINUTES: u32 = 7 * 24 * 60;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("frequency goal must be between 1 and 7, got {0}")]
    FrequencyOutOfRange(u8),
    #[error("a task needs either a frequency goal or a weekly time goal")]
    NoCadence,
    #[error("{0}")]
    Invalid(String),
}

/// A recurring mission as stored. `time_goal_minutes > 0` makes it a time-bucket task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub frequency_goal: u8,
    #[serde(default)]
    pub time_goal_minutes: u32,
    #[serde(default)]
    pub last_completed_at: Option<NaiveDate>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub linked_skill_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Occurrences per week; 7 means daily.
    Frequency(u8),
    /// Weekly minute budget.
    Minutes(u32),
}

impl Cadence {
    pub fn is_daily(&self) -> bool {
        matches!(self, Cadence::Frequency(n) if *n >= DAILY_FREQUENCY)
    }

    pub fn weekly_goal(&self) -> u32 {
        match self {
            Cadence::Frequency(n) => u32::from(*n),
            Cadence::Minutes(minutes) => *minutes,
        }
    }
}

impl Task {
    pub fn cadence(&self) -> Cadence {
        if self.time_goal_minutes > 0 {
            Cadence::Minutes(self.time_goal_minutes)
        } else {
            Cadence::Frequency(self.frequency_goal)
        }
    }

    pub fn is_time_bucket(&self) -> bool {
        self.time_goal_minutes > 0
    }

    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.last_completed_at == Some(day)
    }
}

/// User input for a new task, validated before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub category: String,
    pub cadence: NewCadence,
    pub linked_skill_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NewCadence {
    TimesPerWeek(u8),
    MinutesPerWeek(u32),
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Missing("title"));
        }
        match self.cadence {
            NewCadence::TimesPerWeek(n) if n == 0 || n > DAILY_FREQUENCY => {
                Err(ValidationError::FrequencyOutOfRange(n))
            }
            NewCadence::MinutesPerWeek(0) => Err(ValidationError::NoCadence),
            _ => Ok(()),
        }
    }

    /// Builds the stored shape. The id is assigned by the store.
    pub fn into_task(self) -> Task {
        let (frequency_goal, time_goal_minutes) = match self.cadence {
            NewCadence::TimesPerWeek(n) => (n, 0),
            NewCadence::MinutesPerWeek(minutes) => (0, minutes),
        };
        Task {
            id: 0,
            title: self.title.trim().to_string(),
            category: self.category.trim().to_string(),
            frequency_goal,
            time_goal_minutes,
            last_completed_at: None,
            current_streak: 0,
            linked_skill_id: self.linked_skill_id,
        }
    }
}

/// One completion or time-log event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionLog {
    pub id: i64,
    pub task_id: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub xp_awarded: u64,
    /// Streak of the task before the day's first action. Undo restores it.
    #[serde(default)]
    pub previous_streak: Option<u32>,
    /// Completion date before the day's first action; only meaningful when
    /// `previous_streak` is set.
    #[serde(default)]
    pub previous_completed_at: Option<NaiveDate>,
}

impl CompletionLog {
    /// A log row that remembers the task state it replaced.
    pub fn recorded(task: &Task, date: NaiveDate, minutes: u32, xp_awarded: u64) -> Self {
        Self {
            id: 0,
            task_id: task.id,
            date,
            minutes,
            xp_awarded,
            previous_streak: Some(task.current_streak),
            previous_completed_at: task.last_completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(title: &str, cadence: NewCadence) -> NewTask {
        NewTask {
            title: title.to_string(),
            category: "Health".to_string(),
            cadence,
            linked_skill_id: None,
        }
    }

    #[test]
    fn time_goal_overrides_frequency() {
        let task = Task {
            id: 1,
            title: "Piano".into(),
            category: String::new(),
            frequency_goal: 7,
            time_goal_minutes: 120,
            last_completed_at: None,
            current_streak: 0,
            linked_skill_id: None,
        };
        assert_eq!(task.cadence(), Cadence::Minutes(120));
        assert!(!task.cadence().is_daily());
        assert_eq!(task.cadence().weekly_goal(), 120);
    }

    #[test]
    fn validation_rejects_blank_titles_and_bad_cadence() {
        assert_eq!(
            new_task("   ", NewCadence::TimesPerWeek(3)).validate(),
            Err(ValidationError::Missing("title"))
        );
        assert_eq!(
            new_task("Run", NewCadence::TimesPerWeek(0)).validate(),
            Err(ValidationError::FrequencyOutOfRange(0))
        );
        assert_eq!(
            new_task("Run", NewCadence::TimesPerWeek(8)).validate(),
            Err(ValidationError::FrequencyOutOfRange(8))
        );
        assert_eq!(
            new_task("Read", NewCadence::MinutesPerWeek(0)).validate(),
            Err(ValidationError::NoCadence)
        );
        assert!(new_task("Read", NewCadence::MinutesPerWeek(90)).validate().is_ok());
    }

    #[test]
    fn recorded_log_snapshots_task_state() {
        let mut task = new_task("Run", NewCadence::TimesPerWeek(7)).into_task();
        task.id = 4;
        task.current_streak = 5;
        task.last_completed_at = NaiveDate::from_ymd_opt(2026, 10, 10);
        let day = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

        let log = CompletionLog::recorded(&task, day, 0, 20);
        assert_eq!(log.task_id, 4);
        assert_eq!(log.previous_streak, Some(5));
        assert_eq!(log.previous_completed_at, task.last_completed_at);
    }

    #[test]
    fn legacy_log_rows_have_no_snapshot() {
        let log: CompletionLog =
            serde_json::from_str(r#"{"id": 1, "task_id": 2, "date": "2026-10-15"}"#).unwrap();
        assert_eq!(log.previous_streak, None);
        assert_eq!(log.minutes, 0);
    }

    #[test]
    fn into_task_keeps_cadences_exclusive() {
        let task = new_task(" Read ", NewCadence::MinutesPerWeek(90)).into_task();
        assert_eq!(task.title, "Read");
        assert_eq!(task.frequency_goal, 0);
        assert_eq!(task.time_goal_minutes, 90);
        assert_eq!(task.current_streak, 0);
    }
}
