use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::Week;
use crate::task::{Cadence, CompletionLog, Task};

/// Progress of a task within one calendar week. Derived from logs on every read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeeklyProgress {
    pub value: u32,
    pub goal: u32,
    pub met: bool,
    pub ratio: f64,
}

impl WeeklyProgress {
    pub fn new(value: u32, goal: u32) -> Self {
        let ratio = if goal == 0 {
            0.0
        } else {
            (f64::from(value) / f64::from(goal)).min(1.0)
        };
        Self {
            value,
            goal,
            met: goal > 0 && value >= goal,
            ratio,
        }
    }
}

/// Minutes logged (time-bucket tasks) or distinct active days (count habits)
/// for `task` in the week containing `today`.
pub fn aggregate_weekly_progress(task: &Task, logs: &[CompletionLog], today: NaiveDate) -> u32 {
    let week = Week::containing(today);
    let in_week = logs
        .iter()
        .filter(|log| log.task_id == task.id && week.contains(log.date));

    match task.cadence() {
        Cadence::Minutes(_) => {
            in_week.fold(0u32, |total, log| total.saturating_add(log.minutes))
        }
        Cadence::Frequency(_) => {
            let days: BTreeSet<NaiveDate> = in_week.map(|log| log.date).collect();
            days.len() as u32
        }
    }
}

pub fn weekly_progress(task: &Task, logs: &[CompletionLog], today: NaiveDate) -> WeeklyProgress {
    WeeklyProgress::new(
        aggregate_weekly_progress(task, logs, today),
        task.cadence().weekly_goal(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn task(frequency_goal: u8, time_goal_minutes: u32) -> Task {
        Task {
            id: 7,
            title: "Guitar".into(),
            category: "Art".into(),
            frequency_goal,
            time_goal_minutes,
            last_completed_at: None,
            current_streak: 0,
            linked_skill_id: None,
        }
    }

    fn log(task_id: i64, day: u32, minutes: u32) -> CompletionLog {
        CompletionLog {
            id: 0,
            task_id,
            date: date(day),
            minutes,
            xp_awarded: 0,
            previous_streak: None,
            previous_completed_at: None,
        }
    }

    #[test]
    fn count_habit_counts_distinct_days() {
        // Week of 2026-10-12 (Mon) to 2026-10-18 (Sun).
        let logs = vec![log(7, 13, 0), log(7, 13, 0), log(7, 15, 0)];
        assert_eq!(aggregate_weekly_progress(&task(3, 0), &logs, date(18)), 2);
    }

    #[test]
    fn time_bucket_sums_minutes_inside_the_week() {
        let logs = vec![
            log(7, 11, 90), // previous Sunday
            log(7, 12, 30),
            log(7, 16, 45),
            log(8, 16, 600), // other task
        ];
        assert_eq!(aggregate_weekly_progress(&task(0, 120), &logs, date(17)), 75);
    }

    #[test]
    fn minute_totals_saturate() {
        let logs = vec![log(7, 13, u32::MAX - 10), log(7, 14, 100)];
        assert_eq!(aggregate_weekly_progress(&task(0, 60), &logs, date(15)), u32::MAX);
    }

    #[test]
    fn progress_view_clamps_ratio_and_handles_zero_goal() {
        let over = WeeklyProgress::new(150, 120);
        assert!(over.met);
        assert_eq!(over.ratio, 1.0);

        let zero = WeeklyProgress::new(3, 0);
        assert!(!zero.met);
        assert_eq!(zero.ratio, 0.0);

        let logs = vec![log(7, 14, 0)];
        let view = weekly_progress(&task(2, 0), &logs, date(18));
        assert_eq!(view.value, 1);
        assert_eq!(view.goal, 2);
        assert_eq!(view.ratio, 0.5);
    }
}
