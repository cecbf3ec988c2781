use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::calendar_days_between;
use crate::task::Task;

/// Days since the last completion that a daily task may sit in the warning state.
const DAILY_WARNING_DAY: i64 = 2;
/// Days of inactivity a weekly task tolerates before its streak breaks.
const WEEKLY_MAX_GAP_DAYS: i64 = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    Active,
    Warning,
    Broken,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakEvaluation {
    pub status: StreakStatus,
    pub adjusted_streak: u32,
}

impl StreakEvaluation {
    fn broken() -> Self {
        Self {
            status: StreakStatus::Broken,
            adjusted_streak: 0,
        }
    }

    fn keep(status: StreakStatus, streak: u32) -> Self {
        Self {
            status,
            adjusted_streak: streak,
        }
    }

    /// Streak value after one more completion: a broken chain restarts at 1.
    pub fn after_completion(&self) -> u32 {
        match self.status {
            StreakStatus::Broken => 1,
            StreakStatus::Active | StreakStatus::Warning => self.adjusted_streak.saturating_add(1),
        }
    }
}

/// Current streak status of `task` as seen on `today`.
pub fn evaluate_streak(task: &Task, today: NaiveDate) -> StreakEvaluation {
    let Some(last) = task.last_completed_at else {
        return StreakEvaluation::broken();
    };
    let diff = calendar_days_between(last, today);

    if task.cadence().is_daily() {
        match diff {
            d if d <= 1 => StreakEvaluation::keep(StreakStatus::Active, task.current_streak),
            DAILY_WARNING_DAY => StreakEvaluation::keep(StreakStatus::Warning, task.current_streak),
            _ => StreakEvaluation::broken(),
        }
    } else if diff > WEEKLY_MAX_GAP_DAYS {
        StreakEvaluation::broken()
    } else {
        StreakEvaluation::keep(StreakStatus::Active, task.current_streak)
    }
}

/// Streak value after undoing today's completion.
pub fn after_undo(current_streak: u32) -> u32 {
    current_streak.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn task(frequency_goal: u8, days_ago: Option<i64>, streak: u32) -> Task {
        Task {
            id: 1,
            title: "Stretch".into(),
            category: "Health".into(),
            frequency_goal,
            time_goal_minutes: 0,
            last_completed_at: days_ago.map(|d| today() - Duration::days(d)),
            current_streak: streak,
            linked_skill_id: None,
        }
    }

    #[test]
    fn never_completed_is_broken() {
        let eval = evaluate_streak(&task(7, None, 4), today());
        assert_eq!(eval, StreakEvaluation::broken());
        assert_eq!(eval.after_completion(), 1);
    }

    #[test]
    fn daily_chain_survives_today_and_yesterday() {
        for days_ago in [0, 1] {
            let eval = evaluate_streak(&task(7, Some(days_ago), 4), today());
            assert_eq!(eval.status, StreakStatus::Active);
            assert_eq!(eval.adjusted_streak, 4);
        }
        let eval = evaluate_streak(&task(7, Some(1), 4), today());
        assert_eq!(eval.after_completion(), 5);
    }

    #[test]
    fn daily_grace_day_warns_without_losing_the_count() {
        let eval = evaluate_streak(&task(7, Some(2), 5), today());
        assert_eq!(eval.status, StreakStatus::Warning);
        assert_eq!(eval.adjusted_streak, 5);
        assert_eq!(eval.after_completion(), 6);
    }

    #[test]
    fn daily_chain_breaks_after_two_missed_days() {
        let eval = evaluate_streak(&task(7, Some(3), 5), today());
        assert_eq!(eval.status, StreakStatus::Broken);
        assert_eq!(eval.adjusted_streak, 0);
        assert_eq!(eval.after_completion(), 1);
    }

    #[test]
    fn weekly_cadence_breaks_only_after_eight_days() {
        let eight = evaluate_streak(&task(3, Some(8), 2), today());
        assert_eq!(eight.status, StreakStatus::Active);
        assert_eq!(eight.adjusted_streak, 2);

        let nine = evaluate_streak(&task(3, Some(9), 2), today());
        assert_eq!(nine.status, StreakStatus::Broken);
        assert_eq!(nine.adjusted_streak, 0);
    }

    #[test]
    fn time_bucket_uses_weekly_branch_even_with_daily_frequency() {
        let mut bucket = task(7, Some(5), 3);
        bucket.time_goal_minutes = 60;
        let eval = evaluate_streak(&bucket, today());
        assert_eq!(eval.status, StreakStatus::Active);
        assert_eq!(eval.adjusted_streak, 3);
    }

    #[test]
    fn future_completion_counts_as_active() {
        let eval = evaluate_streak(&task(7, Some(-1), 2), today());
        assert_eq!(eval.status, StreakStatus::Active);
    }

    #[test]
    fn undo_never_goes_negative() {
        assert_eq!(after_undo(3), 2);
        assert_eq!(after_undo(0), 0);
    }
}
