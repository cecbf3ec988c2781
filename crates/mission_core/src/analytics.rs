use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::trailing_days;
use crate::task::{CompletionLog, Task};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: u32,
}

/// Widest activity window, one leap year.
pub const MAX_PULSE_DAYS: usize = 366;
/// Columns of the habit matrix.
pub const MATRIX_DAYS: usize = 7;

/// Log rows per day over the `days` ending `today`, oldest first. The window
/// is capped at [`MAX_PULSE_DAYS`].
pub fn activity_pulse(
    logs: &[CompletionLog],
    today: NaiveDate,
    days: usize,
) -> Vec<DailyActivity> {
    let days = days.min(MAX_PULSE_DAYS);
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for log in logs {
        *counts.entry(log.date).or_default() += 1;
    }
    trailing_days(today, days)
        .into_iter()
        .map(|date| DailyActivity {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Tasks with a live streak, longest first.
pub fn streak_leaderboard(tasks: &[Task]) -> Vec<Task> {
    let mut ranked: Vec<Task> = tasks
        .iter()
        .filter(|task| task.current_streak > 0)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        b.current_streak
            .cmp(&a.current_streak)
            .then_with(|| a.title.cmp(&b.title))
    });
    ranked
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub tasks: usize,
}

/// Number of tasks per category, largest first, ties by name.
pub fn category_breakdown(tasks: &[Task]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.category.as_str()).or_default() += 1;
    }
    let mut breakdown: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, tasks)| CategoryCount {
            category: category.to_string(),
            tasks,
        })
        .collect();
    breakdown.sort_by(|a, b| b.tasks.cmp(&a.tasks));
    breakdown
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitRow {
    pub task_id: i64,
    pub title: String,
    pub current_streak: u32,
    /// One flag per day of [`habit_matrix`]'s window, oldest first.
    pub done: Vec<bool>,
}

/// Last [`MATRIX_DAYS`] days of activity for every frequency-goal task.
pub fn habit_matrix(tasks: &[Task], logs: &[CompletionLog], today: NaiveDate) -> Vec<HabitRow> {
    let active: HashSet<(i64, NaiveDate)> =
        logs.iter().map(|log| (log.task_id, log.date)).collect();
    let window = trailing_days(today, MATRIX_DAYS);
    tasks
        .iter()
        .filter(|task| task.frequency_goal > 0)
        .map(|task| HabitRow {
            task_id: task.id,
            title: task.title.clone(),
            current_streak: task.current_streak,
            done: window
                .iter()
                .map(|day| active.contains(&(task.id, *day)))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn task(title: &str, streak: u32) -> Task {
        Task {
            id: 0,
            title: title.into(),
            category: "Mind".into(),
            frequency_goal: 7,
            time_goal_minutes: 0,
            last_completed_at: None,
            current_streak: streak,
            linked_skill_id: None,
        }
    }

    fn log(task_id: i64, day: u32) -> CompletionLog {
        CompletionLog {
            id: 0,
            task_id,
            date: date(day),
            minutes: 0,
            xp_awarded: 20,
            previous_streak: None,
            previous_completed_at: None,
        }
    }

    #[test]
    fn pulse_reports_empty_days_as_zero() {
        let log = |day| log(1, day);
        let pulse = activity_pulse(&[log(16), log(18), log(18), log(2)], date(18), 3);
        let counts: Vec<u32> = pulse.iter().map(|day| day.count).collect();
        assert_eq!(counts, vec![1, 0, 2]);
        assert_eq!(pulse[0].date, date(16));
    }

    #[test]
    fn leaderboard_drops_zero_streaks_and_sorts() {
        let board = streak_leaderboard(&[
            task("Read", 3),
            task("Lift", 0),
            task("Code", 9),
            task("Draw", 3),
        ]);
        let titles: Vec<&str> = board.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["Code", "Draw", "Read"]);
    }

    #[test]
    fn pulse_window_is_capped() {
        assert_eq!(activity_pulse(&[], date(18), usize::MAX).len(), MAX_PULSE_DAYS);
    }

    #[test]
    fn categories_are_counted_per_task() {
        let mut lift = task("Lift", 0);
        lift.category = "Health".into();
        let mut run = task("Run", 0);
        run.category = "Health".into();
        let breakdown = category_breakdown(&[task("Read", 1), lift, run]);
        assert_eq!(
            breakdown,
            vec![
                CategoryCount {
                    category: "Health".into(),
                    tasks: 2
                },
                CategoryCount {
                    category: "Mind".into(),
                    tasks: 1
                },
            ]
        );
        assert!(category_breakdown(&[]).is_empty());
    }

    #[test]
    fn habit_matrix_marks_days_with_logs() {
        let mut read = task("Read", 2);
        read.id = 1;
        let mut piano = task("Piano", 0);
        piano.id = 2;
        piano.frequency_goal = 0;
        piano.time_goal_minutes = 60;

        // Window is 2026-10-12..=2026-10-18; the 11th falls outside it.
        let logs = vec![log(1, 11), log(1, 12), log(1, 18), log(1, 18), log(2, 15)];
        let matrix = habit_matrix(&[read, piano], &logs, date(18));
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix[0].task_id, 1);
        assert_eq!(
            matrix[0].done,
            vec![true, false, false, false, false, false, true]
        );
    }
}
