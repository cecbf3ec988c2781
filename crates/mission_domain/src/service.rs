use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use mission_core::analytics::{self, CategoryCount, DailyActivity, HabitRow, MAX_PULSE_DAYS};
use mission_core::award::{time_log_award, toggle_award};
use mission_core::clock::Week;
use mission_core::goal::Goal;
use mission_core::progress::{aggregate_weekly_progress, weekly_progress, WeeklyProgress};
use mission_core::rank::{self, Rank};
use mission_core::recovery::{
    compute_recovery_target, is_known_group, recovery_board, sleep_fill_percent, sleep_status,
    toggle_muscle, MuscleFatigueRecord, MuscleToggle, RecoveryBoard, RecoveryTarget, SleepLog,
    SleepStatus,
};
use mission_core::skill::{apply_xp_delta, LedgerUpdate, Skill};
use mission_core::streak::{after_undo, evaluate_streak, StreakEvaluation};
use mission_core::task::{CompletionLog, NewTask, Task, ValidationError, MAX_LOG_MINUTES};
use mission_core::EngineConfig;

use crate::error::{EngineError, EngineResult};
use crate::memory::InMemoryStore;
use crate::notifications::{GoalReached, LevelUp, ProgressSink};
use crate::store::{Filter, Row, Store, StoreError, Table};

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Completed(Completion),
    Undone(Undo),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub task: Task,
    /// Streak state before this completion.
    pub previous: StreakEvaluation,
    pub log: CompletionLog,
    pub skill: Option<Skill>,
    pub level_up: Option<LevelUp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Undo {
    pub task: Task,
    pub removed_logs: usize,
    pub xp_revoked: u64,
    pub skill: Option<Skill>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeLogOutcome {
    pub task: Task,
    pub log: CompletionLog,
    pub progress_before: u32,
    pub progress: WeeklyProgress,
    pub goal_crossed: bool,
    pub skill: Option<Skill>,
    pub level_up: Option<LevelUp>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionView {
    pub task: Task,
    pub streak: StreakEvaluation,
    pub progress: WeeklyProgress,
    pub done_today: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionBoard {
    pub missions: Vec<MissionView>,
    pub goals_due: Vec<Goal>,
}

impl MissionBoard {
    pub fn pending(&self) -> impl Iterator<Item = &MissionView> {
        self.missions.iter().filter(|view| !view.done_today)
    }

    pub fn processed(&self) -> impl Iterator<Item = &MissionView> {
        self.missions.iter().filter(|view| view.done_today)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryReport {
    pub target: RecoveryTarget,
    pub board: RecoveryBoard,
    pub logged_sleep: Option<f64>,
    pub sleep: SleepStatus,
    pub fill_percent: f64,
}

pub struct MissionService {
    store: Arc<dyn Store>,
    config: EngineConfig,
    progress_sink: Option<Box<dyn ProgressSink>>,
}

#[derive(Default)]
pub struct MissionServiceBuilder {
    store: Option<Arc<dyn Store>>,
    config: EngineConfig,
    progress_sink: Option<Box<dyn ProgressSink>>,
}

impl MissionServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress_sink(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    pub fn build(self) -> MissionService {
        MissionService {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryStore::new())),
            config: self.config,
            progress_sink: self.progress_sink,
        }
    }
}

impl MissionService {
    pub fn builder() -> MissionServiceBuilder {
        MissionServiceBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Completes the task for `today`, or undoes today's completion when it
    /// was already completed today. Earlier days are never touched.
    #[instrument(skip(self))]
    pub fn toggle_completion(
        &self,
        task_id: i64,
        today: NaiveDate,
    ) -> EngineResult<ToggleOutcome> {
        let task: Task = self.fetch_one(Table::Tasks, "task", task_id)?;
        let skill = self.linked_skill(&task)?;

        if task.completed_on(today) {
            return self.undo_today(task, skill, today).map(ToggleOutcome::Undone);
        }

        let previous = evaluate_streak(&task, today);
        let streak = previous.after_completion();
        let xp = toggle_award(&self.config);
        let ledger = skill.as_ref().map(|skill| apply_xp_delta(skill, xp as i64));

        let log: CompletionLog = self.insert_one(
            Table::TaskLogs,
            &CompletionLog::recorded(&task, today, 0, xp),
        )?;
        let task: Task = self.patch_one(
            Table::Tasks,
            task_id,
            json!({ "last_completed_at": today, "current_streak": streak }),
        )?;
        let (skill, level_up) = self.write_ledger(ledger)?;

        info!(task_id, streak, xp, status = ?previous.status, "task completed");
        Ok(ToggleOutcome::Completed(Completion {
            task,
            previous,
            log,
            skill,
            level_up,
        }))
    }

    fn undo_today(
        &self,
        task: Task,
        skill: Option<Skill>,
        today: NaiveDate,
    ) -> EngineResult<Undo> {
        let week = Week::containing(today);
        let week_logs: Vec<CompletionLog> = self.fetch(
            Table::TaskLogs,
            &Filter::all()
                .equals("task_id", task.id)
                .between("date", week.start, week.end),
        )?;
        let (todays, earlier): (Vec<CompletionLog>, Vec<CompletionLog>) =
            week_logs.into_iter().partition(|log| log.date == today);

        let xp_revoked: u64 = todays.iter().map(|log| log.xp_awarded).sum();
        let ledger = skill
            .as_ref()
            .map(|skill| apply_xp_delta(skill, -(xp_revoked as i64)));

        // The day's first row carries the task state from before today.
        let snapshot = todays
            .iter()
            .min_by_key(|log| log.id)
            .and_then(|log| log.previous_streak.map(|streak| (streak, log.previous_completed_at)));
        let (streak, previous_day) = match snapshot {
            Some(state) => state,
            None => self.rebuild_undo_state(&task, &todays, &earlier, today)?,
        };

        let removed_logs = self.store.delete(
            Table::TaskLogs,
            &Filter::all()
                .equals("task_id", task.id)
                .equals("date", today.to_string()),
        )?;
        let task: Task = self.patch_one(
            Table::Tasks,
            task.id,
            json!({ "last_completed_at": previous_day, "current_streak": streak }),
        )?;
        let (skill, _) = self.write_ledger(ledger)?;

        info!(task_id = task.id, streak, xp_revoked, "completion undone");
        Ok(Undo {
            task,
            removed_logs,
            xp_revoked,
            skill,
        })
    }

    /// Undo state for rows written without a snapshot: one decrement per
    /// streak increment today's rows produced, and the latest earlier log date.
    fn rebuild_undo_state(
        &self,
        task: &Task,
        todays: &[CompletionLog],
        earlier: &[CompletionLog],
        today: NaiveDate,
    ) -> EngineResult<(u32, Option<NaiveDate>)> {
        let toggled = todays.iter().any(|log| log.minutes == 0);
        let crossed = task.is_time_bucket() && {
            let goal = task.time_goal_minutes;
            let before = aggregate_weekly_progress(task, earlier, today);
            let with_today = todays
                .iter()
                .fold(before, |total, log| total.saturating_add(log.minutes));
            before < goal && with_today >= goal
        };
        let decrements = u32::from(toggled) + u32::from(crossed);
        let streak = (0..decrements).fold(task.current_streak, |streak, _| after_undo(streak));

        let previous_day = self
            .fetch::<CompletionLog>(
                Table::TaskLogs,
                &Filter::all()
                    .equals("task_id", task.id)
                    .before("date", today),
            )?
            .into_iter()
            .map(|log| log.date)
            .max();
        Ok((streak, previous_day))
    }

    /// Records partial time against a time-bucket task. The streak moves at
    /// most once per week: when this log lifts progress to the goal.
    #[instrument(skip(self))]
    pub fn log_time(
        &self,
        task_id: i64,
        minutes: u32,
        today: NaiveDate,
    ) -> EngineResult<TimeLogOutcome> {
        if minutes == 0 || minutes > MAX_LOG_MINUTES {
            warn!(task_id, minutes, "rejected time log");
            return Err(EngineError::invalid(format!(
                "logged minutes must be within 1..={MAX_LOG_MINUTES}, got {minutes}"
            )));
        }
        let task: Task = self.fetch_one(Table::Tasks, "task", task_id)?;
        if !task.is_time_bucket() {
            warn!(task_id, "rejected time log for a count habit");
            return Err(EngineError::invalid(format!(
                "task `{}` has no weekly time goal",
                task.title
            )));
        }
        let skill = self.linked_skill(&task)?;

        let week = Week::containing(today);
        let week_logs: Vec<CompletionLog> = self.fetch(
            Table::TaskLogs,
            &Filter::all()
                .equals("task_id", task_id)
                .between("date", week.start, week.end),
        )?;
        let goal = task.time_goal_minutes;
        let progress_before = aggregate_weekly_progress(&task, &week_logs, today);
        let xp = time_log_award(minutes, progress_before, goal, &self.config);

        let progress_after = progress_before.saturating_add(minutes);
        let goal_crossed = progress_before < goal && progress_after >= goal;
        let evaluation = evaluate_streak(&task, today);
        let streak = if goal_crossed {
            evaluation.after_completion()
        } else {
            evaluation.adjusted_streak
        };
        let ledger = skill.as_ref().map(|skill| apply_xp_delta(skill, xp as i64));

        let log: CompletionLog = self.insert_one(
            Table::TaskLogs,
            &CompletionLog::recorded(&task, today, minutes, xp),
        )?;
        let task: Task = self.patch_one(
            Table::Tasks,
            task_id,
            json!({ "last_completed_at": today, "current_streak": streak }),
        )?;
        let (skill, level_up) = self.write_ledger(ledger)?;

        let mut logs = week_logs;
        logs.push(log.clone());
        let progress = weekly_progress(&task, &logs, today);

        if goal_crossed {
            info!(task_id, streak, "weekly time goal reached");
            if let Some(sink) = &self.progress_sink {
                sink.goal_reached(&GoalReached {
                    task_id,
                    title: task.title.clone(),
                    streak,
                });
            }
        }
        debug!(task_id, minutes, xp, progress = progress.value, "time logged");
        Ok(TimeLogOutcome {
            task,
            log,
            progress_before,
            progress,
            goal_crossed,
            skill,
            level_up,
        })
    }

    #[instrument(skip(self, new_task), fields(title = %new_task.title))]
    pub fn create_task(&self, new_task: NewTask) -> EngineResult<Task> {
        new_task.validate()?;
        if let Some(skill_id) = new_task.linked_skill_id {
            self.fetch_one::<Skill>(Table::Skills, "skill", skill_id)?;
        }
        let task = self.insert_one(Table::Tasks, &new_task.into_task())?;
        Ok(task)
    }

    /// Removes the task and every log that references it.
    #[instrument(skip(self))]
    pub fn delete_task(&self, task_id: i64) -> EngineResult<usize> {
        self.fetch_one::<Task>(Table::Tasks, "task", task_id)?;
        let logs = self
            .store
            .delete(Table::TaskLogs, &Filter::all().equals("task_id", task_id))?;
        self.store
            .delete(Table::Tasks, &Filter::all().equals("id", task_id))?;
        info!(task_id, logs, "task deleted");
        Ok(logs)
    }

    pub fn tasks(&self) -> EngineResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self.fetch(Table::Tasks, &Filter::all())?;
        tasks.sort_by_key(|task| task.id);
        Ok(tasks)
    }

    pub fn task(&self, task_id: i64) -> EngineResult<Task> {
        self.fetch_one(Table::Tasks, "task", task_id)
    }

    pub fn create_skill(&self, name: &str) -> EngineResult<Skill> {
        if name.trim().is_empty() {
            return Err(ValidationError::Missing("skill name").into());
        }
        let skill = Skill::new(name.trim(), self.config.starting_next_level_xp);
        self.insert_one(Table::Skills, &skill)
    }

    /// Highest level first.
    pub fn skills(&self) -> EngineResult<Vec<Skill>> {
        let mut skills: Vec<Skill> = self.fetch(Table::Skills, &Filter::all())?;
        skills.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then_with(|| b.current_xp.cmp(&a.current_xp))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(skills)
    }

    pub fn skill(&self, skill_id: i64) -> EngineResult<Skill> {
        self.fetch_one(Table::Skills, "skill", skill_id)
    }

    /// Removes the skill and unlinks every task that fed it. Returns how many
    /// tasks were unlinked.
    #[instrument(skip(self))]
    pub fn delete_skill(&self, skill_id: i64) -> EngineResult<usize> {
        self.fetch_one::<Skill>(Table::Skills, "skill", skill_id)?;
        let linked: Vec<Task> = self.fetch(
            Table::Tasks,
            &Filter::all().equals("linked_skill_id", skill_id),
        )?;
        for task in &linked {
            self.patch_one::<Task>(Table::Tasks, task.id, json!({ "linked_skill_id": null }))?;
        }
        self.store
            .delete(Table::Skills, &Filter::all().equals("id", skill_id))?;
        info!(skill_id, unlinked = linked.len(), "skill deleted");
        Ok(linked.len())
    }

    pub fn create_goal(
        &self,
        title: &str,
        horizon: &str,
        deadline: Option<NaiveDate>,
    ) -> EngineResult<Goal> {
        let goal = Goal::new(title, horizon, deadline)?;
        self.insert_one(Table::Goals, &goal)
    }

    pub fn toggle_goal(&self, goal_id: i64) -> EngineResult<Goal> {
        let goal: Goal = self.fetch_one(Table::Goals, "goal", goal_id)?;
        self.patch_one(
            Table::Goals,
            goal_id,
            json!({ "status": goal.status.toggled() }),
        )
    }

    pub fn goals(&self) -> EngineResult<Vec<Goal>> {
        let mut goals: Vec<Goal> = self.fetch(Table::Goals, &Filter::all())?;
        goals.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.id.cmp(&b.id)));
        Ok(goals)
    }

    /// Every task with its evaluated streak and this week's progress, plus
    /// pending goals due today.
    pub fn mission_board(&self, today: NaiveDate) -> EngineResult<MissionBoard> {
        let week = Week::containing(today);
        let logs: Vec<CompletionLog> = self.fetch(
            Table::TaskLogs,
            &Filter::all().between("date", week.start, week.end),
        )?;
        let missions = self
            .tasks()?
            .into_iter()
            .map(|task| {
                let streak = evaluate_streak(&task, today);
                let progress = weekly_progress(&task, &logs, today);
                let done_today = task.completed_on(today);
                MissionView {
                    task: Task {
                        current_streak: streak.adjusted_streak,
                        ..task
                    },
                    streak,
                    progress,
                    done_today,
                }
            })
            .collect();
        let goals_due = self
            .goals()?
            .into_iter()
            .filter(|goal| goal.due_on(today))
            .collect();
        Ok(MissionBoard {
            missions,
            goals_due,
        })
    }

    /// Logs a session for the group, or clears it when it is still in peak fatigue.
    #[instrument(skip(self))]
    pub fn toggle_muscle(&self, group: &str, now: DateTime<Utc>) -> EngineResult<MuscleToggle> {
        let group = group.trim().to_ascii_lowercase();
        if !is_known_group(&group) {
            warn!(%group, "rejected unknown muscle group");
            return Err(EngineError::invalid(format!("unknown muscle group `{group}`")));
        }
        let filter = Filter::all().equals("muscle_group", group.as_str());
        let current = self
            .fetch::<MuscleFatigueRecord>(Table::MuscleTracker, &filter)?
            .into_iter()
            .map(|record| record.updated_at)
            .max();

        let action = toggle_muscle(current, now);
        match action {
            MuscleToggle::Clear => {
                self.store.delete(Table::MuscleTracker, &filter)?;
            }
            MuscleToggle::Mark(at) => {
                let record = MuscleFatigueRecord {
                    id: 0,
                    muscle_group: group.clone(),
                    updated_at: at,
                };
                self.store.upsert(
                    Table::MuscleTracker,
                    to_row(Table::MuscleTracker, &record)?,
                    &["muscle_group"],
                )?;
            }
        }
        debug!(%group, ?action, "muscle toggled");
        Ok(action)
    }

    pub fn reset_muscles(&self) -> EngineResult<usize> {
        Ok(self.store.delete(Table::MuscleTracker, &Filter::all())?)
    }

    pub fn muscle_records(&self) -> EngineResult<Vec<MuscleFatigueRecord>> {
        self.fetch(Table::MuscleTracker, &Filter::all())
    }

    /// At most one entry per day; logging again overwrites the day's value.
    #[instrument(skip(self))]
    pub fn log_sleep(&self, date: NaiveDate, hours: f64) -> EngineResult<SleepLog> {
        if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
            return Err(EngineError::invalid(format!(
                "sleep hours must be within (0, 24], got {hours}"
            )));
        }
        let log = SleepLog {
            id: 0,
            date,
            hours_slept: hours,
        };
        let row = self
            .store
            .upsert(Table::SleepLogs, to_row(Table::SleepLogs, &log)?, &["date"])?;
        Ok(from_row(Table::SleepLogs, row)?)
    }

    pub fn recovery_report(
        &self,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> EngineResult<RecoveryReport> {
        let records = self.muscle_records()?;
        let target = compute_recovery_target(&records, now, &self.config);
        let logged_sleep = self
            .fetch::<SleepLog>(
                Table::SleepLogs,
                &Filter::all().equals("date", today.to_string()),
            )?
            .first()
            .map(|log| log.hours_slept);
        Ok(RecoveryReport {
            target,
            board: recovery_board(&records, now),
            logged_sleep,
            sleep: sleep_status(logged_sleep, target.target_sleep_hours),
            fill_percent: sleep_fill_percent(logged_sleep, target.target_sleep_hours),
        })
    }

    pub fn lifetime_xp(&self) -> EngineResult<u64> {
        let logs: Vec<CompletionLog> = self.fetch(Table::TaskLogs, &Filter::all())?;
        Ok(rank::lifetime_xp(&logs))
    }

    pub fn rank(&self) -> EngineResult<Rank> {
        Ok(Rank::for_lifetime_xp(self.lifetime_xp()?))
    }

    pub fn activity_pulse(
        &self,
        today: NaiveDate,
        days: usize,
    ) -> EngineResult<Vec<DailyActivity>> {
        if days == 0 || days > MAX_PULSE_DAYS {
            return Err(EngineError::invalid(format!(
                "activity window must be within 1..={MAX_PULSE_DAYS} days, got {days}"
            )));
        }
        let since = today - Duration::days(days as i64 - 1);
        let logs: Vec<CompletionLog> = self.fetch(
            Table::TaskLogs,
            &Filter::all().between("date", since, today),
        )?;
        Ok(analytics::activity_pulse(&logs, today, days))
    }

    pub fn streak_leaderboard(&self) -> EngineResult<Vec<Task>> {
        Ok(analytics::streak_leaderboard(&self.tasks()?))
    }

    pub fn category_breakdown(&self) -> EngineResult<Vec<CategoryCount>> {
        Ok(analytics::category_breakdown(&self.tasks()?))
    }

    /// Per-habit completion flags for the week ending `today`.
    pub fn habit_matrix(&self, today: NaiveDate) -> EngineResult<Vec<HabitRow>> {
        let since = today - Duration::days(analytics::MATRIX_DAYS as i64 - 1);
        let logs: Vec<CompletionLog> = self.fetch(
            Table::TaskLogs,
            &Filter::all().between("date", since, today),
        )?;
        Ok(analytics::habit_matrix(&self.tasks()?, &logs, today))
    }

    /// Wipes tasks, logs, goals, fatigue and sleep rows. Skills survive but
    /// restart at level 1.
    #[instrument(skip(self))]
    pub fn factory_reset(&self) -> EngineResult<()> {
        for table in [
            Table::TaskLogs,
            Table::Tasks,
            Table::Goals,
            Table::MuscleTracker,
            Table::SleepLogs,
        ] {
            let removed = self.store.delete(table, &Filter::all())?;
            debug!(%table, removed, "table cleared");
        }
        for skill in self.skills()? {
            self.store.update(
                Table::Skills,
                skill.id,
                object(json!({
                    "level": 1,
                    "current_xp": 0,
                    "next_level_xp": self.config.starting_next_level_xp.max(1),
                })),
            )?;
        }
        warn!("factory reset completed");
        Ok(())
    }
}

impl MissionService {
    fn linked_skill(&self, task: &Task) -> EngineResult<Option<Skill>> {
        task.linked_skill_id
            .map(|skill_id| self.fetch_one(Table::Skills, "skill", skill_id))
            .transpose()
    }

    fn write_ledger(
        &self,
        ledger: Option<LedgerUpdate>,
    ) -> EngineResult<(Option<Skill>, Option<LevelUp>)> {
        let Some(ledger) = ledger else {
            return Ok((None, None));
        };
        let skill: Skill = self.patch_one(
            Table::Skills,
            ledger.skill.id,
            json!({
                "level": ledger.skill.level,
                "current_xp": ledger.skill.current_xp,
                "next_level_xp": ledger.skill.next_level_xp,
            }),
        )?;
        if !ledger.leveled_up() {
            return Ok((Some(skill), None));
        }
        let event = LevelUp {
            skill_id: skill.id,
            skill_name: skill.name.clone(),
            new_level: skill.level,
            levels_gained: ledger.levels_gained,
        };
        info!(skill = %skill.name, level = skill.level, "skill leveled up");
        if let Some(sink) = &self.progress_sink {
            sink.level_up(&event);
        }
        Ok((Some(skill), Some(event)))
    }

    fn fetch<T: DeserializeOwned>(&self, table: Table, filter: &Filter) -> EngineResult<Vec<T>> {
        let rows = self.store.get(table, filter)?;
        debug!(%table, rows = rows.len(), "fetched rows");
        rows.into_iter()
            .map(|row| from_row(table, row).map_err(EngineError::from))
            .collect()
    }

    fn fetch_one<T: DeserializeOwned>(
        &self,
        table: Table,
        kind: &'static str,
        id: i64,
    ) -> EngineResult<T> {
        self.fetch(table, &Filter::all().equals("id", id))?
            .into_iter()
            .next()
            .ok_or(EngineError::NotFound { kind, id })
    }

    fn insert_one<T>(&self, table: Table, record: &T) -> EngineResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let row = to_row(table, record)?;
        let stored = self
            .store
            .insert(table, vec![row])?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StoreError::Unavailable(format!("insert into {table} returned no row"))
            })?;
        Ok(from_row(table, stored)?)
    }

    fn patch_one<T>(&self, table: Table, id: i64, patch: Value) -> EngineResult<T>
    where
        T: DeserializeOwned,
    {
        let row = self.store.update(table, id, object(patch))?;
        Ok(from_row(table, row)?)
    }
}

fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Serializes a record without its id; the store owns id assignment.
fn to_row<T: Serialize>(table: Table, record: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(StoreError::Malformed {
            table,
            reason: format!("expected an object, got {other}"),
        }),
    }
}

fn from_row<T: DeserializeOwned>(table: Table, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|err| StoreError::Malformed {
        table,
        reason: err.to_string(),
    })
}
