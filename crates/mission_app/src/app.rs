use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use mission_core::recovery::{MuscleToggle, SleepStatus};
use mission_core::streak::StreakStatus;
use mission_core::task::{NewCadence, NewTask};
use mission_core::EngineConfig;
use mission_domain::notifications::{GoalReached, LevelUp, ProgressSink};
use mission_domain::service::ToggleOutcome;
use mission_domain::{JsonFileStore, MissionService};
use tracing::{info, warn};

const DEFAULT_DATA_FILE: &str = "missions.json";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_path: PathBuf,
    pub(crate) engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_vars(|key| std::env::var(key).ok()))
    }

    pub(crate) fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("MISSIONS_DATA") {
            if !path.trim().is_empty() {
                config.data_path = PathBuf::from(path.trim());
            }
        }
        if let Some(xp) = lookup("MISSIONS_TOGGLE_XP") {
            match xp.trim().parse::<u64>() {
                Ok(value) => config.engine.toggle_xp = value,
                Err(err) => warn!(value = %xp, %err, "ignoring MISSIONS_TOGGLE_XP"),
            }
        }
        if let Some(hours) = lookup("MISSIONS_BASE_SLEEP_HOURS") {
            match hours.trim().parse::<f64>() {
                Ok(value) if value > 0.0 && value <= 24.0 => config.engine.base_sleep_hours = value,
                _ => warn!(value = %hours, "ignoring MISSIONS_BASE_SLEEP_HOURS"),
            }
        }
        config
    }

    pub fn data_path(&self) -> &PathBuf {
        &self.data_path
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }
}

#[derive(Parser, Debug)]
#[command(name = "missions", version, about = "Habit streaks, skill XP and recovery tracking")]
pub struct Cli {
    /// Evaluate as of this day instead of today (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mission management
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Skill management
    Skill {
        #[command(subcommand)]
        action: SkillAction,
    },
    /// Long-horizon goals
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },
    /// Muscle fatigue tracking
    Muscle {
        #[command(subcommand)]
        action: MuscleAction,
    },
    /// Sleep logging
    Sleep {
        #[command(subcommand)]
        action: SleepAction,
    },
    /// Show the sleep target and muscle recovery board
    Recovery,
    /// Show today's missions with streaks and weekly progress
    Board,
    /// Show rank, lifetime XP, activity, categories, habit matrix and streak leaders
    Stats {
        /// Days of activity to show
        #[arg(long, default_value = "14")]
        days: usize,
    },
    /// Delete all progress; skills are kept at level 1
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskAction {
    /// Create a new mission
    Add(TaskArgs),
    /// List missions
    List,
    /// Delete a mission and its history
    Delete { id: i64 },
    /// Toggle today's completion
    Done { id: i64 },
    /// Log minutes against a time-goal mission
    Log { id: i64, minutes: u32 },
}

#[derive(Args, Debug)]
pub struct TaskArgs {
    /// Mission title
    pub title: String,
    #[arg(long, default_value = "General")]
    pub category: String,
    /// Completions per week (7 = daily)
    #[arg(long, conflicts_with = "minutes")]
    pub per_week: Option<u8>,
    /// Weekly time goal in minutes
    #[arg(long)]
    pub minutes: Option<u32>,
    /// Skill that earns XP from this mission
    #[arg(long)]
    pub skill: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum SkillAction {
    /// Create a skill at level 1
    Add { name: String },
    /// List skills, highest level first
    List,
    /// Delete a skill; linked missions keep running without XP
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum GoalAction {
    /// Create a goal
    Add {
        title: String,
        #[arg(long, default_value = "Weekly")]
        horizon: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// Flip a goal between pending and done
    Toggle { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum MuscleAction {
    /// Log a session for a group, or undo one still in peak fatigue
    Toggle { group: String },
    /// Clear every fatigue record
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum SleepAction {
    /// Record last night's sleep
    Log {
        hours: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn level_up(&self, event: &LevelUp) {
        println!("*** {} reached level {} ***", event.skill_name, event.new_level);
    }

    fn goal_reached(&self, event: &GoalReached) {
        println!(
            "*** weekly goal reached for {} (streak {}) ***",
            event.title, event.streak
        );
    }
}

pub fn run(config: AppConfig, cli: Cli) -> Result<()> {
    let store = JsonFileStore::open(&config.data_path).with_context(|| {
        format!("unable to open data file {}", config.data_path.display())
    })?;
    info!(path = %config.data_path.display(), "using data file");
    let service = MissionService::builder()
        .with_store(Arc::new(store))
        .with_config(config.engine.clone())
        .with_progress_sink(Box::new(ConsoleSink))
        .build();

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&service, cli.command, today, Utc::now(), &mut out)
}

pub(crate) fn execute(
    service: &MissionService,
    command: Command,
    today: NaiveDate,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Task { action } => run_task(service, action, today, out),
        Command::Skill { action } => match action {
            SkillAction::Add { name } => {
                let skill = service.create_skill(&name).context("unable to create skill")?;
                writeln!(out, "created skill #{} {}", skill.id, skill.name)?;
                Ok(())
            }
            SkillAction::List => {
                for skill in service.skills()? {
                    writeln!(
                        out,
                        "#{:<4} {:<20} lvl {:<3} {}/{} xp",
                        skill.id, skill.name, skill.level, skill.current_xp, skill.next_level_xp
                    )?;
                }
                Ok(())
            }
            SkillAction::Delete { id } => {
                let unlinked = service.delete_skill(id)?;
                writeln!(out, "deleted skill #{id}; {unlinked} missions unlinked")?;
                Ok(())
            }
        },
        Command::Goal { action } => match action {
            GoalAction::Add {
                title,
                horizon,
                deadline,
            } => {
                let goal = service
                    .create_goal(&title, &horizon, deadline)
                    .context("unable to create goal")?;
                writeln!(out, "created goal #{} {}", goal.id, goal.title)?;
                Ok(())
            }
            GoalAction::Toggle { id } => {
                let goal = service.toggle_goal(id)?;
                writeln!(out, "goal #{} is now {:?}", goal.id, goal.status)?;
                Ok(())
            }
        },
        Command::Muscle { action } => match action {
            MuscleAction::Toggle { group } => {
                match service.toggle_muscle(&group, now)? {
                    MuscleToggle::Clear => writeln!(out, "cleared {group}")?,
                    MuscleToggle::Mark(_) => writeln!(out, "logged {group}")?,
                }
                Ok(())
            }
            MuscleAction::Reset => {
                let removed = service.reset_muscles()?;
                writeln!(out, "cleared {removed} muscle records")?;
                Ok(())
            }
        },
        Command::Sleep {
            action: SleepAction::Log { hours, date },
        } => {
            let log = service
                .log_sleep(date.unwrap_or(today), hours)
                .context("unable to log sleep")?;
            writeln!(out, "logged {:.1}h for {}", log.hours_slept, log.date)?;
            Ok(())
        }
        Command::Recovery => {
            let report = service.recovery_report(now, today)?;
            writeln!(
                out,
                "strain {} -> target {:.2}h",
                report.target.strain_score, report.target.target_sleep_hours
            )?;
            match report.sleep {
                SleepStatus::Recovered => writeln!(out, "sleep: recovered")?,
                SleepStatus::Deficit { hours_short } => {
                    writeln!(out, "sleep: {hours_short:.2}h short")?
                }
                SleepStatus::Pending => writeln!(out, "sleep: not logged")?,
            }
            writeln!(out, "fatigued:   {}", report.board.fatigued.join(", "))?;
            writeln!(out, "recovering: {}", report.board.recovering.join(", "))?;
            writeln!(out, "ready:      {}", report.board.ready.join(", "))?;
            Ok(())
        }
        Command::Board => {
            let board = service.mission_board(today)?;
            for (label, views) in [
                ("pending", board.pending().collect::<Vec<_>>()),
                ("done", board.processed().collect::<Vec<_>>()),
            ] {
                writeln!(out, "{label}:")?;
                for view in views {
                    let marker = match view.streak.status {
                        StreakStatus::Active => "",
                        StreakStatus::Warning => " (at risk)",
                        StreakStatus::Broken => " (broken)",
                    };
                    writeln!(
                        out,
                        "  #{:<4} {:<24} streak {}{} | {}/{}",
                        view.task.id,
                        view.task.title,
                        view.streak.adjusted_streak,
                        marker,
                        view.progress.value,
                        view.progress.goal
                    )?;
                }
            }
            for goal in &board.goals_due {
                writeln!(out, "goal due: #{} {}", goal.id, goal.title)?;
            }
            Ok(())
        }
        Command::Stats { days } => {
            let xp = service.lifetime_xp()?;
            writeln!(out, "{} ({xp} xp)", service.rank()?.title())?;
            let pulse = service
                .activity_pulse(today, days)
                .context("unable to compute activity")?;
            let line: String = pulse
                .iter()
                .map(|day| match day.count {
                    0 => '.',
                    1 => 'o',
                    _ => 'O',
                })
                .collect();
            writeln!(out, "activity: {line}")?;
            for entry in service.category_breakdown()? {
                writeln!(out, "  {:<24} {}", entry.category, entry.tasks)?;
            }
            writeln!(out, "last {} days:", mission_core::analytics::MATRIX_DAYS)?;
            for row in service.habit_matrix(today)? {
                let cells: String = row
                    .done
                    .iter()
                    .map(|done| if *done { '#' } else { '.' })
                    .collect();
                writeln!(out, "  {:<24} {cells}", row.title)?;
            }
            writeln!(out, "streaks:")?;
            for task in service.streak_leaderboard()?.iter().take(5) {
                writeln!(out, "  {:<24} {}", task.title, task.current_streak)?;
            }
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to reset without --yes");
            }
            service.factory_reset()?;
            writeln!(out, "all progress cleared")?;
            Ok(())
        }
    }
}

fn run_task(
    service: &MissionService,
    action: TaskAction,
    today: NaiveDate,
    out: &mut dyn Write,
) -> Result<()> {
    match action {
        TaskAction::Add(args) => {
            let cadence = match (args.per_week, args.minutes) {
                (_, Some(minutes)) => NewCadence::MinutesPerWeek(minutes),
                (Some(per_week), None) => NewCadence::TimesPerWeek(per_week),
                (None, None) => NewCadence::TimesPerWeek(7),
            };
            let task = service
                .create_task(NewTask {
                    title: args.title,
                    category: args.category,
                    cadence,
                    linked_skill_id: args.skill,
                })
                .context("unable to create task")?;
            writeln!(out, "created task #{} {}", task.id, task.title)?;
        }
        TaskAction::List => {
            for task in service.tasks()? {
                writeln!(
                    out,
                    "#{:<4} {:<24} {:<12} streak {}",
                    task.id, task.title, task.category, task.current_streak
                )?;
            }
        }
        TaskAction::Delete { id } => {
            let logs = service.delete_task(id)?;
            writeln!(out, "deleted task #{id} and {logs} log entries")?;
        }
        TaskAction::Done { id } => match service.toggle_completion(id, today)? {
            ToggleOutcome::Completed(done) => writeln!(
                out,
                "completed {} (+{} xp, streak {})",
                done.task.title, done.log.xp_awarded, done.task.current_streak
            )?,
            ToggleOutcome::Undone(undo) => writeln!(
                out,
                "undid {} (-{} xp, streak {})",
                undo.task.title, undo.xp_revoked, undo.task.current_streak
            )?,
        },
        TaskAction::Log { id, minutes } => {
            let logged = service.log_time(id, minutes, today)?;
            writeln!(
                out,
                "logged {minutes}m on {} (+{} xp, {}/{} this week)",
                logged.task.title,
                logged.log.xp_awarded,
                logged.progress.value,
                logged.progress.goal
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap()
    }

    fn exec(service: &MissionService, args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("missions").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(service, cli.command, today(), now(), &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn config_reads_env_and_ignores_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("MISSIONS_DATA", "/tmp/progress.json"),
            ("MISSIONS_TOGGLE_XP", "35"),
            ("MISSIONS_BASE_SLEEP_HOURS", "lots"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_vars(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.data_path(), &PathBuf::from("/tmp/progress.json"));
        assert_eq!(config.engine.toggle_xp, 35);
        assert_eq!(config.engine.base_sleep_hours, 7.0);

        let defaults = AppConfig::from_vars(|_| None);
        assert_eq!(defaults.data_path(), &PathBuf::from(DEFAULT_DATA_FILE));
    }

    #[test]
    fn commands_drive_the_service() {
        let service = MissionService::builder().build();
        exec(&service, &["skill", "add", "Fitness"]).unwrap();
        let created = exec(&service, &["task", "add", "Run", "--per-week", "3", "--skill", "1"])
            .unwrap();
        assert!(created.contains("created task #1 Run"));

        let done = exec(&service, &["task", "done", "1"]).unwrap();
        assert!(done.contains("+20 xp, streak 1"));
        let board = exec(&service, &["board"]).unwrap();
        assert!(board.contains("done:\n  #1"));

        let undone = exec(&service, &["task", "done", "1"]).unwrap();
        assert!(undone.contains("streak 0"));
        assert_eq!(service.skill(1).unwrap().current_xp, 0);
    }

    #[test]
    fn time_flag_conflicts_with_frequency() {
        let parsed = Cli::try_parse_from([
            "missions", "task", "add", "Read", "--per-week", "3", "--minutes", "60",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn recovery_and_reset_commands() {
        let service = MissionService::builder().build();
        exec(&service, &["muscle", "toggle", "Chest"]).unwrap();
        exec(&service, &["sleep", "log", "6.5"]).unwrap();
        let report = exec(&service, &["recovery"]).unwrap();
        assert!(report.contains("strain 1 -> target 7.25h"));
        assert!(report.contains("sleep: 0.75h short"));
        assert!(report.contains("fatigued:   chest"));

        assert!(exec(&service, &["reset"]).is_err());
        exec(&service, &["reset", "--yes"]).unwrap();
        assert!(service.muscle_records().unwrap().is_empty());
    }

    #[test]
    fn run_persists_to_the_data_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missions.json");
        let config = AppConfig::default().with_data_path(&path);
        let cli = Cli::try_parse_from(["missions", "skill", "add", "Focus"]).unwrap();
        run(config, cli).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("Focus"));
    }

    #[test]
    fn stats_shows_categories_and_matrix() {
        let service = MissionService::builder().build();
        exec(&service, &["task", "add", "Run", "--category", "Health"]).unwrap();
        exec(&service, &["task", "add", "Lift", "--category", "Health", "--per-week", "3"])
            .unwrap();
        exec(&service, &["task", "done", "1"]).unwrap();

        let stats = exec(&service, &["stats", "--days", "7"]).unwrap();
        assert!(stats.contains("activity: ......o"));
        assert!(stats.contains("Health"));
        assert!(stats.contains("......#"));
        assert!(exec(&service, &["stats", "--days", "0"]).is_err());
        assert!(exec(&service, &["stats", "--days", "100000"]).is_err());
    }

    #[test]
    fn skill_delete_unlinks_missions() {
        let service = MissionService::builder().build();
        exec(&service, &["skill", "add", "Fitness"]).unwrap();
        exec(&service, &["task", "add", "Run", "--skill", "1"]).unwrap();
        let deleted = exec(&service, &["skill", "delete", "1"]).unwrap();
        assert!(deleted.contains("1 missions unlinked"));
        assert!(exec(&service, &["task", "done", "1"]).is_ok());
        assert!(exec(&service, &["skill", "delete", "1"]).is_err());
    }
}
