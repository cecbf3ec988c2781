use crate::config::EngineConfig;

/// XP for a simple toggle completion.
pub fn toggle_award(config: &EngineConfig) -> u64 {
    config.toggle_xp
}

/// XP for a time log. The overachievement bonus is judged on progress
/// *before* this log is recorded.
pub fn time_log_award(
    minutes: u32,
    progress_before: u32,
    weekly_goal: u32,
    config: &EngineConfig,
) -> u64 {
    let base = u64::from(minutes);
    if weekly_goal > 0 && progress_before >= weekly_goal {
        (base as f64 * config.overachievement_multiplier).floor() as u64
    } else {
        base
    }
}
