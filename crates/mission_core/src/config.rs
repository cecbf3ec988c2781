use serde::{Deserialize, Serialize};

/// Tunable award and recovery constants. Defaults reproduce the canonical rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// XP for a simple toggle completion.
    pub toggle_xp: u64,
    /// Multiplier for time logged after the weekly goal was already met.
    pub overachievement_multiplier: f64,
    /// Threshold of a freshly created (or reset) skill.
    pub starting_next_level_xp: u64,
    pub base_sleep_hours: f64,
    /// Extra sleep per muscle group in peak fatigue.
    pub sleep_per_strained_group: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            toggle_xp: 20,
            overachievement_multiplier: 1.5,
            starting_next_level_xp: 100,
            base_sleep_hours: 7.0,
            sleep_per_strained_group: 0.25,
        }
    }
}
