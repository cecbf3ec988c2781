use serde::{Deserialize, Serialize};

/// A skill crossed one or more level thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelUp {
    pub skill_id: i64,
    pub skill_name: String,
    pub new_level: u32,
    pub levels_gained: u32,
}

/// A time-bucket task reached its weekly goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalReached {
    pub task_id: i64,
    pub title: String,
    pub streak: u32,
}

/// Front ends implement this to surface celebrations. Delivery is fire-and-forget.
pub trait ProgressSink: Send + Sync {
    fn level_up(&self, event: &LevelUp);
    fn goal_reached(&self, event: &GoalReached);
}
