pub mod analytics;
pub mod award;
pub mod clock;
pub mod config;
pub mod goal;
pub mod progress;
pub mod rank;
pub mod recovery;
pub mod skill;
pub mod streak;
pub mod task;

pub use crate::config::EngineConfig;
pub use crate::progress::aggregate_weekly_progress;
pub use crate::recovery::{classify_muscle, compute_recovery_target};
pub use crate::skill::apply_xp_delta;
pub use crate::streak::evaluate_streak;
