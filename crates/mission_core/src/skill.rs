use serde::{Deserialize, Serialize};

/// Threshold growth applied on every level-up, as a ratio `NUM / DEN` (1.5x).
const GROWTH_NUM: u64 = 3;
const GROWTH_DEN: u64 = 2;

/// A named progression track. `current_xp < next_level_xp` after every ledger write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub level: u32,
    pub current_xp: u64,
    pub next_level_xp: u64,
}

impl Skill {
    pub fn new(name: impl Into<String>, starting_next_level_xp: u64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            level: 1,
            current_xp: 0,
            next_level_xp: starting_next_level_xp.max(1),
        }
    }
}

/// Result of a ledger write. `levels_gained > 0` is the visible level-up event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerUpdate {
    pub skill: Skill,
    pub levels_gained: u32,
}

impl LedgerUpdate {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Applies an XP delta, cascading overflow into level-ups. Negative deltas
/// floor the XP at zero and never remove levels.
pub fn apply_xp_delta(skill: &Skill, delta: i64) -> LedgerUpdate {
    let mut updated = skill.clone();
    let mut xp = if delta >= 0 {
        skill.current_xp.saturating_add(delta.unsigned_abs())
    } else {
        skill.current_xp.saturating_sub(delta.unsigned_abs())
    };
    let mut threshold = skill.next_level_xp.max(1);
    let mut levels_gained = 0;

    while xp >= threshold {
        xp -= threshold;
        levels_gained += 1;
        threshold = next_threshold(threshold);
    }

    updated.level = skill.level.max(1).saturating_add(levels_gained);
    updated.current_xp = xp;
    updated.next_level_xp = threshold;
    LedgerUpdate {
        skill: updated,
        levels_gained,
    }
}

fn next_threshold(threshold: u64) -> u64 {
    (threshold.saturating_mul(GROWTH_NUM) / GROWTH_DEN).max(1)
}
