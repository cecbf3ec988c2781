use serde::{Deserialize, Serialize};

use crate::task::CompletionLog;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    RookieScout,
    Operator,
    EliteVanguard,
    Commander,
    Grandmaster,
}

impl Rank {
    /// Thresholds are exclusive: exactly 500 XP is still a Rookie Scout.
    pub fn for_lifetime_xp(xp: u64) -> Self {
        match xp {
            x if x > 10_000 => Rank::Grandmaster,
            x if x > 5_000 => Rank::Commander,
            x if x > 2_000 => Rank::EliteVanguard,
            x if x > 500 => Rank::Operator,
            _ => Rank::RookieScout,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Rank::RookieScout => "Rookie Scout",
            Rank::Operator => "Operator",
            Rank::EliteVanguard => "Elite Vanguard",
            Rank::Commander => "Commander",
            Rank::Grandmaster => "Grandmaster",
        }
    }
}

pub fn lifetime_xp(logs: &[CompletionLog]) -> u64 {
    logs.iter().map(|log| log.xp_awarded).sum()
}
