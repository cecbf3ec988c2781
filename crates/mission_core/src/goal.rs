use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GoalStatus {
    #[default]
    Pending,
    Done,
}

impl GoalStatus {
    pub fn toggled(self) -> Self {
        match self {
            GoalStatus::Pending => GoalStatus::Done,
            GoalStatus::Done => GoalStatus::Pending,
        }
    }
}

/// A one-off objective. Goals never feed streaks, XP or recovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub horizon: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: GoalStatus,
}

impl Goal {
    pub fn new(
        title: &str,
        horizon: &str,
        deadline: Option<NaiveDate>,
    ) -> Result<Self, ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::Missing("title"));
        }
        Ok(Self {
            id: 0,
            title: title.trim().to_string(),
            horizon: horizon.trim().to_string(),
            deadline,
            status: GoalStatus::Pending,
        })
    }

    pub fn due_on(&self, day: NaiveDate) -> bool {
        self.status == GoalStatus::Pending && self.deadline == Some(day)
    }
}
