use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored record: a flat JSON object with an integer `id`.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Tasks,
    TaskLogs,
    Goals,
    Skills,
    MuscleTracker,
    SleepLogs,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Tasks,
        Table::TaskLogs,
        Table::Goals,
        Table::Skills,
        Table::MuscleTracker,
        Table::SleepLogs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Tasks => "tasks",
            Table::TaskLogs => "task_logs",
            Table::Goals => "goals",
            Table::Skills => "skills",
            Table::MuscleTracker => "muscle_tracker",
            Table::SleepLogs => "sleep_logs",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row {id} not found in {table}")]
    MissingRow { table: Table, id: i64 },
    #[error("malformed row in {table}: {reason}")]
    Malformed { table: Table, reason: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Eq { field: String, value: Value },
    Range {
        field: String,
        from: Option<String>,
        to: Option<String>,
    },
    Before { field: String, bound: String },
}

/// Conjunction of field-equality and inclusive date-range clauses.
///
/// Date bounds compare as strings, which orders ISO `YYYY-MM-DD` values by
/// calendar day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn between(mut self, field: &str, from: impl ToString, to: impl ToString) -> Self {
        self.clauses.push(Clause::Range {
            field: field.to_string(),
            from: Some(from.to_string()),
            to: Some(to.to_string()),
        });
        self
    }

    pub fn since(mut self, field: &str, from: impl ToString) -> Self {
        self.clauses.push(Clause::Range {
            field: field.to_string(),
            from: Some(from.to_string()),
            to: None,
        });
        self
    }

    /// Strictly earlier than `bound`.
    pub fn before(mut self, field: &str, bound: impl ToString) -> Self {
        self.clauses.push(Clause::Before {
            field: field.to_string(),
            bound: bound.to_string(),
        });
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq { field, value } => row.get(field) == Some(value),
            Clause::Range { field, from, to } => {
                let Some(actual) = row.get(field).and_then(Value::as_str) else {
                    return false;
                };
                from.as_deref().map_or(true, |from| actual >= from)
                    && to.as_deref().map_or(true, |to| actual <= to)
            }
            Clause::Before { field, bound } => row
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|actual| actual < bound.as_str()),
        })
    }
}

/// The relational store the engine reads from and writes to.
///
/// Implementations provide no transactions; callers order their writes and
/// surface the first failure without retrying.
pub trait Store: Send + Sync {
    fn get(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    /// Inserts rows, assigning each a fresh `id`. Returns the stored rows.
    fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    /// Merges `patch` into the row with `id` and returns the result.
    fn update(&self, table: Table, id: i64, patch: Row) -> Result<Row, StoreError>;

    /// Deletes every matching row and returns how many were removed.
    fn delete(&self, table: Table, filter: &Filter) -> Result<usize, StoreError>;

    /// Updates the row whose `conflict_key` fields equal those of `row`, or
    /// inserts it when none does.
    fn upsert(&self, table: Table, row: Row, conflict_key: &[&str]) -> Result<Row, StoreError>;
}
