use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Monday-to-Sunday calendar week, both ends inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Week {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Week {
    pub fn containing(day: NaiveDate) -> Self {
        let offset = i64::from(day.weekday().num_days_from_monday());
        let start = day - Duration::days(offset);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }
}

/// Whole calendar days from `earlier` to `later`. Negative when `earlier` is after `later`.
pub fn calendar_days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Whole hours elapsed, truncated toward zero.
pub fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_hours()
}

/// The `count` days ending at `today`, oldest first.
pub fn trailing_days(today: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .rev()
        .map(|back| today - Duration::days(back as i64))
        .collect()
}
