//! Task and account records.
//!
//! This module defines the persisted `Task` and `User` shapes, the payloads used
//! to create and edit tasks, and the field validation applied before anything
//! reaches storage.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fields::*;

/// Impact assigned when none is given.
pub const DEFAULT_IMPACT: u32 = 5;

fn default_impact() -> u32 {
    DEFAULT_IMPACT
}

/// A single task owned by one user.
///
/// Recurring tasks form an implicit chain: each successor points back at the
/// task it was spawned from through `recurrence_source_id`, and the source is
/// marked `regenerated` so it never spawns twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub user_id: String,
    pub title: String,
    pub urgency: Urgency,
    pub importance: Importance,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_impact")]
    pub impact: u32,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at_utc: Option<i64>,
    #[serde(default)]
    pub recurrence_source_id: Option<u64>,
    #[serde(default)]
    pub regenerated: bool,
    pub created_at_utc: i64,
}

impl Task {
    /// Eisenhower quadrant of this task.
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::of(self.urgency, self.importance)
    }

    /// Creation date in the calendar of `offset`.
    pub fn created_date(&self, offset: FixedOffset) -> NaiveDate {
        local_date(self.created_at_utc, offset)
    }

    /// Date the task counts as finished on: completion date when recorded,
    /// creation date for records completed before completion times were kept.
    pub fn completion_date(&self, offset: FixedOffset) -> NaiveDate {
        local_date(self.completed_at_utc.unwrap_or(self.created_at_utc), offset)
    }

    /// Whether the task is open and past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|d| d < today)
    }
}

/// Insert payload: a task before storage assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub user_id: String,
    pub title: String,
    pub urgency: Urgency,
    pub importance: Importance,
    pub due_date: Option<NaiveDate>,
    pub impact: u32,
    pub frequency: Frequency,
    pub recurrence_source_id: Option<u64>,
    pub created_at_utc: i64,
}

impl TaskDraft {
    /// Materialize the draft under the id storage assigned to it.
    pub fn into_task(self, id: u64) -> Task {
        Task {
            id,
            user_id: self.user_id,
            title: self.title,
            urgency: self.urgency,
            importance: self.importance,
            due_date: self.due_date,
            impact: self.impact,
            frequency: self.frequency,
            completed: false,
            completed_at_utc: None,
            recurrence_source_id: self.recurrence_source_id,
            regenerated: false,
            created_at_utc: self.created_at_utc,
        }
    }
}

/// Edit payload. `None` leaves a field untouched; `due_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub urgency: Option<Urgency>,
    pub importance: Option<Importance>,
    pub due_date: Option<Option<NaiveDate>>,
    pub impact: Option<u32>,
    pub frequency: Option<Frequency>,
}

impl TaskPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Apply every set field to `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(u) = self.urgency {
            task.urgency = u;
        }
        if let Some(i) = self.importance {
            task.importance = i;
        }
        if let Some(d) = self.due_date {
            task.due_date = d;
        }
        if let Some(impact) = self.impact {
            task.impact = impact;
        }
        if let Some(f) = self.frequency {
            task.frequency = f;
        }
    }
}

/// A registered account. The password is only ever held as an argon2 PHC string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub password_hash: String,
}

/// A push endpoint registered by a user for reminders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub endpoint: String,
    pub created_at_utc: i64,
}

/// Trim a title and reject it if nothing is left.
pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::InvalidTask("title must not be empty".into()));
    }
    Ok(title.to_string())
}

/// Parse an impact value: a non-negative integer.
pub fn parse_impact(raw: &str) -> Result<u32> {
    let raw = raw.trim();
    if raw.starts_with('-') {
        return Err(Error::InvalidTask(format!("impact must not be negative: {raw}")));
    }
    raw.parse::<u32>()
        .map_err(|_| Error::InvalidTask(format!("impact must be a whole number: {raw}")))
}

/// Convert a stored epoch-seconds timestamp; out-of-range values clamp to the epoch.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default()
}

/// Calendar date of a stored timestamp as seen at `offset`.
pub fn local_date(ts: i64, offset: FixedOffset) -> NaiveDate {
    timestamp_to_datetime(ts).with_timezone(&offset).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    fn sample() -> Task {
        TaskDraft {
            user_id: "alice".into(),
            title: "Water plants".into(),
            urgency: Urgency::NotUrgent,
            importance: Importance::Important,
            due_date: NaiveDate::from_ymd_opt(2025, 4, 7),
            impact: DEFAULT_IMPACT,
            frequency: Frequency::Daily,
            recurrence_source_id: None,
            created_at_utc: 1_743_984_000, // 2025-04-07T00:00:00Z
        }
        .into_task(1)
    }

    #[test]
    fn drafts_start_open_and_unregenerated() {
        let t = sample();
        assert!(!t.completed);
        assert!(!t.regenerated);
        assert_eq!(t.completed_at_utc, None);
        assert_eq!(t.quadrant(), Quadrant::Schedule);
        assert_eq!(t.created_date(Utc.fix()), NaiveDate::from_ymd_opt(2025, 4, 7).unwrap());
    }

    #[test]
    fn dates_are_bucketed_in_the_given_calendar() {
        let t = sample();
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        // Midnight UTC is still the previous evening five hours west.
        assert_eq!(t.created_date(west), NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
        assert_eq!(t.completion_date(west), NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
    }

    #[test]
    fn test_parse_impact() {
        assert_eq!(parse_impact("8").unwrap(), 8);
        assert_eq!(parse_impact(" 0 ").unwrap(), 0);
        assert!(matches!(parse_impact("-1"), Err(Error::InvalidTask(_))));
        assert!(matches!(parse_impact("2.5"), Err(Error::InvalidTask(_))));
        assert!(matches!(parse_impact("high"), Err(Error::InvalidTask(_))));
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Pay rent ").unwrap(), "Pay rent");
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn patch_can_clear_due_date() {
        let mut t = sample();
        let patch = TaskPatch { due_date: Some(None), impact: Some(9), ..TaskPatch::default() };
        assert!(!patch.is_empty());
        patch.apply(&mut t);
        assert_eq!(t.due_date, None);
        assert_eq!(t.impact, 9);
        assert_eq!(t.title, "Water plants");
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let json = r#"{"id":3,"user_id":"bob","title":"Call","urgency":"urgent",
            "importance":"important","created_at_utc":0}"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert_eq!(t.impact, DEFAULT_IMPACT);
        assert_eq!(t.frequency, Frequency::None);
        assert_eq!(t.due_date, None);
        assert!(!t.completed);
    }

    #[test]
    fn overdue_requires_open_task_with_past_due() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 8).unwrap();
        let mut t = sample();
        assert!(t.is_overdue(today));
        t.completed = true;
        assert!(!t.is_overdue(today));
        t.completed = false;
        t.due_date = None;
        assert!(!t.is_overdue(today));
    }
}
