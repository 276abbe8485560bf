//! Storage port used by the ranking and recurrence engines.
//!
//! Implementations: the in-memory [`Database`](crate::db::Database) and the
//! file-backed [`FileStore`](crate::db::FileStore).

use chrono::{FixedOffset, NaiveDate};

use crate::error::Result;
use crate::task::{Task, TaskDraft};

/// Task persistence as seen by the engines.
///
/// Request-driven operations are scoped by owner: a task id that is missing
/// or owned by someone else yields `None` or zero affected records, never an
/// error. Only [`completed_recurring_tasks`](TaskStore::completed_recurring_tasks)
/// and [`regenerate`](TaskStore::regenerate) span all users.
pub trait TaskStore {
    /// Open tasks of `user_id` created on or before `as_of`, ordered by due
    /// date ascending with undated tasks last, ties by id. Creation dates are
    /// read in the calendar of `offset`.
    fn load_open_tasks(&self, user_id: &str, as_of: NaiveDate, offset: FixedOffset) -> Result<Vec<Task>>;

    /// Look up a task owned by `user_id`.
    fn find_task(&self, task_id: u64, user_id: &str) -> Result<Option<Task>>;

    /// Persist a new task and return its assigned id.
    fn insert_task(&mut self, draft: TaskDraft) -> Result<u64>;

    /// Set the completion flag of an owned task, stamping `at_utc` as the
    /// completion time (cleared when reopening). Returns the number of records changed.
    fn update_completion(
        &mut self,
        task_id: u64,
        user_id: &str,
        completed: bool,
        at_utc: i64,
    ) -> Result<usize>;

    /// Every completed task with a recurring frequency, across all users.
    fn completed_recurring_tasks(&self) -> Result<Vec<Task>>;

    /// Compare-and-set regeneration.
    ///
    /// If `source_id` exists and has not been regenerated yet, insert
    /// `successor`, mark the source regenerated and, when `complete_source`
    /// is set, mark the source completed (at the successor's creation time),
    /// all as one unit. Returns the successor id, or `None` when the source
    /// is missing or already regenerated.
    fn regenerate(
        &mut self,
        source_id: u64,
        successor: TaskDraft,
        complete_source: bool,
    ) -> Result<Option<u64>>;
}
