//! Database operations and utility functions for task management.
//!
//! This module provides the `Database` document holding users, tasks and push
//! subscriptions, the `FileStore` that persists it as JSON, and utility
//! functions for date parsing and table formatting.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fields::*;
use crate::priority::ScoredTask;
use crate::store::TaskStore;
use crate::task::{Subscription, Task, TaskDraft, TaskPatch, User};

/// In-memory database for storing and managing tasks.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub users: Vec<User>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    /// Next id to hand out. Ids are never reused, even after deletes.
    #[serde(default)]
    next_task_id: u64,
}

impl Database {
    /// Load database from JSON file, returning an empty database if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no database file yet, starting empty");
            return Ok(Database::default());
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let db = serde_json::from_str(&buf)?;
        Ok(db)
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Generate the next available task ID.
    pub fn next_id(&self) -> u64 {
        let after_max = self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.next_task_id.max(after_max)
    }

    /// Get a task by ID regardless of owner.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID regardless of owner.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Get a task by ID if `user_id` owns it.
    pub fn get_owned(&self, id: u64, user_id: &str) -> Option<&Task> {
        self.get(id).filter(|t| t.user_id == user_id)
    }

    fn get_owned_mut(&mut self, id: u64, user_id: &str) -> Option<&mut Task> {
        self.get_mut(id).filter(|t| t.user_id == user_id)
    }

    /// Store a draft under a fresh id.
    pub fn insert(&mut self, draft: TaskDraft) -> u64 {
        let id = self.next_id();
        self.next_task_id = id + 1;
        self.tasks.push(draft.into_task(id));
        id
    }

    /// All tasks owned by `user_id`, in storage order.
    pub fn tasks_for_user(&self, user_id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.user_id == user_id).collect()
    }

    /// Open tasks of a user, due date ascending, undated last, ties by id.
    /// Creation dates are read in the calendar of `offset`.
    pub fn open_tasks(&self, user_id: &str, as_of: NaiveDate, offset: FixedOffset) -> Vec<Task> {
        let mut open: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id && !t.completed && t.created_date(offset) <= as_of)
            .cloned()
            .collect();
        open.sort_by_key(|t| (t.due_date.is_none(), t.due_date, t.id));
        open
    }

    /// Set completion on an owned task. Returns the number of records changed.
    pub fn set_completion(&mut self, id: u64, user_id: &str, completed: bool, at_utc: i64) -> usize {
        match self.get_owned_mut(id, user_id) {
            Some(t) => {
                t.completed = completed;
                t.completed_at_utc = completed.then_some(at_utc);
                1
            }
            None => 0,
        }
    }

    /// Insert `successor` and mark `source_id` regenerated, unless it already is.
    pub fn regenerate_from(
        &mut self,
        source_id: u64,
        successor: TaskDraft,
        complete_source: bool,
    ) -> Option<u64> {
        let completed_at = successor.created_at_utc;
        let source = self.get_mut(source_id)?;
        if source.regenerated {
            return None;
        }
        source.regenerated = true;
        if complete_source {
            source.completed = true;
            source.completed_at_utc = Some(completed_at);
        }
        Some(self.insert(successor))
    }

    /// Apply an edit to an owned task. Returns the number of records changed.
    pub fn edit_task(&mut self, id: u64, user_id: &str, patch: &TaskPatch) -> usize {
        match self.get_owned_mut(id, user_id) {
            Some(t) => {
                patch.apply(t);
                1
            }
            None => 0,
        }
    }

    /// Hard-delete an owned task. Returns the number of records removed.
    pub fn delete_task(&mut self, id: u64, user_id: &str) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !(t.id == id && t.user_id == user_id));
        before - self.tasks.len()
    }

    /// Case-insensitive title search within one user's tasks.
    pub fn search(&self, user_id: &str, query: &str) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| t.user_id == user_id && t.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Look up a user by id.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Register a push endpoint. Returns false if it was already registered.
    pub fn add_subscription(&mut self, sub: Subscription) -> bool {
        let exists = self
            .subscriptions
            .iter()
            .any(|s| s.user_id == sub.user_id && s.endpoint == sub.endpoint);
        if !exists {
            self.subscriptions.push(sub);
        }
        !exists
    }

    /// Drop every push endpoint of a user. Returns how many were removed.
    pub fn remove_subscriptions(&mut self, user_id: &str) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.user_id != user_id);
        before - self.subscriptions.len()
    }

    /// Push endpoints registered by a user.
    pub fn subscriptions_for(&self, user_id: &str) -> Vec<&Subscription> {
        self.subscriptions.iter().filter(|s| s.user_id == user_id).collect()
    }
}

impl TaskStore for Database {
    fn load_open_tasks(&self, user_id: &str, as_of: NaiveDate, offset: FixedOffset) -> Result<Vec<Task>> {
        Ok(self.open_tasks(user_id, as_of, offset))
    }

    fn find_task(&self, task_id: u64, user_id: &str) -> Result<Option<Task>> {
        Ok(self.get_owned(task_id, user_id).cloned())
    }

    fn insert_task(&mut self, draft: TaskDraft) -> Result<u64> {
        Ok(self.insert(draft))
    }

    fn update_completion(
        &mut self,
        task_id: u64,
        user_id: &str,
        completed: bool,
        at_utc: i64,
    ) -> Result<usize> {
        Ok(self.set_completion(task_id, user_id, completed, at_utc))
    }

    fn completed_recurring_tasks(&self) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.completed && t.frequency.is_recurring())
            .cloned()
            .collect())
    }

    fn regenerate(
        &mut self,
        source_id: u64,
        successor: TaskDraft,
        complete_source: bool,
    ) -> Result<Option<u64>> {
        Ok(self.regenerate_from(source_id, successor, complete_source))
    }
}

/// A `Database` bound to its JSON file.
///
/// Every write re-reads the file, applies the change and saves it. When any
/// step fails the in-memory copy keeps its previous state and the error is
/// returned, so a write either lands completely or not at all.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    db: Database,
}

impl FileStore {
    /// Open the database at `path`, empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            db: Database::load(path)?,
        })
    }

    /// Read-only view of the last loaded state.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Re-read the backing file.
    pub fn reload(&mut self) -> Result<()> {
        self.db = Database::load(&self.path)?;
        Ok(())
    }

    /// Apply `f` to the latest on-disk state and persist the result.
    pub fn write<T>(&mut self, f: impl FnOnce(&mut Database) -> T) -> Result<T> {
        let mut fresh = Database::load(&self.path)?;
        let out = f(&mut fresh);
        if let Err(e) = fresh.save(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to save database");
            return Err(e);
        }
        self.db = fresh;
        Ok(out)
    }
}

impl TaskStore for FileStore {
    fn load_open_tasks(&self, user_id: &str, as_of: NaiveDate, offset: FixedOffset) -> Result<Vec<Task>> {
        self.db.load_open_tasks(user_id, as_of, offset)
    }

    fn find_task(&self, task_id: u64, user_id: &str) -> Result<Option<Task>> {
        self.db.find_task(task_id, user_id)
    }

    fn insert_task(&mut self, draft: TaskDraft) -> Result<u64> {
        self.write(|db| db.insert(draft))
    }

    fn update_completion(
        &mut self,
        task_id: u64,
        user_id: &str,
        completed: bool,
        at_utc: i64,
    ) -> Result<usize> {
        self.write(|db| db.set_completion(task_id, user_id, completed, at_utc))
    }

    fn completed_recurring_tasks(&self) -> Result<Vec<Task>> {
        self.db.completed_recurring_tasks()
    }

    fn regenerate(
        &mut self,
        source_id: u64,
        successor: TaskDraft,
        complete_source: bool,
    ) -> Result<Option<u64>> {
        self.write(|db| db.regenerate_from(source_id, successor, complete_source))
    }
}

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "this friday", bare weekday names
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return first_of_next.pred_opt();
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let (num, unit_days) = if let Some(n) = rest.strip_suffix('d') {
            (n, 1)
        } else if let Some(n) = rest.strip_suffix('w') {
            (n, 7)
        } else if let Some(n) = rest.strip_suffix('m') {
            // Approximate: 30 days per month
            (n, 30)
        } else {
            return None;
        };
        let n = num.trim().parse::<i64>().ok()?;
        let days = Duration::try_days(n.checked_mul(unit_days)?)?;
        return today.checked_add_signed(days);
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (day_name, target) in weekdays {
        let days_ahead = (target + 7 - current) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return today.checked_add_signed(Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return today.checked_add_signed(Duration::days(days));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Like [`parse_due_input`] but reports unparseable input as an invalid task.
pub fn parse_due(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    parse_due_input(s, today).ok_or_else(|| Error::InvalidTask(format!("unrecognised due date: {s}")))
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {delta}d")
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Format a quadrant for display.
pub fn format_quadrant(q: Quadrant) -> &'static str {
    match q {
        Quadrant::Do => "Do",
        Quadrant::Schedule => "Schedule",
        Quadrant::Delegate => "Delegate",
        Quadrant::Eliminate => "Eliminate",
    }
}

/// Format a frequency for display.
pub fn format_frequency(f: Frequency) -> &'static str {
    match f {
        Frequency::None => "-",
        Frequency::Daily => "daily",
        Frequency::Weekly => "weekly",
        Frequency::Monthly => "monthly",
    }
}

/// Format an urgency level for display.
pub fn format_urgency(u: Urgency) -> &'static str {
    match u {
        Urgency::Urgent => "Urgent",
        Urgency::NotUrgent => "Not Urgent",
    }
}

/// Format an importance level for display.
pub fn format_importance(i: Importance) -> &'static str {
    match i {
        Importance::Important => "Important",
        Importance::NotImportant => "Not Important",
    }
}

/// Print scored tasks in a table, starring the suggested ones.
pub fn print_table(tasks: &[&ScoredTask], suggested: &HashSet<u64>, today: NaiveDate) {
    println!(
        "{:<5} {:<2} {:<10} {:>8} {:<12} {:>6} {:<8} {}",
        "ID", "", "Quadrant", "Priority", "Due", "Impact", "Repeats", "Title"
    );
    for s in tasks {
        let t = &s.task;
        let star = if suggested.contains(&t.id) { "*" } else { "" };
        let done = if t.completed { " (done)" } else { "" };
        println!(
            "{:<5} {:<2} {:<10} {:>8.2} {:<12} {:>6} {:<8} {}{}",
            t.id,
            star,
            format_quadrant(t.quadrant()),
            s.priority,
            format_due_relative(t.due_date, today),
            t.impact,
            format_frequency(t.frequency),
            truncate(&t.title, 60),
            done
        );
    }
}

/// Print plain tasks (no scores) in a compact table.
pub fn print_plain_table(tasks: &[&Task], today: NaiveDate) {
    println!("{:<5} {:<10} {:<12} {:<6} {}", "ID", "Quadrant", "Due", "Done", "Title");
    for t in tasks {
        println!(
            "{:<5} {:<10} {:<12} {:<6} {}",
            t.id,
            format_quadrant(t.quadrant()),
            format_due_relative(t.due_date, today),
            if t.completed { "yes" } else { "no" },
            truncate(&t.title, 60)
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
