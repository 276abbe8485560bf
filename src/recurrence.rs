//! Recurring-task regeneration.
//!
//! A recurring task spawns exactly one successor, either when the owner marks
//! it complete or, as a catch-up, when the periodic sweep finds it completed
//! without a successor. Both paths go through
//! [`TaskStore::regenerate`], a compare-and-set on the source's `regenerated`
//! marker, so they can race without producing duplicates.

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::Result;
use crate::fields::Frequency;
use crate::store::TaskStore;
use crate::task::{Task, TaskDraft};

/// Days added for a monthly recurrence in [`MonthlyMode::FixedDays`].
pub const FIXED_MONTH_DAYS: i64 = 30;

/// How a monthly recurrence advances the due date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonthlyMode {
    /// Always add 30 days.
    #[default]
    FixedDays,
    /// Same day next month, clamped to the month's last day.
    CalendarMonth,
}

/// Tunables for successor date arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrencePolicy {
    pub monthly: MonthlyMode,
}

/// What a toggle did to the source task and whether it spawned a successor.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub task_id: u64,
    /// Completion state after the toggle.
    pub completed: bool,
    pub successor: Option<Task>,
}

/// Summary of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Candidates looked at.
    pub examined: usize,
    /// `(source_id, successor_id)` for every successor created.
    pub regenerated: Vec<(u64, u64)>,
    /// Candidates skipped because they already have a successor.
    pub already_regenerated: usize,
}

/// Next due date for `frequency` counted from `base`. `None` for non-recurring tasks.
pub fn next_due_date(frequency: Frequency, base: NaiveDate, policy: &RecurrencePolicy) -> Option<NaiveDate> {
    match frequency {
        Frequency::None => None,
        Frequency::Daily => base.checked_add_signed(Duration::days(1)),
        Frequency::Weekly => base.checked_add_signed(Duration::days(7)),
        Frequency::Monthly => match policy.monthly {
            MonthlyMode::FixedDays => base.checked_add_signed(Duration::days(FIXED_MONTH_DAYS)),
            MonthlyMode::CalendarMonth => base.checked_add_months(Months::new(1)),
        },
    }
}

/// Build the successor of `task`: same title, axes, impact, frequency and owner,
/// due one period after the task's due date (or after `today` when undated).
pub fn successor_draft(task: &Task, today: NaiveDate, now_utc: i64, policy: &RecurrencePolicy) -> Option<TaskDraft> {
    let base = task.due_date.unwrap_or(today);
    let due = next_due_date(task.frequency, base, policy)?;
    Some(TaskDraft {
        user_id: task.user_id.clone(),
        title: task.title.clone(),
        urgency: task.urgency,
        importance: task.importance,
        due_date: Some(due),
        impact: task.impact,
        frequency: task.frequency,
        recurrence_source_id: Some(task.id),
        created_at_utc: now_utc,
    })
}

/// Flip the completion state of an owned task.
///
/// Completing an open recurring task that has not spawned yet inserts its
/// successor and marks it completed in one store write. Every other toggle
/// only flips the flag; reopening never retracts a successor. Returns `None`
/// when the task does not exist or belongs to someone else.
pub fn toggle_completion<S: TaskStore + ?Sized>(
    store: &mut S,
    clock: &dyn Clock,
    policy: &RecurrencePolicy,
    user_id: &str,
    task_id: u64,
) -> Result<Option<ToggleOutcome>> {
    let Some(task) = store.find_task(task_id, user_id)? else {
        debug!(task_id, user_id, "toggle ignored: no such task for user");
        return Ok(None);
    };

    let now = clock.now().timestamp();
    let spawns = !task.completed && task.frequency.is_recurring() && !task.regenerated;
    if spawns {
        if let Some(draft) = successor_draft(&task, clock.today(), now, policy) {
            let successor = draft.clone();
            if let Some(successor_id) = store.regenerate(task.id, draft, true)? {
                info!(task_id, successor_id, due = ?successor.due_date, "completed recurring task, successor created");
                return Ok(Some(ToggleOutcome {
                    task_id,
                    completed: true,
                    successor: Some(successor.into_task(successor_id)),
                }));
            }
            // Lost the race to a sweep; fall through to a plain flip.
        }
    }

    let completed = !task.completed;
    store.update_completion(task_id, user_id, completed, now)?;
    info!(task_id, completed, "toggled task");
    Ok(Some(ToggleOutcome { task_id, completed, successor: None }))
}

/// Regenerate successors for completed recurring `candidates` that have none yet.
///
/// Safe to re-run: a candidate already marked regenerated is skipped, and the
/// store rejects a second regeneration of the same source. Source tasks keep
/// their completion state. A persistence error stops the pass; successors
/// created before it remain.
pub fn run_recurrence_sweep<S: TaskStore + ?Sized>(
    store: &mut S,
    candidates: Vec<Task>,
    clock: &dyn Clock,
    policy: &RecurrencePolicy,
) -> Result<SweepReport> {
    let today = clock.today();
    let now = clock.now().timestamp();
    let mut report = SweepReport::default();

    for task in candidates {
        if !task.completed || !task.frequency.is_recurring() {
            continue;
        }
        report.examined += 1;
        if task.regenerated {
            report.already_regenerated += 1;
            continue;
        }
        let Some(draft) = successor_draft(&task, today, now, policy) else {
            continue;
        };
        match store.regenerate(task.id, draft, false)? {
            Some(successor_id) => {
                info!(source_id = task.id, successor_id, user_id = %task.user_id, "sweep created successor");
                report.regenerated.push((task.id, successor_id));
            }
            None => report.already_regenerated += 1,
        }
    }

    debug!(
        examined = report.examined,
        created = report.regenerated.len(),
        skipped = report.already_regenerated,
        "recurrence sweep finished"
    );
    Ok(report)
}

/// Load every completed recurring task from `store` and sweep them.
pub fn sweep_store<S: TaskStore + ?Sized>(
    store: &mut S,
    clock: &dyn Clock,
    policy: &RecurrencePolicy,
) -> Result<SweepReport> {
    let candidates = store.completed_recurring_tasks()?;
    run_recurrence_sweep(store, candidates, clock, policy)
}
