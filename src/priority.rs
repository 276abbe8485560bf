//! Priority scoring and "suggested tasks" selection.
//!
//! Each open task gets a score
//!
//! ```text
//! priority = impact * importance_weight / max(days_until_due, 1)
//! ```
//!
//! where `days_until_due` falls back to a fixed horizon for undated tasks and
//! the weight is 1.0 for important tasks, 0.5 otherwise. Overdue tasks share
//! the divisor of a task due tomorrow. The highest-scoring fraction of the
//! list is suggested, never fewer than one task when any are open.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fields::{Importance, Quadrant};
use crate::task::Task;

/// Share of open tasks surfaced as suggestions.
pub const DEFAULT_SUGGEST_FRACTION: f64 = 0.2;

/// Days assumed until due for tasks without a due date.
pub const NO_DUE_DATE_HORIZON_DAYS: i64 = 30;

/// Tunables for scoring and selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingPolicy {
    /// Fraction of open tasks to suggest, in `(0, 1]`.
    pub suggest_fraction: f64,
    /// Days until due assumed for undated tasks.
    pub no_due_horizon_days: i64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            suggest_fraction: DEFAULT_SUGGEST_FRACTION,
            no_due_horizon_days: NO_DUE_DATE_HORIZON_DAYS,
        }
    }
}

/// A task together with its computed score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTask {
    pub task: Task,
    pub days_until_due: i64,
    pub priority: f64,
}

/// Result of ranking one user's open tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// All tasks, highest priority first. Equal scores keep their input order.
    pub ranked: Vec<ScoredTask>,
    /// The leading slice of `ranked` selected for highlighting.
    pub suggested: Vec<ScoredTask>,
}

impl Ranking {
    /// Whether the task with `id` is among the suggestions.
    pub fn is_suggested(&self, id: u64) -> bool {
        self.suggested.iter().any(|s| s.task.id == id)
    }

    /// Ids of the suggested tasks.
    pub fn suggested_ids(&self) -> HashSet<u64> {
        self.suggested.iter().map(|s| s.task.id).collect()
    }

    /// Ranked tasks grouped by Eisenhower quadrant, each group in rank order.
    pub fn by_quadrant(&self) -> BTreeMap<usize, (Quadrant, Vec<&ScoredTask>)> {
        let mut groups: BTreeMap<usize, (Quadrant, Vec<&ScoredTask>)> = Quadrant::ALL
            .iter()
            .enumerate()
            .map(|(i, q)| (i, (*q, Vec::new())))
            .collect();
        for s in &self.ranked {
            let q = s.task.quadrant();
            if let Some(slot) = Quadrant::ALL.iter().position(|x| *x == q) {
                if let Some((_, tasks)) = groups.get_mut(&slot) {
                    tasks.push(s);
                }
            }
        }
        groups
    }
}

/// Days from `today` to the task's due date; the horizon when undated. Negative when overdue.
pub fn days_until_due(task: &Task, today: NaiveDate, policy: &RankingPolicy) -> i64 {
    task.due_date
        .map(|d| (d - today).num_days())
        .unwrap_or(policy.no_due_horizon_days)
}

/// Weight applied to a task's impact.
pub fn importance_weight(importance: Importance) -> f64 {
    match importance {
        Importance::Important => 1.0,
        Importance::NotImportant => 0.5,
    }
}

/// Score a single task.
pub fn priority_score(task: &Task, today: NaiveDate, policy: &RankingPolicy) -> f64 {
    let days = days_until_due(task, today, policy).max(1);
    f64::from(task.impact) * importance_weight(task.importance) / days as f64
}

/// Number of suggestions for `n` open tasks: `max(1, floor(fraction * n))`, or 0 when empty.
pub fn suggested_count(n: usize, fraction: f64) -> usize {
    if n == 0 {
        return 0;
    }
    ((n as f64 * fraction).floor() as usize).clamp(1, n)
}

/// Score, sort and select. Pure in its inputs.
pub fn rank(tasks: Vec<Task>, today: NaiveDate, policy: &RankingPolicy) -> Ranking {
    let mut ranked: Vec<ScoredTask> = tasks
        .into_iter()
        .map(|task| {
            let days_until_due = days_until_due(&task, today, policy);
            let priority = priority_score(&task, today, policy);
            ScoredTask { task, days_until_due, priority }
        })
        .collect();

    // `sort_by` is stable, so ties keep the due-date order they arrived in.
    ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));

    let count = suggested_count(ranked.len(), policy.suggest_fraction);
    let suggested = ranked[..count].to_vec();
    debug!(open = ranked.len(), suggested = count, "ranked open tasks");

    Ranking { ranked, suggested }
}
