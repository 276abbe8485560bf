//! Completion report and weekly check-in summary.

use chrono::{Duration, FixedOffset, NaiveDate};

use crate::priority::{rank, Ranking, RankingPolicy};
use crate::task::Task;

/// Default look-back and look-ahead of the weekly check-in, in days.
pub const CHECKIN_WINDOW_DAYS: i64 = 7;

/// Completed tasks whose completion date, read at `offset`, falls within
/// `[start, end]`, newest first. Either bound may be open.
pub fn completion_report<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    offset: FixedOffset,
) -> Vec<&'a Task> {
    let mut done: Vec<&Task> = tasks
        .into_iter()
        .filter(|t| t.completed)
        .filter(|t| {
            let day = t.completion_date(offset);
            start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
        })
        .collect();
    done.sort_by_key(|t| std::cmp::Reverse((t.completed_at_utc.unwrap_or(t.created_at_utc), t.id)));
    done
}

/// Snapshot shown by `prio checkin`.
#[derive(Debug, Clone, Default)]
pub struct Checkin {
    /// Completed within the look-back window, newest first.
    pub completed: Vec<Task>,
    /// Open and past due, most overdue first.
    pub overdue: Vec<Task>,
    /// Open and due within the look-ahead window, soonest first.
    pub upcoming: Vec<Task>,
    /// Ranker output over all open tasks.
    pub ranking: Ranking,
}

/// Build the weekly check-in for one user's tasks.
///
/// A window reaching past the representable calendar is clamped to its ends.
pub fn weekly_checkin(
    tasks: &[Task],
    today: NaiveDate,
    offset: FixedOffset,
    window_days: i64,
    policy: &RankingPolicy,
) -> Checkin {
    let window = Duration::try_days(window_days).unwrap_or(Duration::MAX);
    let since = today.checked_sub_signed(window).unwrap_or(NaiveDate::MIN);
    let until = today.checked_add_signed(window).unwrap_or(NaiveDate::MAX);

    let completed = completion_report(tasks, Some(since), None, offset)
        .into_iter()
        .cloned()
        .collect();

    let mut open: Vec<Task> = tasks.iter().filter(|t| !t.completed).cloned().collect();
    open.sort_by_key(|t| (t.due_date.is_none(), t.due_date, t.id));

    let overdue = open.iter().filter(|t| t.is_overdue(today)).cloned().collect();
    let upcoming = open
        .iter()
        .filter(|t| t.due_date.is_some_and(|d| d >= today && d <= until))
        .cloned()
        .collect();

    Checkin {
        completed,
        overdue,
        upcoming,
        ranking: rank(open, today, policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Frequency, Importance, Urgency};
    use chrono::{Offset, Utc};

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ts(date: NaiveDate) -> i64 {
        date.and_hms_opt(9, 0, 0).unwrap().and_utc().timestamp()
    }

    fn task(id: u64, due: Option<NaiveDate>, completed_on: Option<NaiveDate>) -> Task {
        Task {
            id,
            user_id: "alice".into(),
            title: format!("t{id}"),
            urgency: Urgency::Urgent,
            importance: Importance::Important,
            due_date: due,
            impact: 5,
            frequency: Frequency::None,
            completed: completed_on.is_some(),
            completed_at_utc: completed_on.map(ts),
            recurrence_source_id: None,
            regenerated: false,
            created_at_utc: ts(d(2025, 1, 1)),
        }
    }

    #[test]
    fn report_bounds_are_inclusive() {
        let tasks = vec![
            task(1, None, Some(d(2025, 4, 1))),
            task(2, None, Some(d(2025, 4, 5))),
            task(3, None, Some(d(2025, 4, 10))),
            task(4, None, None),
        ];
        let ids = |v: Vec<&Task>| v.iter().map(|t| t.id).collect::<Vec<_>>();

        assert_eq!(ids(completion_report(&tasks, None, None, utc())), vec![3, 2, 1]);
        assert_eq!(ids(completion_report(&tasks, Some(d(2025, 4, 5)), None, utc())), vec![3, 2]);
        assert_eq!(ids(completion_report(&tasks, None, Some(d(2025, 4, 5)), utc())), vec![2, 1]);
        assert_eq!(
            ids(completion_report(&tasks, Some(d(2025, 4, 2)), Some(d(2025, 4, 9)), utc())),
            vec![2]
        );
    }

    #[test]
    fn legacy_completions_fall_back_to_creation_date() {
        let mut t = task(1, None, None);
        t.completed = true;
        let tasks = [t];
        assert_eq!(completion_report(&tasks, Some(d(2025, 1, 1)), Some(d(2025, 1, 1)), utc()).len(), 1);
        assert!(completion_report(&tasks, Some(d(2025, 1, 2)), None, utc()).is_empty());
    }

    #[test]
    fn checkin_buckets() {
        let today = d(2025, 4, 7);
        let tasks = vec![
            task(1, Some(d(2025, 4, 3)), None),        // overdue
            task(2, Some(today), None),                // upcoming
            task(3, Some(d(2025, 4, 14)), None),       // upcoming, edge
            task(4, Some(d(2025, 4, 15)), None),       // beyond window
            task(5, None, Some(d(2025, 4, 2))),        // completed recently
            task(6, None, Some(d(2025, 3, 20))),       // completed long ago
            task(7, None, None),                       // undated
        ];
        let c = weekly_checkin(&tasks, today, utc(), CHECKIN_WINDOW_DAYS, &RankingPolicy::default());

        let ids = |v: &[Task]| v.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(&c.overdue), vec![1]);
        assert_eq!(ids(&c.upcoming), vec![2, 3]);
        assert_eq!(ids(&c.completed), vec![5]);
        assert_eq!(c.ranking.ranked.len(), 5);
        assert_eq!(c.ranking.suggested.len(), 1);
    }

    #[test]
    fn oversized_window_is_clamped() {
        let today = d(2025, 4, 7);
        let tasks = vec![
            task(1, Some(d(2025, 4, 3)), None),
            task(2, Some(d(2030, 1, 1)), None),
            task(3, None, Some(d(2001, 1, 1))),
        ];
        let c = weekly_checkin(&tasks, today, utc(), 9_000_000_000_000, &RankingPolicy::default());
        let ids = |v: &[Task]| v.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(&c.overdue), vec![1]);
        assert_eq!(ids(&c.upcoming), vec![2]);
        assert_eq!(ids(&c.completed), vec![3]);
    }
}
