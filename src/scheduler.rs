//! Background daemon: periodic recurrence sweep and overdue reminders.
//!
//! Each tick re-opens the database file so edits made by other `prio`
//! invocations between ticks are picked up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::db::FileStore;
use crate::error::Result;
use crate::recurrence::{sweep_store, RecurrencePolicy, SweepReport};
use crate::reminder::{build_reminder, send_to_all, Notifier};
use crate::store::TaskStore;

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    pub sweep: SweepReport,
    /// Successful reminder deliveries.
    pub reminders_sent: usize,
}

/// Run the sweep once against the file at `db_path`, then push reminders
/// when a notifier is given.
pub fn run_tick(
    db_path: &Path,
    clock: &dyn Clock,
    policy: &RecurrencePolicy,
    notifier: Option<&dyn Notifier>,
) -> Result<TickSummary> {
    let mut store = FileStore::open(db_path)?;
    let sweep = sweep_store(&mut store, clock, policy)?;

    let mut reminders_sent = 0;
    if let Some(notifier) = notifier {
        let today = clock.today();
        let db = store.db();
        let mut users: Vec<&str> = db.subscriptions.iter().map(|s| s.user_id.as_str()).collect();
        users.sort_unstable();
        users.dedup();
        for user_id in users {
            let open = store.load_open_tasks(user_id, today, clock.offset())?;
            let Some(reminder) = build_reminder(&open, today) else {
                continue;
            };
            reminders_sent += send_to_all(notifier, &db.subscriptions_for(user_id), &reminder);
        }
    }

    Ok(TickSummary { sweep, reminders_sent })
}

/// Periodic sweeper driven by a tokio interval.
pub struct SweepScheduler {
    db_path: PathBuf,
    clock: Arc<dyn Clock>,
    policy: RecurrencePolicy,
    interval: Duration,
    notifier: Option<Box<dyn Notifier>>,
}

impl SweepScheduler {
    pub fn new(db_path: &Path, clock: Arc<dyn Clock>, policy: RecurrencePolicy, interval: Duration) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            clock,
            policy,
            interval,
            notifier: None,
        }
    }

    /// Also deliver overdue reminders on every tick.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn tick(&self) {
        match run_tick(&self.db_path, self.clock.as_ref(), &self.policy, self.notifier.as_deref()) {
            Ok(summary) => info!(
                examined = summary.sweep.examined,
                created = summary.sweep.regenerated.len(),
                reminders = summary.reminders_sent,
                "sweep tick complete"
            ),
            Err(e) => error!(error = %e, path = %self.db_path.display(), "sweep tick failed"),
        }
    }

    /// Tick immediately, then every interval until Ctrl-C.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_secs = self.interval.as_secs(), path = %self.db_path.display(), "sweep daemon started");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("sweep daemon stopping");
                    break;
                }
                _ = ticker.tick() => {
                    debug!("sweep tick");
                    self.tick();
                }
            }
        }
    }

    /// Block the current thread on [`run`](Self::run).
    pub fn run_blocking(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use chrono::NaiveDate;

    use crate::clock::FixedClock;
    use crate::db::Database;
    use crate::fields::{Frequency, Importance, Urgency};
    use crate::reminder::Reminder;
    use crate::task::{Subscription, Task, TaskDraft};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn draft(user: &str, title: &str, due: Option<NaiveDate>, frequency: Frequency) -> TaskDraft {
        TaskDraft {
            user_id: user.into(),
            title: title.into(),
            urgency: Urgency::Urgent,
            importance: Importance::Important,
            due_date: due,
            impact: 5,
            frequency,
            recurrence_source_id: None,
            created_at_utc: 0,
        }
    }

    struct Counting(Cell<usize>);

    impl Notifier for Counting {
        fn deliver(&self, _sub: &Subscription, _reminder: &Reminder) -> Result<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    fn seeded(dir: &Path) -> PathBuf {
        let path = dir.join("tasks.json");
        let mut db = Database::default();
        let id = db.insert(draft("alice", "Water plants", Some(d(2025, 4, 6)), Frequency::Daily));
        db.set_completion(id, "alice", true, 0);
        db.insert(draft("alice", "Late report", Some(d(2025, 4, 1)), Frequency::None));
        db.insert(draft("bob", "On time", Some(d(2025, 4, 30)), Frequency::None));
        for (user, endpoint) in [("alice", "https://push/a"), ("bob", "https://push/b")] {
            db.add_subscription(Subscription {
                user_id: user.into(),
                endpoint: endpoint.into(),
                created_at_utc: 0,
            });
        }
        db.save(&path).unwrap();
        path
    }

    #[test]
    fn tick_regenerates_once_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded(dir.path());
        let clock = FixedClock::on(d(2025, 4, 7));
        let policy = RecurrencePolicy::default();

        let first = run_tick(&path, &clock, &policy, None).unwrap();
        assert_eq!(first.sweep.regenerated.len(), 1);
        assert_eq!(first.reminders_sent, 0);

        let second = run_tick(&path, &clock, &policy, None).unwrap();
        assert!(second.sweep.regenerated.is_empty());
        assert_eq!(second.sweep.already_regenerated, 1);

        let db = Database::load(&path).unwrap();
        let successors: Vec<&Task> = db.tasks.iter().filter(|t| t.recurrence_source_id == Some(1)).collect();
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].due_date, Some(d(2025, 4, 7)));
    }

    #[test]
    fn reminders_go_only_to_users_with_overdue_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded(dir.path());
        let clock = FixedClock::on(d(2025, 4, 7));
        let notifier = Counting(Cell::new(0));

        let summary = run_tick(&path, &clock, &RecurrencePolicy::default(), Some(&notifier)).unwrap();
        assert_eq!(summary.reminders_sent, 1);
        assert_eq!(notifier.0.get(), 1);
    }

    #[test]
    fn tick_on_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let summary = run_tick(&path, &FixedClock::on(d(2025, 4, 7)), &RecurrencePolicy::default(), None).unwrap();
        assert_eq!(summary, TickSummary::default());
    }
}
