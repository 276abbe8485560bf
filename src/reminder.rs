//! Overdue-task reminders sent to registered push endpoints.

use chrono::NaiveDate;
use tracing::info;

use crate::error::Result;
use crate::task::{Subscription, Task};

/// Payload pushed to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub title: String,
    pub body: String,
}

/// Build a reminder when any of `tasks` is overdue.
pub fn build_reminder<'a>(tasks: impl IntoIterator<Item = &'a Task>, today: NaiveDate) -> Option<Reminder> {
    let overdue = tasks.into_iter().filter(|t| t.is_overdue(today)).count();
    if overdue == 0 {
        return None;
    }
    let noun = if overdue == 1 { "task" } else { "tasks" };
    Some(Reminder {
        title: "Task Reminder".into(),
        body: format!("You have {overdue} overdue {noun}!"),
    })
}

/// Delivery channel for reminders.
pub trait Notifier {
    /// Deliver `reminder` to one subscription.
    fn deliver(&self, subscription: &Subscription, reminder: &Reminder) -> Result<()>;
}

/// Notifier that records deliveries in the log and on stdout.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, subscription: &Subscription, reminder: &Reminder) -> Result<()> {
        info!(
            user_id = %subscription.user_id,
            endpoint = %subscription.endpoint,
            body = %reminder.body,
            "reminder delivered"
        );
        println!("[{}] {}: {}", subscription.endpoint, reminder.title, reminder.body);
        Ok(())
    }
}

/// Send `reminder` to every subscription; returns how many deliveries succeeded.
pub fn send_to_all(notifier: &dyn Notifier, subscriptions: &[&Subscription], reminder: &Reminder) -> usize {
    subscriptions
        .iter()
        .filter(|s| match notifier.deliver(s, reminder) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(endpoint = %s.endpoint, error = %e, "reminder delivery failed");
                false
            }
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::error::Error;
    use crate::fields::{Frequency, Importance, Urgency};

    fn task(id: u64, due: Option<NaiveDate>, completed: bool) -> Task {
        Task {
            id,
            user_id: "alice".into(),
            title: format!("t{id}"),
            urgency: Urgency::Urgent,
            importance: Importance::Important,
            due_date: due,
            impact: 5,
            frequency: Frequency::None,
            completed,
            completed_at_utc: None,
            recurrence_source_id: None,
            regenerated: false,
            created_at_utc: 0,
        }
    }

    struct Recording {
        sent: RefCell<Vec<String>>,
        fail_on: &'static str,
    }

    impl Notifier for Recording {
        fn deliver(&self, sub: &Subscription, _reminder: &Reminder) -> Result<()> {
            if sub.endpoint == self.fail_on {
                return Err(Error::Persistence(std::io::Error::other("gone")));
            }
            self.sent.borrow_mut().push(sub.endpoint.clone());
            Ok(())
        }
    }

    #[test]
    fn reminder_counts_open_overdue_tasks() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 7).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 4, 6);
        let tasks = vec![
            task(1, yesterday, false),
            task(2, yesterday, false),
            task(3, yesterday, true),
            task(4, Some(today), false),
        ];
        let r = build_reminder(&tasks, today).unwrap();
        assert_eq!(r.title, "Task Reminder");
        assert_eq!(r.body, "You have 2 overdue tasks!");

        assert_eq!(build_reminder(&tasks[2..], today), None);
        assert_eq!(build_reminder(&tasks[..1], today).unwrap().body, "You have 1 overdue task!");
    }

    #[test]
    fn failed_deliveries_do_not_stop_the_rest() {
        let subs: Vec<Subscription> = ["a", "b", "c"]
            .iter()
            .map(|e| Subscription { user_id: "alice".into(), endpoint: e.to_string(), created_at_utc: 0 })
            .collect();
        let refs: Vec<&Subscription> = subs.iter().collect();
        let notifier = Recording { sent: RefCell::new(Vec::new()), fail_on: "b" };
        let reminder = Reminder { title: "t".into(), body: "b".into() };

        assert_eq!(send_to_all(&notifier, &refs, &reminder), 2);
        assert_eq!(*notifier.sent.borrow(), vec!["a".to_string(), "c".to_string()]);
    }
}
